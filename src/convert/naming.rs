use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Returns `base` if nothing exists there, otherwise the first free
/// `<stem>N.wav` for N = 1, 2, ...
///
/// The existence check and the later write are not atomic, so two concurrent
/// runs can pick the same name.
pub fn derive_unique_path(base: &Path) -> PathBuf {
    let stem = base.with_extension("");
    let mut candidate = base.to_path_buf();
    let mut suffix: u32 = 0;

    while candidate.exists() {
        suffix += 1;
        let mut name = OsString::from(stem.as_os_str());
        name.push(suffix.to_string());
        name.push(".wav");
        candidate = PathBuf::from(name);
    }

    candidate
}
