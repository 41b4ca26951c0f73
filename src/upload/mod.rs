use std::path::Path;

use crate::error::Result;

pub mod gcs;

/// Pushes a local file to remote object storage.
pub trait BlobStore: Send {
    fn name(&self) -> &str;
    /// Upload `local_path` and return a URI the recognition service can read.
    fn upload(&self, local_path: &Path) -> Result<String>;
}
