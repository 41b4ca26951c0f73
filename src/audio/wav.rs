use std::path::Path;

use crate::error::{PipelineError, Result};

/// Check that `path` exists and names a `.wav` file before it is uploaded.
pub fn validate_waveform(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    let is_wav = path
        .file_name()
        .map(|name| name.to_string_lossy().ends_with(".wav"))
        .unwrap_or(false);
    if !is_wav {
        return Err(PipelineError::InvalidFormat(path.to_path_buf()));
    }
    Ok(())
}

/// Read the WAV header, or `None` if it cannot be parsed.
pub fn probe_spec(path: &Path) -> Option<hound::WavSpec> {
    match hound::WavReader::open(path) {
        Ok(reader) => Some(reader.spec()),
        Err(e) => {
            tracing::debug!("Could not read WAV header of {}: {}", path.display(), e);
            None
        }
    }
}

pub fn probe_sample_rate(path: &Path) -> Option<u32> {
    probe_spec(path).map(|spec| spec.sample_rate)
}

/// Pick the sample rate to report: explicit override, then header, then default.
pub fn resolve_sample_rate(path: &Path, override_rate: Option<u32>, default_rate: u32) -> u32 {
    if let Some(rate) = override_rate {
        return rate;
    }
    probe_sample_rate(path).unwrap_or_else(|| {
        tracing::warn!(
            "Using default sample rate {} Hz for {}",
            default_rate,
            path.display()
        );
        default_rate
    })
}
