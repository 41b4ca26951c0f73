use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Every fatal condition a single-file run can end in.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("\"{}\" is not a .wav file", .0.display())]
    InvalidFormat(PathBuf),

    #[error("[{tool}] could not convert \"{}\" to a mono .wav file ({status})", .input.display())]
    TranscodeFailure {
        tool: String,
        input: PathBuf,
        status: String,
    },

    #[error("failed to launch transcoder \"{tool}\": {source}")]
    TranscoderLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upload failed: {0}")]
    UploadFailure(String),

    #[error("recognition service error: {0}")]
    RecognitionService(String),

    #[error("recognition returned no transcript fragments")]
    EmptyResult,

    #[error("recognition did not finish within {0:?}")]
    Timeout(Duration),

    #[error("recognition was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_failure_names_input() {
        let err = PipelineError::TranscodeFailure {
            tool: "ffmpeg".to_string(),
            input: PathBuf::from("talk.mp4"),
            status: "exit status: 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("[ffmpeg]"));
        assert!(msg.contains("talk.mp4"));
    }

    #[test]
    fn test_invalid_format_message() {
        let err = PipelineError::InvalidFormat(PathBuf::from("song.mp3"));
        assert_eq!(err.to_string(), "\"song.mp3\" is not a .wav file");
    }
}
