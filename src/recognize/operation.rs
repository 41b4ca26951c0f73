use std::fmt;

use crate::error::Result;
use crate::recognize::aggregate::TranscriptFragment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    /// Location of the previously uploaded WAV file.
    pub uri: String,
    pub sample_rate_hz: u32,
    pub language_code: String,
}

/// The remote operation finished in an error state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionFailure {
    pub code: Option<i64>,
    pub message: String,
}

impl RecognitionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for RecognitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

pub type Outcome = std::result::Result<Vec<TranscriptFragment>, RecognitionFailure>;

/// Invoked exactly once, from a thread owned by the service client.
pub type CompletionCallback = Box<dyn FnOnce(Outcome) + Send + 'static>;

/// Handle to a long-running recognition job.
pub trait Operation: Send {
    fn name(&self) -> &str;
    /// Percent complete as last reported by the service, if it reported any.
    fn progress(&self) -> Option<u8>;
    /// Register the completion callback. Dropping it without calling it
    /// means the result is lost.
    fn on_complete(&mut self, callback: CompletionCallback);
    /// The caller stopped waiting; background work for this operation may stop.
    /// The remote job itself is left running.
    fn abandon(&self) {}
}

pub trait RecognitionService: Send {
    fn name(&self) -> &str;
    /// Start a job and return its handle without waiting for it.
    fn submit(&self, request: &RecognitionRequest) -> Result<Box<dyn Operation>>;
}
