use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// One ordered span of recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    /// In `[0.0, 1.0]`.
    pub confidence: f64,
}

impl TranscriptFragment {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub transcript: String,
    /// Mean of the fragment confidences.
    pub confidence: f64,
    pub fragments: usize,
}

/// Join fragment texts in order, with no separator, and average their
/// confidences. An empty sequence has no defined confidence and is an error.
pub fn aggregate(fragments: &[TranscriptFragment]) -> Result<TranscriptionResult> {
    if fragments.is_empty() {
        return Err(PipelineError::EmptyResult);
    }

    let transcript: String = fragments.iter().map(|f| f.text.as_str()).collect();
    let confidence =
        fragments.iter().map(|f| f.confidence).sum::<f64>() / fragments.len() as f64;

    Ok(TranscriptionResult {
        transcript,
        confidence,
        fragments: fragments.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_error() {
        assert!(matches!(aggregate(&[]), Err(PipelineError::EmptyResult)));
    }

    #[test]
    fn test_concatenates_and_averages() {
        let result = aggregate(&[
            TranscriptFragment::new("a", 0.8),
            TranscriptFragment::new("b", 0.6),
        ])
        .unwrap();
        assert_eq!(result.transcript, "ab");
        assert!((result.confidence - 0.7).abs() < 1e-9);
        assert_eq!(result.fragments, 2);
    }

    #[test]
    fn test_preserves_order_and_spacing() {
        let result = aggregate(&[
            TranscriptFragment::new("we will build", 0.9),
            TranscriptFragment::new(" a wall", 0.9),
            TranscriptFragment::new(" today", 0.6),
        ])
        .unwrap();
        assert_eq!(result.transcript, "we will build a wall today");
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_single_fragment() {
        let result = aggregate(&[TranscriptFragment::new("hello", 0.42)]).unwrap();
        assert_eq!(result.transcript, "hello");
        assert!((result.confidence - 0.42).abs() < 1e-9);
    }
}
