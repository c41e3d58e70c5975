//! Capture pipeline errors

use thiserror::Error;

use super::pipeline::PendingSnap;
use crate::services::ServiceError;
use crate::storage::StoreError;

/// Why a capture run ended without a saved snap
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("text recognition failed: {0}")]
    RecognitionFailed(#[source] ServiceError),

    #[error("no text detected in image")]
    NoTextDetected,

    /// A single candidate was found but looks unreliable; `confirm` can still save it
    #[error("recognized text '{text}' failed the quality check")]
    PoorQuality { text: String },

    /// The snap was fully assembled but could not be stored; hand `pending`
    /// to `retry_persist`
    #[error("failed to save snap: {source}")]
    PersistenceFailed {
        source: StoreError,
        pending: Box<PendingSnap>,
    },

    #[error("capture cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Whether the caller can still end up with a saved snap without
    /// recapturing the image
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::PoorQuality { .. } | PipelineError::PersistenceFailed { .. }
        )
    }
}

/// A collaborator failure that was replaced by a static substitute
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    GeocodingFailed,
    TranslationFailed,
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Degradation::GeocodingFailed => write!(f, "address lookup failed"),
            Degradation::TranslationFailed => write!(f, "translation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(PipelineError::PoorQuality { text: "x".into() }.is_recoverable());
        assert!(!PipelineError::NoTextDetected.is_recoverable());
        assert!(!PipelineError::Cancelled.is_recoverable());
        assert!(!PipelineError::RecognitionFailed(ServiceError::NotConfigured("ocr")).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = PipelineError::PoorQuality { text: "a1".into() };
        assert_eq!(err.to_string(), "recognized text 'a1' failed the quality check");
        assert_eq!(Degradation::GeocodingFailed.to_string(), "address lookup failed");
    }
}
