//! Capture Layer
//!
//! Takes a photographed or picked image through recognition, the quality gate
//! and enrichment, and stores the result as a snap.

pub mod error;
pub mod image;
pub mod pipeline;

pub use error::{Degradation, PipelineError};
pub use image::CaptureImage;
pub use pipeline::{
    CaptureOrchestrator, CaptureOutcome, PendingSnap, PipelineConfig, SnapSummary,
    TRANSLATION_UNAVAILABLE, UNKNOWN_LOCATION,
};
