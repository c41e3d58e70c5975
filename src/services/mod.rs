//! External services used by the capture pipeline
//!
//! The pipeline only sees the traits below. Each has one HTTP-backed
//! implementation so the command line tool works out of the box:
//! - PaddleOCR serving endpoint for text recognition
//! - Nominatim for reverse geocoding
//! - LibreTranslate-compatible endpoint for translation

pub mod nominatim;
pub mod paddle_ocr;
pub mod translate;

use async_trait::async_trait;
use thiserror::Error;

use crate::capture::CaptureImage;
use crate::location::Coordinates;

pub use nominatim::NominatimGeocoder;
pub use paddle_ocr::PaddleOcrClient;
pub use translate::LibreTranslateClient;

/// Failure talking to an external service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport-level failure, including timeouts
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// The service answered with something we could not interpret
    #[error("invalid service response: {0}")]
    InvalidResponse(String),
    /// No endpoint configured for this service
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Turns an image into a newline-delimited text blob
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, image: &CaptureImage) -> Result<String, ServiceError>;
}

/// Turns coordinates into a human-readable address
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// `Ok(None)` means the service knows no address for this position
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<String>, ServiceError>;
}

/// Translates recognized Chinese text
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, ServiceError>;
}

/// Live position of the capturing device
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn current_location(&self) -> Result<Option<Coordinates>, ServiceError>;
}

/// Device locator that always reports the same position
///
/// Stands in for a GPS fix on machines without one; configured through
/// `[location]` in the config file.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    coordinates: Coordinates,
}

impl FixedLocator {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl DeviceLocator for FixedLocator {
    async fn current_location(&self) -> Result<Option<Coordinates>, ServiceError> {
        Ok(Some(self.coordinates))
    }
}

/// Read a response body, turning non-success statuses into errors
pub(crate) async fn checked_body(response: reqwest::Response) -> Result<String, ServiceError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}
