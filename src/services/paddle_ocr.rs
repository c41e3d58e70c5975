//! PaddleOCR serving backend
//!
//! Posts the base64-encoded image to a PaddleOCR HTTP endpoint (PaddleHub
//! serving or a compatible wrapper) and joins the recognized lines with
//! newlines.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{checked_body, Recognizer, ServiceError};
use crate::capture::CaptureImage;
use crate::config::RecognitionConfig;

/// Request body understood by the OCR endpoint
#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    image: String,
    lang: &'a str,
    det: bool,
    rec: bool,
    cls: bool,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    results: Vec<OcrResultEntry>,
}

/// One result entry; flat wrappers put `text` here, PaddleHub nests it in `data`
#[derive(Debug, Deserialize)]
struct OcrResultEntry {
    text: Option<String>,
    #[serde(default)]
    data: Vec<OcrTextLine>,
}

#[derive(Debug, Deserialize)]
struct OcrTextLine {
    text: String,
}

/// Text recognition through a PaddleOCR HTTP service
pub struct PaddleOcrClient {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

impl PaddleOcrClient {
    /// Create a client from the recognition settings
    pub fn new(config: &RecognitionConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("PaddleOCR recognizer using {}", config.endpoint);

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
        })
    }
}

#[async_trait]
impl Recognizer for PaddleOcrClient {
    async fn recognize(&self, image: &CaptureImage) -> Result<String, ServiceError> {
        debug!("Sending {} bytes to PaddleOCR", image.len());

        let request = OcrRequest {
            image: STANDARD.encode(&image.data),
            lang: &self.language,
            det: true,
            rec: true,
            cls: false,
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let body = checked_body(response).await?;
        parse_response(&body)
    }
}

/// Extract the recognized lines from a response body
///
/// A well-formed response without results is not an error; it yields an
/// empty blob and the quality gate reports that no text was found.
pub fn parse_response(body: &str) -> Result<String, ServiceError> {
    let response: OcrResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::InvalidResponse(format!("OCR response: {e}")))?;

    let mut lines = Vec::new();
    for entry in response.results {
        if let Some(text) = entry.text {
            lines.push(text);
        }
        lines.extend(entry.data.into_iter().map(|line| line.text));
    }

    if lines.is_empty() {
        warn!("PaddleOCR returned no text");
    }
    Ok(lines.join("\n"))
}
