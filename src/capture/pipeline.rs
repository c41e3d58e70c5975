//! Capture orchestration
//!
//! Sequences recognition, the text gate, location, reverse geocoding,
//! romanization, translation and persistence for one image. A successful run
//! stores exactly one snap; every other path stores nothing.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{Degradation, PipelineError};
use super::image::CaptureImage;
use crate::location::{self, Coordinates};
use crate::services::{DeviceLocator, Recognizer, ReverseGeocoder, Translator};
use crate::storage::{CapturedSnap, SnapStore};
use crate::text::{self, glossary, GateDecision, RejectReason, RomanizeOptions};

/// Address shown when no address could be determined
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Translation stored when neither the translator nor the glossary produced one
pub const TRANSLATION_UNAVAILABLE: &str = "Translation unavailable";

/// Pipeline behaviour switches
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineConfig {
    /// Pinyin output options
    pub romanization: RomanizeOptions,
    /// Ask the device locator when the image carries no location
    pub live_location_fallback: bool,
}

/// What the user sees after a snap is saved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapSummary {
    pub id: String,
    pub text: String,
    pub pinyin: String,
    /// Resolved address or [`UNKNOWN_LOCATION`]
    pub address: String,
    pub translation: String,
    pub maps_link: Option<String>,
    /// Snaps in the store after this one was saved
    pub total_count: usize,
    pub degradations: Vec<Degradation>,
}

/// Result of running the pipeline on an image
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// One name was picked automatically and saved
    Saved(SnapSummary),
    /// Several plausible names; pass the chosen one to `confirm`
    NeedsSelection(Vec<String>),
}

/// A fully assembled snap that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSnap {
    pub snap: CapturedSnap,
    pub degradations: Vec<Degradation>,
}

/// Runs the capture pipeline against injected collaborators
pub struct CaptureOrchestrator {
    config: PipelineConfig,
    recognizer: Arc<dyn Recognizer>,
    geocoder: Arc<dyn ReverseGeocoder>,
    translator: Arc<dyn Translator>,
    locator: Option<Arc<dyn DeviceLocator>>,
    store: Arc<dyn SnapStore>,
}

impl CaptureOrchestrator {
    pub fn new(
        config: PipelineConfig,
        recognizer: Arc<dyn Recognizer>,
        geocoder: Arc<dyn ReverseGeocoder>,
        translator: Arc<dyn Translator>,
        store: Arc<dyn SnapStore>,
    ) -> Self {
        Self {
            config,
            recognizer,
            geocoder,
            translator,
            locator: None,
            store,
        }
    }

    /// Attach a device locator for the live location fallback
    pub fn with_device_locator(mut self, locator: Arc<dyn DeviceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Recognize the image and save the place name if exactly one is found
    pub async fn process(&self, image: &CaptureImage) -> Result<CaptureOutcome, PipelineError> {
        self.process_with_cancel(image, &CancellationToken::new()).await
    }

    /// [`process`](Self::process) that stops with `Cancelled` once `cancel` fires
    pub async fn process_with_cancel(
        &self,
        image: &CaptureImage,
        cancel: &CancellationToken,
    ) -> Result<CaptureOutcome, PipelineError> {
        info!("Processing capture {}", image.reference());

        let raw = cancellable(cancel, self.recognizer.recognize(image))
            .await?
            .map_err(|err| {
                warn!("Text recognition failed: {err}");
                PipelineError::RecognitionFailed(err)
            })?;

        let (lines, ranked) = text::analyze(&raw);
        debug!("Recognized {} lines, {} Chinese candidates", lines.len(), ranked.len());
        for candidate in &ranked {
            debug!("  {:>6.1}  {}", candidate.score, candidate.text);
        }

        match text::decide(&lines, &ranked) {
            GateDecision::AutoAccept(text) => {
                info!("Auto-accepted '{}'", text);
                let summary = self.enrich_and_persist(text, image, cancel).await?;
                Ok(CaptureOutcome::Saved(summary))
            }
            GateDecision::PromptSelection(candidates) => {
                info!("{} candidates need a user selection", candidates.len());
                Ok(CaptureOutcome::NeedsSelection(candidates))
            }
            GateDecision::Reject(RejectReason::NoTextDetected) => {
                info!("No text detected");
                Err(PipelineError::NoTextDetected)
            }
            GateDecision::Reject(RejectReason::PoorQuality { text }) => {
                info!("Rejected low quality text '{}'", text);
                Err(PipelineError::PoorQuality { text })
            }
        }
    }

    /// Save a user-selected (or overridden) text without recognizing again
    pub async fn confirm(
        &self,
        selected_text: &str,
        image: &CaptureImage,
    ) -> Result<SnapSummary, PipelineError> {
        self.confirm_with_cancel(selected_text, image, &CancellationToken::new())
            .await
    }

    /// [`confirm`](Self::confirm) that stops with `Cancelled` once `cancel` fires
    pub async fn confirm_with_cancel(
        &self,
        selected_text: &str,
        image: &CaptureImage,
        cancel: &CancellationToken,
    ) -> Result<SnapSummary, PipelineError> {
        let text = text::clean_line(selected_text);
        if text.is_empty() {
            return Err(PipelineError::NoTextDetected);
        }

        info!("Confirmed '{}' for {}", text, image.reference());
        self.enrich_and_persist(text, image, cancel).await
    }

    /// Store a snap whose earlier insert failed
    ///
    /// Only the insert is repeated. Inserts are keyed by snap id, so retrying
    /// after an ambiguous failure cannot create a second record.
    pub fn retry_persist(&self, pending: PendingSnap) -> Result<SnapSummary, PipelineError> {
        info!("Retrying save of snap {}", pending.snap.id);
        self.persist(pending)
    }

    async fn enrich_and_persist(
        &self,
        text: String,
        image: &CaptureImage,
        cancel: &CancellationToken,
    ) -> Result<SnapSummary, PipelineError> {
        let mut degradations = Vec::new();

        let coordinates = self.locate(image, cancel).await?;
        let address = match coordinates {
            Some(coordinates) => Some(self.lookup_address(coordinates, cancel, &mut degradations).await?),
            None => None,
        };

        let pinyin = text::to_pinyin(&text, self.config.romanization);
        let translation = self.translate(&text, cancel, &mut degradations).await?;

        let snap = CapturedSnap::new(
            image.reference(),
            text,
            pinyin,
            coordinates,
            address,
            translation,
        );

        if cancel.is_cancelled() {
            info!("Capture cancelled before saving");
            return Err(PipelineError::Cancelled);
        }

        self.persist(PendingSnap { snap, degradations })
    }

    async fn locate(
        &self,
        image: &CaptureImage,
        cancel: &CancellationToken,
    ) -> Result<Option<Coordinates>, PipelineError> {
        if let Some(coordinates) = location::resolve(image) {
            debug!("Image location {:?}", coordinates);
            return Ok(Some(coordinates));
        }

        if !self.config.live_location_fallback {
            return Ok(None);
        }
        let Some(locator) = &self.locator else {
            debug!("Live location enabled but no device locator attached");
            return Ok(None);
        };

        match cancellable(cancel, locator.current_location()).await? {
            Ok(coordinates) => {
                debug!("Device location {:?}", coordinates);
                Ok(coordinates)
            }
            Err(err) => {
                warn!("Device location unavailable: {err}");
                Ok(None)
            }
        }
    }

    async fn lookup_address(
        &self,
        coordinates: Coordinates,
        cancel: &CancellationToken,
        degradations: &mut Vec<Degradation>,
    ) -> Result<String, PipelineError> {
        match cancellable(cancel, self.geocoder.reverse_geocode(coordinates)).await? {
            Ok(Some(address)) if !address.trim().is_empty() => Ok(address.trim().to_string()),
            Ok(_) => {
                warn!("No address known for {:?}", coordinates);
                degradations.push(Degradation::GeocodingFailed);
                Ok(UNKNOWN_LOCATION.to_string())
            }
            Err(err) => {
                warn!("Reverse geocoding failed: {err}");
                degradations.push(Degradation::GeocodingFailed);
                Ok(UNKNOWN_LOCATION.to_string())
            }
        }
    }

    async fn translate(
        &self,
        text: &str,
        cancel: &CancellationToken,
        degradations: &mut Vec<Degradation>,
    ) -> Result<String, PipelineError> {
        match cancellable(cancel, self.translator.translate(text)).await? {
            Ok(translated) if !translated.trim().is_empty() => Ok(translated.trim().to_string()),
            Ok(_) => {
                warn!("Translator returned nothing for '{}'", text);
                degradations.push(Degradation::TranslationFailed);
                Ok(fallback_translation(text))
            }
            Err(err) => {
                warn!("Translation failed: {err}");
                degradations.push(Degradation::TranslationFailed);
                Ok(fallback_translation(text))
            }
        }
    }

    fn persist(&self, pending: PendingSnap) -> Result<SnapSummary, PipelineError> {
        if let Err(source) = self.store.insert(&pending.snap) {
            warn!("Failed to save snap {}: {source}", pending.snap.id);
            return Err(PipelineError::PersistenceFailed {
                source,
                pending: Box::new(pending),
            });
        }

        let total_count = match self.store.count() {
            Ok(count) => count,
            Err(source) => {
                return Err(PipelineError::PersistenceFailed {
                    source,
                    pending: Box::new(pending),
                })
            }
        };

        info!("Saved snap {} ({} total)", pending.snap.id, total_count);
        Ok(summarize(pending, total_count))
    }
}

fn fallback_translation(text: &str) -> String {
    glossary::lookup(text).unwrap_or_else(|| TRANSLATION_UNAVAILABLE.to_string())
}

fn summarize(pending: PendingSnap, total_count: usize) -> SnapSummary {
    let PendingSnap { snap, degradations } = pending;
    SnapSummary {
        id: snap.id,
        text: snap.recognized_text,
        pinyin: snap.pinyin,
        address: snap.address.unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        translation: snap.translation,
        maps_link: snap.maps_link,
        total_count,
        degradations,
    }
}

/// Await `future` unless `cancel` fires first
async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = T>,
) -> Result<T, PipelineError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        value = future => Ok(value),
    }
}
