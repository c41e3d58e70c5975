//! Reverse geocoding through a Nominatim server

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{checked_body, ReverseGeocoder, ServiceError};
use crate::config::GeocodingConfig;
use crate::location::Coordinates;

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Nominatim `/reverse` client
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self, ServiceError> {
        // Nominatim's usage policy requires an identifying User-Agent
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<String>, ServiceError> {
        let url = format!("{}/reverse", self.endpoint);
        debug!(?coordinates, "Reverse geocoding");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
            ])
            .send()
            .await?;

        let body = checked_body(response).await?;
        parse_response(&body)
    }
}

/// Pull the address out of a `/reverse` response
///
/// Nominatim reports "Unable to geocode" as an `error` field with a 200
/// status; that is an absent address, not a failure.
pub fn parse_response(body: &str) -> Result<Option<String>, ServiceError> {
    let response: ReverseResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::InvalidResponse(format!("geocoding response: {e}")))?;

    if let Some(error) = response.error {
        debug!("Geocoder found no address: {}", error);
        return Ok(None);
    }

    Ok(response
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let body = r#"{"place_id": 1, "display_name": "南京东路, 黄浦区, 上海市, 中国", "lat": "31.2", "lon": "121.4"}"#;
        assert_eq!(
            parse_response(body).unwrap().as_deref(),
            Some("南京东路, 黄浦区, 上海市, 中国")
        );
    }

    #[test]
    fn test_parse_unable_to_geocode() {
        let body = r#"{"error": "Unable to geocode"}"#;
        assert_eq!(parse_response(body).unwrap(), None);
    }

    #[test]
    fn test_parse_blank_name() {
        assert_eq!(parse_response(r#"{"display_name": "  "}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_response("not json"),
            Err(ServiceError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_new_trims_endpoint() {
        let config = GeocodingConfig {
            endpoint: "https://nominatim.example.org/".to_string(),
            ..Default::default()
        };
        let geocoder = NominatimGeocoder::new(&config).unwrap();
        assert_eq!(geocoder.endpoint, "https://nominatim.example.org");
    }
}
