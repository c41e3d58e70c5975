//! Translation through a LibreTranslate-compatible endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{checked_body, ServiceError, Translator};
use crate::config::TranslationConfig;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: Option<String>,
    error: Option<String>,
}

/// LibreTranslate `/translate` client
///
/// Without a configured endpoint every call fails with
/// [`ServiceError::NotConfigured`], which the pipeline treats like any other
/// translation failure and falls back to the glossary.
pub struct LibreTranslateClient {
    client: reqwest::Client,
    endpoint: Option<String>,
    source_lang: String,
    target_lang: String,
    api_key: Option<String>,
}

impl LibreTranslateClient {
    pub fn new(config: &TranslationConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config
                .endpoint
                .as_deref()
                .map(|e| e.trim_end_matches('/').to_string()),
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Translator for LibreTranslateClient {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(ServiceError::NotConfigured("translation endpoint"))?;

        let request = TranslateRequest {
            q: text,
            source: &self.source_lang,
            target: &self.target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        debug!("Translating {:?}", text);
        let response = self
            .client
            .post(format!("{endpoint}/translate"))
            .json(&request)
            .send()
            .await?;

        let body = checked_body(response).await?;
        parse_response(&body)
    }
}

/// Pull the translated text out of a `/translate` response
pub fn parse_response(body: &str) -> Result<String, ServiceError> {
    let response: TranslateResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::InvalidResponse(format!("translation response: {e}")))?;

    if let Some(error) = response.error {
        return Err(ServiceError::InvalidResponse(error));
    }

    response
        .translated_text
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ServiceError::InvalidResponse("empty translation".to_string()))
}
