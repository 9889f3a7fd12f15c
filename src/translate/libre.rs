//! LibreTranslate provider.
//!
//! Talks to a LibreTranslate-compatible `/translate` endpoint.

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};

use super::TranslationProvider;
use crate::config::TranslatorConfig;
use crate::error::{Error, Result};

/// Pause used when a 429 response carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 20;

/// LibreTranslate HTTP client.
pub struct LibreTranslateProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl LibreTranslateProvider {
    /// Create a provider for `endpoint` (without the `/translate` suffix).
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Create a provider from the resolved translator settings.
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self::new(config.endpoint.clone(), config.api_key.clone())
    }

    /// Endpoint base URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

impl TranslationProvider for LibreTranslateProvider {
    fn name(&self) -> &str {
        "libretranslate"
    }

    async fn translate(&self, source_lang: &str, text: &str, target_lang: &str) -> Result<String> {
        let url = format!("{}/translate", self.endpoint);
        let request = TranslateRequest {
            q: text,
            source: source_lang,
            target: target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Translation(format!("LibreTranslate request failed: {e}")))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(Error::RateLimited { retry_after_secs });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(Error::Translation(format!(
                "LibreTranslate returned {status}: {error}"
            )));
        }

        let data: TranslateResponse = response
            .json()
            .await
            .map_err(|e| Error::Translation(format!("Failed to parse LibreTranslate response: {e}")))?;
        Ok(data.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let provider = LibreTranslateProvider::new("http://localhost:5000/", None);
        assert_eq!(provider.endpoint(), "http://localhost:5000");
        assert_eq!(provider.name(), "libretranslate");
    }

    #[test]
    fn test_request_shape() {
        let request = TranslateRequest {
            q: "Bye",
            source: "en",
            target: "de",
            format: "text",
            api_key: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"q": "Bye", "source": "en", "target": "de", "format": "text"})
        );
    }

    #[test]
    fn test_response_shape() {
        let response: TranslateResponse =
            serde_json::from_str(r#"{"translatedText": "Tschüss"}"#).unwrap();
        assert_eq!(response.translated_text, "Tschüss");
    }
}
