use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use super::interface::{Direction, Translator};
use crate::config::TranslateConfig;
use crate::error::RelayError;

/// Translator backed by the public Google Translate web endpoint
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(config: &TranslateConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String, RelayError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let url = format!("{}/translate_a/single", self.base_url);
        debug!(
            "Translating {} chars {} -> {}",
            text.len(),
            direction.source(),
            direction.target()
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", direction.source()),
                ("tl", direction.target()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Translation request failed: {}", e);
                RelayError::Translation(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Translation service returned {}", status);
            return Err(RelayError::Translation(format!(
                "translation service returned {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| RelayError::Translation("translation service returned non-JSON".into()))?;

        extract_translation(&body)
            .ok_or_else(|| RelayError::Translation("unexpected translation payload".into()))
    }
}

/// The endpoint answers with `[[["<translated>", "<source>", ...], ...], ...]`;
/// the translation is the concatenation of every segment's first element.
fn extract_translation(body: &Value) -> Option<String> {
    let segments = body.get(0)?;
    if segments.is_null() {
        return Some(String::new());
    }

    let mut translated = String::new();
    for segment in segments.as_array()? {
        if let Some(piece) = segment.get(0).and_then(|v| v.as_str()) {
            translated.push_str(piece);
        }
    }
    Some(translated)
}
