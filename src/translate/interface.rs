use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Translation pipelines the gateway supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    EnToEs,
    EsToEn,
}

impl Direction {
    /// Parse a client selector (`en_to_es` / `es_to_en`), exactly as given;
    /// anything else is `None`
    pub fn parse(selector: &str) -> Option<Self> {
        match selector {
            "en_to_es" => Some(Self::EnToEs),
            "es_to_en" => Some(Self::EsToEn),
            _ => None,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Self::EnToEs => "en",
            Self::EsToEn => "es",
        }
    }

    pub fn target(&self) -> &'static str {
        match self {
            Self::EnToEs => "es",
            Self::EsToEn => "en",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}

/// Text translation collaborator
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String, RelayError>;
}
