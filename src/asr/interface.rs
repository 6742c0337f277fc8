use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// One uploaded recording, held in memory for the duration of a request
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub bytes: Bytes,
    pub mime_type: String,
}

impl AudioUpload {
    /// Validate the raw multipart pieces; `filename` and `bytes` must be non-empty
    pub fn new(
        filename: Option<String>,
        bytes: Bytes,
        mime_type: Option<String>,
    ) -> Result<Self, RelayError> {
        let filename = filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RelayError::validation("Empty filename"))?;

        if bytes.is_empty() {
            return Err(RelayError::validation("Empty audio payload"));
        }

        let mime_type = mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        Ok(Self {
            filename,
            bytes,
            mime_type,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
}

/// Speech recognition collaborator
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, upload: AudioUpload) -> Result<Transcription, RelayError>;
}
