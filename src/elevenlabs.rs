use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::asr::interface::DEFAULT_MIME_TYPE;
use crate::asr::{AudioUpload, SpeechToText, Transcription};
use crate::config::{Secrets, SpeechConfig};
use crate::error::RelayError;
use crate::tts::{AudioStream, TextToSpeech};

const XI_API_KEY_HEADER: &str = "xi-api-key";

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Client for the ElevenLabs speech-to-text and streaming text-to-speech APIs
#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    stt_model_id: String,
    tts_model_id: String,
    timeout: Duration,
}

impl ElevenLabsClient {
    pub fn new(config: &SpeechConfig, secrets: &Secrets) -> anyhow::Result<Self> {
        // Only the connect phase is bounded here; a TTS body may outlive any fixed timeout.
        let client = Client::builder().connect_timeout(config.timeout()).build()?;

        info!(
            "Initialized ElevenLabs client: base_url={}, stt_model={}, tts_model={}",
            config.base_url, config.stt_model_id, config.tts_model_id
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: secrets.api_key.clone(),
            voice_id: secrets.voice_id.clone(),
            stt_model_id: config.stt_model_id.clone(),
            tts_model_id: config.tts_model_id.clone(),
            timeout: config.timeout(),
        })
    }

    fn file_part(upload: &AudioUpload) -> Result<Part, RelayError> {
        let part = || {
            Part::stream_with_length(upload.bytes.clone(), upload.bytes.len() as u64)
                .file_name(upload.filename.clone())
        };

        part()
            .mime_str(&upload.mime_type)
            .or_else(|_| part().mime_str(DEFAULT_MIME_TYPE))
            .map_err(RelayError::from)
    }
}

#[async_trait]
impl SpeechToText for ElevenLabsClient {
    async fn transcribe(&self, upload: AudioUpload) -> Result<Transcription, RelayError> {
        let url = format!("{}/v1/speech-to-text", self.base_url);
        debug!(
            "Sending {} bytes ({}, {}) for transcription",
            upload.bytes.len(),
            upload.filename,
            upload.mime_type
        );

        let form = Form::new()
            .part("file", Self::file_part(&upload)?)
            .text("model_id", self.stt_model_id.clone());

        let response = self
            .client
            .post(&url)
            .header(XI_API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                error!("STT upstream request failed: {}", e);
                RelayError::from(e)
            })?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            error!("STT upstream returned {}", status);
            let body = serde_json::from_slice::<Value>(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let result: Value = serde_json::from_slice(&body).map_err(|_| RelayError::NonJson)?;
        let text = result
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        info!("STT: transcribed {} chars", text.len());
        Ok(Transcription { text })
    }
}

#[async_trait]
impl TextToSpeech for ElevenLabsClient {
    async fn open_stream(&self, text: &str) -> Result<AudioStream, RelayError> {
        let url = format!(
            "{}/v1/text-to-speech/{}/stream",
            self.base_url, self.voice_id
        );
        debug!("Opening TTS stream for {} chars", text.len());

        let request = self
            .client
            .post(&url)
            .header(XI_API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&SynthesisRequest {
                text,
                model_id: &self.tts_model_id,
            })
            .send();

        // Bounds the wait for response headers only, the body streams untimed.
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                RelayError::Transport(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                error!("TTS upstream request failed: {}", e);
                RelayError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("TTS upstream returned {}", status);
            // The error body gets the same deadline as the headers.
            let detail = tokio::time::timeout(self.timeout, response.text())
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body: Value::String(detail),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(RelayError::from))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(url: &str) -> ElevenLabsClient {
        let config = SpeechConfig {
            base_url: url.to_string(),
            timeout_secs: 5,
            ..SpeechConfig::default()
        };
        let secrets = Secrets {
            api_key: "test-key".into(),
            voice_id: "voice-1".into(),
        };
        ElevenLabsClient::new(&config, &secrets).unwrap()
    }

    fn upload() -> AudioUpload {
        AudioUpload::new(
            Some("speech.webm".into()),
            Bytes::from_static(b"fake-audio"),
            Some("audio/webm".into()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_stt_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/speech-to-text")
            .match_header("xi-api-key", "test-key")
            .match_header("accept", "application/json")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("scribe_v1".into()),
                Matcher::Regex(r#"filename="speech.webm""#.into()),
                Matcher::Regex("fake-audio".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"language_code": "en", "text": "Hello there"}"#)
            .create_async()
            .await;

        let result = client_for(&server.url()).transcribe(upload()).await;

        mock.assert_async().await;
        assert_eq!(result.unwrap().text, "Hello there");
    }

    #[tokio::test]
    async fn test_stt_missing_text_defaults_to_empty() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/speech-to-text")
            .with_status(200)
            .with_body(r#"{"language_code": "es"}"#)
            .create_async()
            .await;

        let result = client_for(&server.url()).transcribe(upload()).await;

        mock.assert_async().await;
        assert_eq!(result.unwrap().text, "");
    }

    #[tokio::test]
    async fn test_stt_error_status_keeps_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/speech-to-text")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": {"status": "invalid_api_key"}}"#)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .transcribe(upload())
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            RelayError::UpstreamStatus { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, json!({"detail": {"status": "invalid_api_key"}}));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stt_error_status_with_text_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/speech-to-text")
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let err = client_for(&server.url())
            .transcribe(upload())
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            RelayError::UpstreamStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, json!("Service Unavailable"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stt_non_json_success_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/speech-to-text")
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let err = client_for(&server.url())
            .transcribe(upload())
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, RelayError::NonJson));
    }

    #[tokio::test]
    async fn test_stt_connection_failure_is_transport_error() {
        // Nothing listens on port 1
        let err = client_for("http://127.0.0.1:1")
            .transcribe(upload())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Transport(_)));
        assert!(err.to_string().starts_with("Upstream request failed:"));
    }

    #[tokio::test]
    async fn test_tts_streams_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/text-to-speech/voice-1/stream")
            .match_header("xi-api-key", "test-key")
            .match_header("accept", "audio/mpeg")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "text": "Hola mundo",
                "model_id": "eleven_multilingual_v2"
            })))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(b"abcdef".to_vec())
            .create_async()
            .await;

        let stream = client_for(&server.url())
            .open_stream("Hola mundo")
            .await
            .unwrap();
        let chunks: Vec<Bytes> = stream.map(|c| c.unwrap()).collect().await;

        mock.assert_async().await;
        assert_eq!(chunks.concat(), b"abcdef".to_vec());
    }

    #[tokio::test]
    async fn test_tts_error_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/text-to-speech/voice-1/stream")
            .with_status(422)
            .with_body(r#"{"detail": "text too long"}"#)
            .create_async()
            .await;

        let result = client_for(&server.url()).open_stream("Hello").await;

        mock.assert_async().await;
        match result {
            Err(RelayError::UpstreamStatus { status, body }) => {
                assert_eq!(status, 422);
                assert_eq!(body, json!(r#"{"detail": "text too long"}"#));
            }
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("expected an error"),
        }
    }
}
