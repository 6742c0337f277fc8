use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::RelayError;

/// Synthesized audio as it arrives from the provider; consumed once, in order
pub type AudioStream = BoxStream<'static, Result<Bytes, RelayError>>;

/// Streaming speech synthesis collaborator
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Open the upstream synthesis stream. Resolves once the provider has
    /// answered with a success status; the body is read lazily afterwards.
    async fn open_stream(&self, text: &str) -> Result<AudioStream, RelayError>;
}
