use bytes::Bytes;
use futures::{future, stream, Stream, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::interface::AudioStream;
use crate::error::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Streaming,
    Completed,
    Failed,
}

/// Owns the bookkeeping for one forwarded stream and reports how it ended.
/// Dropped together with the upstream body, whichever way the stream ends.
struct StreamGuard {
    stream_id: Uuid,
    bytes: usize,
    chunks: usize,
    outcome: Outcome,
}

impl StreamGuard {
    fn new(stream_id: Uuid) -> Self {
        Self {
            stream_id,
            bytes: 0,
            chunks: 0,
            outcome: Outcome::Streaming,
        }
    }

    fn record(&mut self, chunk: &Bytes) {
        self.bytes += chunk.len();
        self.chunks += 1;
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        match self.outcome {
            Outcome::Completed => info!(
                "TTS stream {} completed: {} bytes in {} chunks",
                self.stream_id, self.bytes, self.chunks
            ),
            Outcome::Failed => warn!(
                "TTS stream {} aborted by upstream error after {} bytes",
                self.stream_id, self.bytes
            ),
            Outcome::Streaming => info!(
                "TTS stream {} cancelled by client after {} bytes, upstream released",
                self.stream_id, self.bytes
            ),
        }
    }
}

/// Relay `upstream` chunk by chunk, splitting anything larger than `chunk_size`
/// and dropping empty chunks. Nothing is buffered beyond the chunk in flight;
/// dropping the returned stream drops the upstream body with it.
pub fn forward_audio(
    upstream: AudioStream,
    chunk_size: usize,
) -> impl Stream<Item = Result<Bytes, RelayError>> + Send + 'static {
    let stream_id = Uuid::new_v4();
    debug!("TTS stream {} opened (chunk size {})", stream_id, chunk_size);

    let chunks = rechunk(upstream, chunk_size);
    let guard = StreamGuard::new(stream_id);

    stream::unfold(Some((chunks, guard)), |state| async move {
        let (mut chunks, mut guard) = state?;
        match chunks.next().await {
            Some(Ok(chunk)) => {
                guard.record(&chunk);
                Some((Ok(chunk), Some((chunks, guard))))
            }
            Some(Err(err)) => {
                guard.outcome = Outcome::Failed;
                Some((Err(err), None))
            }
            None => {
                guard.outcome = Outcome::Completed;
                None
            }
        }
    })
}

fn rechunk(upstream: AudioStream, chunk_size: usize) -> AudioStream {
    let chunk_size = chunk_size.max(1);
    upstream
        .flat_map(move |item| match item {
            Ok(bytes) => {
                stream::iter(split_bytes(bytes, chunk_size).into_iter().map(Ok)).left_stream()
            }
            Err(err) => stream::once(future::ready(Err(err))).right_stream(),
        })
        .boxed()
}

fn split_bytes(mut bytes: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut pieces = Vec::with_capacity(bytes.len() / chunk_size + 1);
    while bytes.len() > chunk_size {
        pieces.push(bytes.split_to(chunk_size));
    }
    if !bytes.is_empty() {
        pieces.push(bytes);
    }
    pieces
}
