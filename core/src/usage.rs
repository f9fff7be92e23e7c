use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, Stream, StreamExt};
use log::{error, info, warn};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::errors::RagError;
use crate::types::{ChatCompletionTail, Usage};

pub const FRAME_DELIMITER: &str = "data: ";
pub const DONE_MARKER: &str = "[DONE]";

/// Finds the last payload before the `[DONE]` marker of a server-sent event
/// body and reads the usage block out of it. A body without frames is
/// treated as one plain JSON completion.
pub fn parse_usage(body: &[u8]) -> Result<Usage, RagError> {
    let text = String::from_utf8_lossy(body);
    let mut last_json = "";
    for chunk in text.split(FRAME_DELIMITER) {
        let trimmed = chunk.trim();
        if trimmed == DONE_MARKER {
            break;
        }
        if !trimmed.is_empty() {
            last_json = trimmed;
        }
    }
    let tail: ChatCompletionTail = serde_json::from_str(last_json)?;
    tail.usage.ok_or_else(|| {
        RagError::InternalError(anyhow::anyhow!(
            "completion '{}' carries no usage block",
            tail.id
        ))
    })
}

pub fn log_usage(body: &[u8]) {
    match parse_usage(body) {
        Ok(usage) => info!(
            "used tokens: {} (prompt: {}, completion: {})",
            usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
        ),
        Err(e) => warn!("failed to read token usage from response: {}", e),
    }
}

/// Passes a response body through untouched while keeping a copy; once the
/// body is exhausted the copy is scanned for token usage and logged.
pub struct UsageTap {
    inner: BoxStream<'static, Result<Bytes, RagError>>,
    buffer: BytesMut,
    finished: bool,
}

impl UsageTap {
    pub fn new(inner: BoxStream<'static, Result<Bytes, RagError>>) -> Self {
        UsageTap {
            inner,
            buffer: BytesMut::new(),
            finished: false,
        }
    }
}

impl Stream for UsageTap {
    type Item = Result<Bytes, RagError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.buffer.extend_from_slice(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                error!("failed to relay response body: {}", e);
                self.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.finished = true;
                info!("forwarded response to client");
                log_usage(&self.buffer);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
