//! Streaming response handling
//!
//! The stream endpoint answers with server-sent events, one JSON chunk per
//! `data:` line. Fragments are yielded in arrival order and forwarded to the
//! HTTP caller as-is; the end of the SSE stream is the end-of-stream marker.

use std::pin::Pin;

use futures::Stream;
use futures::StreamExt;

use crate::errors::CelineError;
use crate::errors::Result;

/// Streaming response from the LLM
pub struct StreamingResponse {
    stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl StreamingResponse {
    pub fn new(stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>) -> Self {
        Self { stream }
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }

    /// Get the underlying stream
    pub fn into_stream(self) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>> {
        self.stream
    }
}

/// Line buffer over the raw byte stream; completed `data:` lines become
/// text fragments
#[derive(Default)]
struct SseBuffer {
    buf: String,
}

impl SseBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.buf.push_str(&String::from_utf8_lossy(chunk));
    }

    /// Next non-empty fragment from the buffered lines, if a complete one
    /// is available
    fn next_fragment(&mut self) -> Option<Result<String>> {
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            let line = line.trim();
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }
            match parse_chunk(data) {
                Ok(text) if text.is_empty() => continue,
                other => return Some(other),
            }
        }
        None
    }
}

/// Extract the candidate text from one SSE JSON chunk
fn parse_chunk(data: &str) -> Result<String> {
    let chunk: super::GenerateResponse = serde_json::from_str(data)
        .map_err(|e| CelineError::Llm(format!("Malformed stream chunk: {e}")))?;
    Ok(chunk.text())
}

/// Adapt an SSE HTTP response into a stream of text fragments, preserving
/// emission order
pub(crate) fn text_fragments(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>> {
    let bytes = Box::pin(response.bytes_stream());
    let stream = futures::stream::unfold(
        (bytes, SseBuffer::default(), false),
        |(mut bytes, mut buf, done)| async move {
            if done {
                return None;
            }
            loop {
                if let Some(item) = buf.next_fragment() {
                    return Some((item, (bytes, buf, false)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => buf.push(&chunk),
                    Some(Err(e)) => {
                        return Some((Err(CelineError::Http(e.to_string())), (bytes, buf, true)))
                    }
                    None => return None,
                }
            }
        },
    );
    Box::pin(stream)
}
