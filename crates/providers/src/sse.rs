//! Server-sent-event plumbing shared by the streaming providers.
//!
//! Both Gemini (`alt=sse`) and OpenAI-compatible endpoints answer with
//! `data: {...}` lines. The pump here reads the HTTP body, splits it into
//! lines, hands every data payload to a provider-specific parser, and
//! forwards the resulting text fragments over a bounded channel.

use futures::StreamExt;
use genweb_core::error::ProviderError;
use genweb_core::provider::FragmentReceiver;
use tracing::{debug, trace, warn};

/// Channel capacity between the upstream reader and the consumer.
const FRAGMENT_BUFFER: usize = 64;

/// What a single SSE data payload meant.
#[derive(Debug)]
pub(crate) enum Payload {
    /// A text fragment to forward.
    Text(String),
    /// Nothing to forward (metadata, empty delta, finish marker).
    Ignore,
    /// Explicit end of stream.
    Done,
    /// The provider reported a failure inside the stream.
    Error(ProviderError),
}

/// Splits a byte stream into complete lines.
///
/// Bytes are buffered until a newline arrives, so multi-byte UTF-8
/// sequences split across network chunks decode correctly.
#[derive(Debug, Default)]
pub(crate) struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Append raw bytes and return the data payloads of every completed line.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(line_end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=line_end).collect();
            if let Some(data) = data_payload(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Return the payload of a final line that never got its newline.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.pending);
        data_payload(&line)
    }
}

/// Extract the payload of a `data:` line. Empty lines, comments and other
/// SSE fields yield `None`.
fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\n', '\r']);

    // Skip empty lines and SSE comments
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    Some(data.to_string())
}

/// Map a non-success HTTP status to a provider error.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ));
    }

    if status != 200 {
        let error_body = response.text().await.unwrap_or_default();
        warn!(provider, status, body = %error_body, "Provider streaming error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}

/// Spawn a task that pumps an SSE response into a fragment channel.
///
/// The task stops as soon as the receiver is dropped, which drops the
/// response and closes the upstream connection.
pub(crate) fn spawn_pump<P>(provider: String, response: reqwest::Response, parse: P) -> FragmentReceiver
where
    P: Fn(&str) -> Result<Payload, serde_json::Error> + Send + 'static,
{
    let (tx, rx) = tokio::sync::mpsc::channel(FRAGMENT_BUFFER);

    tokio::spawn(async move {
        let mut byte_stream = response.bytes_stream();
        let mut lines = SseLineBuffer::default();

        loop {
            // Thinking models can stay silent for a long time before the first chunk
            let chunk_result = tokio::select! {
                chunk = byte_stream.next() => chunk,
                _ = tx.closed() => {
                    debug!(provider = %provider, "Fragment receiver dropped, closing upstream");
                    return;
                }
            };
            let Some(chunk_result) = chunk_result else {
                break;
            };

            let bytes = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    let _ = tx
                        .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                        .await;
                    return;
                }
            };

            for data in lines.push(&bytes) {
                match forward(&provider, &parse, &data) {
                    Step::Send(item) => {
                        let failed = item.is_err();
                        if tx.send(item).await.is_err() {
                            debug!(provider = %provider, "Fragment receiver dropped, closing upstream");
                            return;
                        }
                        if failed {
                            return;
                        }
                    }
                    Step::Skip => {}
                    Step::Stop => return,
                }
            }
        }

        // Stream ended without an explicit end marker
        if let Some(data) = lines.finish() {
            if let Step::Send(item) = forward(&provider, &parse, &data) {
                let _ = tx.send(item).await;
            }
        }
    });

    rx
}

enum Step {
    Send(Result<String, ProviderError>),
    Skip,
    Stop,
}

fn forward<P>(provider: &str, parse: &P, data: &str) -> Step
where
    P: Fn(&str) -> Result<Payload, serde_json::Error>,
{
    match parse(data) {
        Ok(Payload::Text(text)) if !text.is_empty() => Step::Send(Ok(text)),
        Ok(Payload::Text(_)) | Ok(Payload::Ignore) => Step::Skip,
        Ok(Payload::Done) => Step::Stop,
        Ok(Payload::Error(e)) => Step::Send(Err(e)),
        Err(e) => {
            trace!(
                provider = %provider,
                data = %data,
                error = %e,
                "Ignoring unparseable SSE chunk"
            );
            Step::Skip
        }
    }
}
