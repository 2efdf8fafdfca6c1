//! Relay from a provider fragment stream to an HTTP response body.
//!
//! One spawned task owns the extractor and runs a single loop: receive a
//! fragment, feed it through the extractor, forward whatever comes out.
//! When the client goes away the body receiver is dropped, the loop exits,
//! and dropping the fragment receiver stops the provider's upstream read.

use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use genweb_core::{ExtractionOutcome, GenerationStream, HtmlBlockExtractor, ProviderError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

const BODY_BUFFER: usize = 32;

pub(crate) const X_STREAM_ID: &str = "x-stream-id";

/// Build the streaming `text/html` response for a started generation.
pub(crate) fn html_response(stream: GenerationStream) -> Response {
    let stream_id = HeaderValue::from_str(&stream.run_id);
    let body = Body::from_stream(ReceiverStream::new(spawn_relay(stream)));

    let mut response = (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response();

    match stream_id {
        Ok(value) => {
            response.headers_mut().insert(X_STREAM_ID, value);
        }
        Err(e) => warn!(error = %e, "Run id is not a valid header value"),
    }

    response
}

/// Spawn the relay task and return the receiving end of the body channel.
pub(crate) fn spawn_relay(
    stream: GenerationStream,
) -> mpsc::Receiver<Result<String, ProviderError>> {
    let (tx, rx) = mpsc::channel(BODY_BUFFER);
    let GenerationStream {
        run_id,
        mut fragments,
    } = stream;

    tokio::spawn(async move {
        let mut extractor = HtmlBlockExtractor::new();
        let mut emitted = 0usize;

        loop {
            let item = tokio::select! {
                item = fragments.recv() => item,
                _ = tx.closed() => {
                    debug!(run_id = %run_id, "Client disconnected, cancelling generation");
                    return;
                }
            };

            let fragment = match item {
                Some(Ok(fragment)) => fragment,
                Some(Err(e)) => {
                    error!(run_id = %run_id, error = %e, "Generation failed mid-stream");
                    let _ = tx.send(Err(e)).await;
                    return;
                }
                None => break,
            };

            // Once done, keep draining so the upstream completes normally
            if let Some(html) = extractor.push(&fragment) {
                emitted += html.len();
                if tx.send(Ok(html)).await.is_err() {
                    debug!(run_id = %run_id, "Client disconnected, cancelling generation");
                    return;
                }
            }
        }

        if let Some(rest) = extractor.finish() {
            emitted += rest.len();
            if tx.send(Ok(rest)).await.is_err() {
                debug!(run_id = %run_id, "Client disconnected before final flush");
                return;
            }
        }

        match extractor.outcome() {
            Some(ExtractionOutcome::Complete) => {
                info!(run_id = %run_id, bytes = emitted, "Page streamed");
            }
            Some(outcome @ ExtractionOutcome::Unterminated) => {
                warn!(
                    run_id = %run_id,
                    bytes = emitted,
                    outcome = outcome.as_str(),
                    "Stream ended inside the HTML block, flushed partial page"
                );
            }
            Some(outcome @ ExtractionOutcome::NoBlock) => {
                warn!(
                    run_id = %run_id,
                    outcome = outcome.as_str(),
                    "Stream ended without an HTML block, nothing emitted"
                );
            }
            None => {}
        }
    });

    rx
}
