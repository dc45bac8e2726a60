//! Incremental response stream pipeline.
//!
//! Turns a `multipart/mixed` [`TransportResponse`] into an async sequence of
//! [`ClientStreamResponse`] snapshots: body chunks are decoded to text,
//! framed on the declared boundary, parsed as JSON payloads, and merged into
//! a growing result tree. One snapshot is yielded per completed batch.
//!
//! Any failure inside the pipeline yields exactly one final snapshot that
//! carries the data merged so far plus an `errors` block, then the stream
//! ends. Dropping the stream releases the underlying body.

mod merge;
mod multipart;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use crate::error::format_error_message;
use crate::response::ClientStreamResponse;
use crate::transport::{TransportError, TransportResponse};

use merge::IncrementalAccumulator;
use multipart::{boundary_from_content_type, MultipartParser};

struct StreamState {
    chunks: BoxStream<'static, Result<String, TransportError>>,
    parser: MultipartParser,
    accumulator: IncrementalAccumulator,
    finished: bool,
}

/// Builds the snapshot stream for a `multipart/mixed` response.
pub(crate) fn multipart_response_stream(
    response: TransportResponse,
) -> BoxStream<'static, ClientStreamResponse> {
    let boundary = boundary_from_content_type(response.content_type().unwrap_or_default());
    let state = StreamState {
        chunks: response.body.text_chunks(),
        parser: MultipartParser::new(boundary),
        accumulator: IncrementalAccumulator::new(response.status),
        finished: false,
    };

    futures_util::stream::unfold(state, next_snapshot).boxed()
}

/// Yields a single-element stream, used for the non-multipart branches of
/// `request_stream`.
pub(crate) fn single_response_stream(
    snapshot: ClientStreamResponse,
) -> BoxStream<'static, ClientStreamResponse> {
    futures_util::stream::iter(std::iter::once(snapshot)).boxed()
}

async fn next_snapshot(
    mut state: StreamState,
) -> Option<(ClientStreamResponse, StreamState)> {
    if state.finished {
        return None;
    }

    loop {
        match state.chunks.next().await {
            Some(Ok(chunk)) => {
                let parts = state.parser.feed(&chunk);
                if parts.is_empty() {
                    continue;
                }
                match state.accumulator.apply_batch(&parts) {
                    Ok(snapshot) => return Some((snapshot, state)),
                    Err(snapshot) => {
                        state.finished = true;
                        return Some((snapshot, state));
                    }
                }
            }
            Some(Err(error)) => {
                state.finished = true;
                let snapshot = state.accumulator.error_snapshot(
                    format_error_message(&format!(
                        "Error occured while processing stream payload - {error}"
                    )),
                    None,
                );
                return Some((snapshot, state));
            }
            None => {
                state.finished = true;
                if state.accumulator.has_next() {
                    let snapshot = state.accumulator.error_snapshot(
                        format_error_message("Response stream terminated unexpectedly"),
                        None,
                    );
                    return Some((snapshot, state));
                }
                return None;
            }
        }
    }
}
