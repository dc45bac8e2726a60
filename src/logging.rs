//! Structured log events emitted by the retry executor.
//!
//! Callers can observe the request lifecycle by supplying a [`Logger`] sink;
//! absence of a logger is silent. Ambient diagnostics additionally go
//! through `tracing` at debug level.

use serde::Serialize;

use crate::transport::{RequestParams, ResponseSummary};

/// A sink for client log events.
///
/// Implementations must be cheap and non-blocking; the executor calls them
/// inline on the request path.
pub trait Logger: Send + Sync {
    /// Receives one event.
    fn log(&self, event: LogEvent);
}

/// Events emitted while executing a request.
///
/// For a given request the order is: zero or more `HttpRetry` events,
/// then at most one `HttpResponse` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "content")]
pub enum LogEvent {
    /// A response was ultimately returned to the caller.
    #[serde(rename = "HTTP-Response")]
    #[serde(rename_all = "camelCase")]
    HttpResponse {
        /// The serialized request that produced the response.
        request_params: RequestParams,
        /// Bodyless view of the response.
        response: ResponseSummary,
    },

    /// An attempt failed and the executor is about to retry.
    #[serde(rename = "HTTP-Retry")]
    #[serde(rename_all = "camelCase")]
    HttpRetry {
        /// The serialized request being retried.
        request_params: RequestParams,
        /// The failed response, when the attempt produced one. `None` when
        /// the transport aborted before any response existed.
        last_response: Option<ResponseSummary>,
        /// 1-based number of the attempt that just failed.
        retry_attempt: u32,
        /// The configured retry budget.
        max_retries: u32,
    },
}
