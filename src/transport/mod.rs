//! HTTP transport abstraction for the GraphQL client.
//!
//! The client talks to the network through the [`HttpTransport`] trait, so a
//! host environment can supply its own fetch implementation. The default
//! implementation, [`ReqwestTransport`], wraps a [`reqwest::Client`].
//!
//! A transport receives fully-serialized [`RequestParams`] and produces a
//! [`TransportResponse`] whose body is one of the two shapes described in
//! [`ResponseBody`]. Everything above this seam is shape-agnostic.

mod body;

pub use body::ResponseBody;

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use serde::Serialize;
use thiserror::Error;

/// A serialized GraphQL HTTP request, ready for the wire.
///
/// Header values are already flattened: list-valued headers were joined with
/// `", "` during request construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequestParams {
    /// Target endpoint URL.
    pub url: String,
    /// HTTP method; the client always issues `POST`.
    pub method: String,
    /// Flat header map.
    pub headers: HashMap<String, String>,
    /// JSON body: `{"query": ..., "variables": ...?}`.
    pub body: String,
}

/// Failures raised by a transport before a usable response exists.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request was aborted before a response arrived.
    #[error("{message}")]
    Aborted {
        /// Description of the abort.
        message: String,
    },

    /// Network or protocol error from the underlying HTTP stack.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O failure while reading a response body.
    #[error("{0}")]
    Body(#[from] std::io::Error),
}

/// A lightweight, cloneable view of a response without its body.
///
/// Used for log events and error blocks; the body itself is consumed exactly
/// once by the caller or the stream pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    /// HTTP status code.
    pub status: u16,
    /// HTTP reason phrase (e.g. `Service Unavailable`).
    pub status_text: String,
    /// Flat response headers with lowercase names.
    pub headers: HashMap<String, String>,
}

/// An HTTP response as seen by the client core.
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// HTTP reason phrase.
    pub status_text: String,
    /// Flat response headers with lowercase names; multiple values for one
    /// name are joined with `", "`.
    pub headers: HashMap<String, String>,
    /// The response body in one of the two supported shapes.
    pub body: ResponseBody,
}

impl TransportResponse {
    /// Returns `true` if the status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns the `content-type` header value, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Builds a bodyless [`ResponseSummary`] for logging and error blocks.
    #[must_use]
    pub fn summary(&self) -> ResponseSummary {
        ResponseSummary {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
        }
    }
}

/// Abstract HTTP transport supplied by the host environment.
///
/// Implementations must issue exactly one HTTP request per `fetch` call;
/// the retry policy lives above this seam.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and resolves with the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no usable response was produced
    /// (abort, connection failure). Non-2xx responses are NOT errors here.
    async fn fetch(&self, request: &RequestParams) -> Result<TransportResponse, TransportError>;
}

/// Default transport backed by [`reqwest::Client`].
///
/// Response bodies surface as push-style chunk streams
/// ([`ResponseBody::Chunks`]).
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

// Verify ReqwestTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
};

impl ReqwestTransport {
    /// Creates a transport with a fresh `reqwest` client.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS
    /// initialization failure).
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Creates a transport reusing an existing `reqwest` client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Flattens a reqwest header map into lowercase name/value pairs,
    /// joining repeated names with `", "`.
    fn flatten_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        let mut result: HashMap<String, String> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            match result.get_mut(&key) {
                Some(existing) => {
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
                None => {
                    result.insert(key, value);
                }
            }
        }
        result
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn fetch(&self, request: &RequestParams) -> Result<TransportResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .unwrap_or(reqwest::Method::POST);
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(request.body.clone()).send().await?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string();
        let headers = Self::flatten_headers(response.headers());
        let body = ResponseBody::Chunks(
            response
                .bytes_stream()
                .map_err(TransportError::from)
                .boxed(),
        );

        Ok(TransportResponse {
            status,
            status_text,
            headers,
            body,
        })
    }
}
