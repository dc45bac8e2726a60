//! # GraphQL HTTP Client
//!
//! An async client library for GraphQL-over-HTTP endpoints, providing a
//! retrying request executor, response classification, and incremental
//! delivery support for operations using the `@defer` directive.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - A pluggable HTTP transport seam ([`HttpTransport`]) with a
//!   reqwest-backed default ([`ReqwestTransport`])
//! - Bounded retries with a fixed backoff for aborted requests and
//!   transient status codes (429, 503)
//! - Structured request-lifecycle log events via the [`Logger`] sink
//! - A `multipart/mixed` stream parser and incremental merger that yields
//!   successive snapshots of a deferred response
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graphql_http_client::{ClientConfig, GraphqlClient, RequestOptions};
//! use serde_json::json;
//!
//! let config = ClientConfig::builder("https://shop.example.com/graphql")
//!     .header("X-Access-Token", "token")
//!     .retries(1)
//!     .build()?;
//! let client = GraphqlClient::new(config);
//!
//! // Single response
//! let response = client.request("query { shop { name } }", None).await?;
//!
//! // With variables and a per-call retry override
//! let options = RequestOptions::new()
//!     .variables(json!({ "id": "gid://shop/Product/123" }))
//!     .retries(2);
//! let response = client
//!     .request("query Product($id: ID!) { product(id: $id) { title } }", Some(options))
//!     .await?;
//! ```
//!
//! ## Streaming with `@defer`
//!
//! Operations containing the `@defer` directive must go through
//! [`GraphqlClient::request_stream`], which yields one snapshot per
//! incremental payload batch. Each snapshot carries the merged view of the
//! response so far and a `has_next` flag:
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//!
//! let mut stream = client
//!     .request_stream("query { shop { id ... @defer { name } } }", None)
//!     .await?;
//!
//! while let Some(snapshot) = stream.next().await {
//!     println!("merged so far: {:?}, more coming: {}", snapshot.data, snapshot.has_next);
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed
//!   explicitly
//! - **Fail-fast validation**: the retry budget is validated on every entry
//!   point before a request is made
//! - **Thread-safe**: the client is `Send + Sync`
//! - **Async-first**: designed for use with the Tokio async runtime
//! - **Errors as values**: failures that carry an HTTP response come back as
//!   an `errors` block on the response value, never as a panic

mod client;
pub mod config;
pub mod error;
mod executor;
pub mod logging;
pub mod response;
mod stream;
pub mod transport;

// Re-export public types at crate root for convenience
pub use client::{GraphqlClient, ResponseStream};
pub use config::{ClientConfig, ClientConfigBuilder, HeaderValues, RequestOptions};
pub use error::{format_error_message, validate_retries, ClientError, CLIENT, MAX_RETRIES};
pub use executor::{RETRIABLE_STATUS_CODES, RETRY_WAIT_TIME};
pub use logging::{LogEvent, Logger};
pub use response::{ClientResponse, ClientStreamResponse, ResponseErrors};
pub use transport::{
    HttpTransport, ReqwestTransport, RequestParams, ResponseBody, ResponseSummary, TransportError,
    TransportResponse,
};
