//! Configuration types for the GraphQL client.
//!
//! This module provides the immutable per-client [`ClientConfig`] (built with
//! [`ClientConfigBuilder`]) and the per-call [`RequestOptions`] overrides.
//!
//! # Example
//!
//! ```rust
//! use graphql_http_client::ClientConfig;
//!
//! let config = ClientConfig::builder("https://shop.example.com/graphql")
//!     .header("X-Custom-Header", "custom-value")
//!     .retries(2)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.retries(), 2);
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::error::{validate_retries, ClientError};
use crate::executor::RETRY_WAIT_TIME;

/// One or more values for a single header name.
///
/// Multiple values are joined with `", "` when the request is serialized,
/// so `["a", "b"]` is sent as `a, b`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderValues {
    /// A single header value.
    Single(String),
    /// Multiple values, comma-joined on the wire.
    Multiple(Vec<String>),
}

impl HeaderValues {
    /// Renders the value(s) as a single wire-level header value.
    #[must_use]
    pub fn to_wire_value(&self) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::Multiple(values) => values.join(", "),
        }
    }
}

impl From<&str> for HeaderValues {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for HeaderValues {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for HeaderValues {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

impl From<Vec<&str>> for HeaderValues {
    fn from(values: Vec<&str>) -> Self {
        Self::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Immutable configuration for a [`GraphqlClient`](crate::GraphqlClient).
///
/// Holds the default endpoint URL, default headers, and the default retry
/// budget. Per-call values in [`RequestOptions`] take precedence.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    url: String,
    headers: HashMap<String, HeaderValues>,
    retries: u32,
    retry_wait_time: Duration,
}

impl ClientConfig {
    /// Creates a new builder for the given default endpoint URL.
    #[must_use]
    pub fn builder(url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(url)
    }

    /// Returns the default endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the default headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, HeaderValues> {
        &self.headers
    }

    /// Returns the default retry budget.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    /// Returns the wait time between retry attempts.
    #[must_use]
    pub const fn retry_wait_time(&self) -> Duration {
        self.retry_wait_time
    }
}

/// Builder for [`ClientConfig`].
///
/// The retry budget is validated when [`build`](Self::build) runs, so an
/// out-of-range value never reaches the transport.
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
    url: String,
    headers: HashMap<String, HeaderValues>,
    retries: u32,
    retry_wait_time: Duration,
}

impl ClientConfigBuilder {
    fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            retries: 0,
            retry_wait_time: RETRY_WAIT_TIME,
        }
    }

    /// Adds a single default header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValues>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets all default headers at once.
    #[must_use]
    pub fn headers(mut self, headers: HashMap<String, HeaderValues>) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the default retry budget (additional attempts beyond the first).
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Overrides the wait between retry attempts.
    ///
    /// The default is one second. Intended for tests that exercise the retry
    /// loop without real-time sleeps.
    #[must_use]
    pub const fn retry_wait_time(mut self, wait: Duration) -> Self {
        self.retry_wait_time = wait;
        self
    }

    /// Builds the [`ClientConfig`], validating the retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRetries`] when `retries` is outside
    /// `[0, 3]`.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        validate_retries(self.retries)?;
        Ok(ClientConfig {
            url: self.url,
            headers: self.headers,
            retries: self.retries,
            retry_wait_time: self.retry_wait_time,
        })
    }
}

/// Per-call overrides for a single operation.
///
/// Every field is optional; absent fields fall back to the client defaults.
///
/// # Example
///
/// ```rust
/// use graphql_http_client::RequestOptions;
/// use serde_json::json;
///
/// let options = RequestOptions::new()
///     .variables(json!({ "id": "gid://shop/Product/123" }))
///     .retries(2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Variables for the operation, serialized under `"variables"`.
    pub variables: Option<Value>,
    /// Endpoint URL override.
    pub url: Option<String>,
    /// Headers merged over the client defaults; per-call values win.
    pub headers: Option<HashMap<String, HeaderValues>>,
    /// Retry budget override, validated per call.
    pub retries: Option<u32>,
}

impl RequestOptions {
    /// Creates an empty set of options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the operation variables.
    #[must_use]
    pub fn variables(mut self, variables: impl Into<Value>) -> Self {
        self.variables = Some(variables.into());
        self
    }

    /// Overrides the endpoint URL for this call.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds a single header override.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValues>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Overrides the retry budget for this call.
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }
}
