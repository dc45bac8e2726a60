//! GraphQL client façade.
//!
//! [`GraphqlClient`] exposes the three entry points over the retrying
//! executor:
//!
//! - [`fetch`](GraphqlClient::fetch) returns the raw HTTP response;
//! - [`request`](GraphqlClient::request) parses a single JSON response;
//! - [`request_stream`](GraphqlClient::request_stream) consumes an
//!   incrementally delivered `multipart/mixed` response for operations using
//!   the `@defer` directive.
//!
//! Defer detection is purely textual (a regex over the operation string);
//! callers rely on it being cheap and side-effect-free.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::BoxStream;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::config::{ClientConfig, RequestOptions};
use crate::error::{
    format_error_message, validate_retries, ClientError, GQL_API_ERROR, NO_DATA_OR_ERRORS_ERROR,
};
use crate::executor::RetryExecutor;
use crate::logging::Logger;
use crate::response::{ClientResponse, ClientStreamResponse, ResponseErrors};
use crate::stream::{multipart_response_stream, single_response_stream};
use crate::transport::{
    HttpTransport, ReqwestTransport, RequestParams, ResponseSummary, TransportResponse,
};

/// Textual `@defer` detection; not a GraphQL parse.
static DEFER_OPERATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)@\s*defer\b").unwrap());

const JSON_CONTENT_TYPE: &str = "application/json";
const MULTIPART_CONTENT_TYPE: &str = "multipart/mixed";

/// The async sequence of snapshots produced by
/// [`request_stream`](GraphqlClient::request_stream).
pub type ResponseStream = BoxStream<'static, ClientStreamResponse>;

/// Client for a GraphQL-over-HTTP endpoint.
///
/// # Thread Safety
///
/// `GraphqlClient` is `Send + Sync`, making it safe to share across async
/// tasks.
///
/// # Example
///
/// ```rust,ignore
/// use graphql_http_client::{ClientConfig, GraphqlClient};
///
/// let config = ClientConfig::builder("https://shop.example.com/graphql")
///     .header("X-Access-Token", "token")
///     .retries(2)
///     .build()?;
/// let client = GraphqlClient::new(config);
///
/// let response = client.request("query { shop { name } }", None).await?;
/// if let Some(data) = response.data {
///     println!("shop: {}", data["shop"]["name"]);
/// }
/// ```
pub struct GraphqlClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    logger: Option<Arc<dyn Logger>>,
}

// Verify GraphqlClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
};

impl GraphqlClient {
    /// Creates a client using the default [`ReqwestTransport`].
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created (see
    /// [`ReqwestTransport::new`]).
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: Arc::new(ReqwestTransport::new()),
            logger: None,
        }
    }

    /// Replaces the transport with a caller-supplied implementation.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Attaches a structured log sink. Absence of a logger is silent.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends the operation and returns the raw HTTP response.
    ///
    /// No parsing or classification happens beyond the retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRetries`] before any request is made
    /// when the effective retry budget is out of range, and
    /// [`ClientError::NetworkExhausted`] when every transport attempt
    /// aborted.
    pub async fn fetch(
        &self,
        operation: &str,
        options: Option<RequestOptions>,
    ) -> Result<TransportResponse, ClientError> {
        let options = options.unwrap_or_default();
        let (params, retries) = self.build_request_params(operation, &options)?;
        self.executor().execute(&params, retries).await
    }

    /// Executes a non-streaming operation and classifies the response.
    ///
    /// HTTP and GraphQL-level failures come back as the `errors` block on
    /// the returned [`ClientResponse`], keeping whatever `data` and
    /// `extensions` the API delivered.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DeferredOperation`] when the operation
    /// contains `@defer`, and [`ClientError::InvalidRetries`] when the
    /// retry budget is out of range. Neither case issues an HTTP request.
    pub async fn request(
        &self,
        operation: &str,
        options: Option<RequestOptions>,
    ) -> Result<ClientResponse, ClientError> {
        if DEFER_OPERATION_RE.is_match(operation) {
            return Err(ClientError::DeferredOperation);
        }

        let options = options.unwrap_or_default();
        let (params, retries) = self.build_request_params(operation, &options)?;

        match self.executor().execute(&params, retries).await {
            Ok(response) => Ok(process_response(response).await),
            Err(error) => Ok(ClientResponse {
                errors: Some(ResponseErrors::from_message(error.to_string())),
                ..ClientResponse::default()
            }),
        }
    }

    /// Executes a `@defer` operation and returns the snapshot stream.
    ///
    /// Each yielded [`ClientStreamResponse`] is the merged view of the
    /// response so far. Failures after the stream starts surface as one
    /// final snapshot carrying an `errors` block and `has_next: false`.
    /// Dropping the stream releases the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotDeferredOperation`] when the operation does
    /// not contain `@defer`; no HTTP request is made in that case.
    pub async fn request_stream(
        &self,
        operation: &str,
        options: Option<RequestOptions>,
    ) -> Result<ResponseStream, ClientError> {
        if !DEFER_OPERATION_RE.is_match(operation) {
            return Err(ClientError::NotDeferredOperation);
        }

        let options = options.unwrap_or_default();
        let (params, retries) = match self.build_request_params(operation, &options) {
            Ok(built) => built,
            // Once iteration is the error channel, validation failures
            // surface on the first yield instead of escaping here.
            Err(error) => return Ok(error_stream(None, error.to_string())),
        };

        let response = match self.executor().execute(&params, retries).await {
            Ok(response) => response,
            Err(error) => return Ok(error_stream(None, error.to_string())),
        };

        if !response.is_ok() {
            let message = format_error_message(&response.status_text);
            return Ok(error_stream(Some(response.status), message));
        }

        let content_type = response.content_type().unwrap_or_default().to_string();
        if content_type.contains(MULTIPART_CONTENT_TYPE) {
            return Ok(multipart_response_stream(response));
        }
        if content_type.contains(JSON_CONTENT_TYPE) {
            let processed = process_response(response).await;
            return Ok(single_response_stream(ClientStreamResponse {
                data: processed.data,
                errors: processed.errors,
                extensions: processed.extensions,
                has_next: false,
            }));
        }

        let status = response.status;
        let message =
            format_error_message(&format!("Response returned unexpected Content-Type: {content_type}"));
        Ok(error_stream(Some(status), message))
    }

    fn executor(&self) -> RetryExecutor {
        RetryExecutor::new(
            Arc::clone(&self.transport),
            self.logger.clone(),
            self.config.retry_wait_time(),
        )
    }

    /// Builds the wire-level request and resolves the effective retry
    /// budget, validating it before anything reaches the transport.
    fn build_request_params(
        &self,
        operation: &str,
        options: &RequestOptions,
    ) -> Result<(RequestParams, u32), ClientError> {
        let retries = options.retries.unwrap_or(self.config.retries());
        validate_retries(retries)?;

        let url = options
            .url
            .clone()
            .unwrap_or_else(|| self.config.url().to_string());

        let mut headers: HashMap<String, String> = HashMap::new();
        headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        headers.insert("Accept".to_string(), JSON_CONTENT_TYPE.to_string());
        for (name, value) in self.config.headers() {
            headers.insert(name.clone(), value.to_wire_value());
        }
        if let Some(overrides) = &options.headers {
            for (name, value) in overrides {
                headers.insert(name.clone(), value.to_wire_value());
            }
        }

        let mut body = Map::new();
        body.insert("query".to_string(), Value::String(operation.to_string()));
        if let Some(variables) = &options.variables {
            body.insert("variables".to_string(), variables.clone());
        }

        Ok((
            RequestParams {
                url,
                method: "POST".to_string(),
                headers,
                body: Value::Object(body).to_string(),
            },
            retries,
        ))
    }
}

/// Classifies and parses a raw response into a [`ClientResponse`].
async fn process_response(response: TransportResponse) -> ClientResponse {
    let status = response.status;
    let summary = response.summary();

    if !response.is_ok() {
        return error_response(status, format_error_message(&response.status_text), summary);
    }

    let content_type = response.content_type().unwrap_or_default().to_string();
    if !content_type.contains(JSON_CONTENT_TYPE) {
        return error_response(
            status,
            format_error_message(&format!(
                "Response returned unexpected Content-Type: {content_type}"
            )),
            summary,
        );
    }

    let text = match response.body.text().await {
        Ok(text) => text,
        Err(error) => {
            return error_response(status, format_error_message(&error.to_string()), summary)
        }
    };

    parse_json_payload(status, summary, &text)
}

fn parse_json_payload(status: u16, summary: ResponseSummary, text: &str) -> ClientResponse {
    let payload: Value = match serde_json::from_str(text) {
        Ok(payload) => payload,
        Err(error) => {
            return error_response(status, format_error_message(&error.to_string()), summary)
        }
    };

    let data = payload.get("data").filter(|v| !v.is_null()).cloned();
    let extensions = payload.get("extensions").filter(|v| !v.is_null()).cloned();
    let graphql_errors = payload
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
        .cloned();

    let errors = if graphql_errors.is_some() || data.is_none() {
        let message = if graphql_errors.is_some() {
            GQL_API_ERROR
        } else {
            NO_DATA_OR_ERRORS_ERROR
        };
        Some(ResponseErrors {
            network_status_code: Some(status),
            message: Some(format_error_message(message)),
            graphql_errors,
            response: Some(summary),
        })
    } else {
        None
    };

    ClientResponse {
        data,
        errors,
        extensions,
    }
}

fn error_response(status: u16, message: String, summary: ResponseSummary) -> ClientResponse {
    ClientResponse {
        errors: Some(ResponseErrors {
            network_status_code: Some(status),
            message: Some(message),
            graphql_errors: None,
            response: Some(summary),
        }),
        ..ClientResponse::default()
    }
}

/// A stream that yields one error snapshot and ends.
fn error_stream(status: Option<u16>, message: String) -> ResponseStream {
    single_response_stream(ClientStreamResponse {
        errors: Some(ResponseErrors {
            network_status_code: status,
            message: Some(message),
            graphql_errors: None,
            response: None,
        }),
        has_next: false,
        ..ClientStreamResponse::default()
    })
}
