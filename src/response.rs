//! Response value types returned by the client entry points.
//!
//! [`ClientResponse`] is produced by `request()`; [`ClientStreamResponse`]
//! snapshots are yielded by `request_stream()`. Both serialize with
//! camelCase field names matching the GraphQL-over-HTTP wire shapes.

use serde::Serialize;
use serde_json::Value;

use crate::transport::ResponseSummary;

/// The processed result of a single (non-streamed) GraphQL request.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    /// The `data` tree from the response payload, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Populated when anything went wrong: transport exhaustion, HTTP
    /// failure, unexpected content type, or GraphQL-level errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ResponseErrors>,

    /// The `extensions` object from the response payload, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// One snapshot of an incrementally delivered response.
///
/// Each snapshot carries the full merged view so far; `has_next` indicates
/// whether the server intends to deliver more.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStreamResponse {
    /// The merged `data` tree so far, when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Populated on the final snapshot when the stream failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ResponseErrors>,

    /// The most recent non-empty `extensions` object seen, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,

    /// Whether more incremental payloads are expected.
    pub has_next: bool,
}

/// Details of a failed request or stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseErrors {
    /// HTTP status code of the response, when one was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_status_code: Option<u16>,

    /// Label-prefixed, deterministic failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// GraphQL error objects collected from the payload(s).
    #[serde(rename = "graphQLErrors")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphql_errors: Option<Vec<Value>>,

    /// Bodyless view of the HTTP response, when one was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSummary>,
}

impl ResponseErrors {
    /// Builds an errors block carrying only a message.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }
}
