//! Error types and validation helpers for the GraphQL client.
//!
//! This module contains the client-level error taxonomy and the small
//! validation/formatting helpers shared by every entry point.
//!
//! # Error Handling
//!
//! Guard failures (`retries` out of range, `@defer` mismatch) surface as
//! [`ClientError`] values from the entry points. Failures that carry a usable
//! HTTP response are NOT errors at this level; they come back as an `errors`
//! block on the response value so callers keep access to whatever the API
//! returned.
//!
//! # Example
//!
//! ```rust
//! use graphql_http_client::{validate_retries, ClientError};
//!
//! let result = validate_retries(4);
//! assert!(matches!(result, Err(ClientError::InvalidRetries { retries: 4 })));
//! ```

use thiserror::Error;

/// Label prefixed to every user-visible message produced by this crate.
pub const CLIENT: &str = "GraphQL Client";

/// Maximum allowed value for the retry budget.
pub const MAX_RETRIES: u32 = 3;

/// Message used when a payload carried GraphQL errors.
pub(crate) const GQL_API_ERROR: &str =
    "An error occurred while fetching from the API. Review 'graphQLErrors' for details.";

/// Message used when a payload carried neither data nor errors.
pub(crate) const NO_DATA_OR_ERRORS_ERROR: &str =
    "An unknown error has occurred. The API did not return a data object or any errors in its response.";

/// Errors surfaced directly by the client entry points.
///
/// Each variant has a deterministic, test-matchable message starting with
/// the [`CLIENT`] label.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The `retries` value is outside `[0, 3]`.
    #[error("GraphQL Client: The provided \"retries\" value ({retries}) is invalid - it cannot be less than 0 or greater than 3")]
    InvalidRetries {
        /// The rejected value.
        retries: u32,
    },

    /// `request()` was called with an operation containing `@defer`.
    #[error("GraphQL Client: This operation will result in a streamable response — use the streaming entry point instead.")]
    DeferredOperation,

    /// `request_stream()` was called with an operation that does not
    /// contain `@defer`.
    #[error("GraphQL Client: This operation does not result in a streamable response")]
    NotDeferredOperation,

    /// Every transport attempt threw or aborted.
    ///
    /// The message begins with
    /// `GraphQL Client: Attempted maximum number of <n> network retries. Last message - `
    /// when a retry budget was configured, or wraps the underlying message
    /// directly when `retries` was 0.
    #[error("{message}")]
    NetworkExhausted {
        /// The formatted, label-prefixed failure message.
        message: String,
    },
}

/// Prepends the [`CLIENT`] label to a message unless it is already prefixed.
#[must_use]
pub fn format_error_message(message: &str) -> String {
    if message.starts_with(CLIENT) {
        message.to_string()
    } else {
        format!("{CLIENT}: {message}")
    }
}

/// Validates a retry budget, requiring it to lie in `[0, 3]`.
///
/// # Errors
///
/// Returns [`ClientError::InvalidRetries`] when the value is out of range.
pub fn validate_retries(retries: u32) -> Result<(), ClientError> {
    if retries > MAX_RETRIES {
        return Err(ClientError::InvalidRetries { retries });
    }
    Ok(())
}
