//! Retrying request executor.
//!
//! Wraps an [`HttpTransport`] with the bounded retry policy: transport
//! aborts and retriable status codes (429, 503) are re-attempted up to the
//! configured budget with a fixed wait between attempts, while every other
//! response is returned immediately.
//!
//! Failure surfacing is asymmetric: when the transport never produced a
//! response the executor fails with [`ClientError::NetworkExhausted`], but
//! when a retriable HTTP status exhausted the budget the last response is
//! returned so the caller can still inspect it.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{format_error_message, ClientError};
use crate::logging::{LogEvent, Logger};
use crate::transport::{HttpTransport, RequestParams, ResponseSummary, TransportResponse};

/// Fixed wait between retry attempts. No jitter, no exponential growth.
pub const RETRY_WAIT_TIME: Duration = Duration::from_millis(1000);

/// Status codes considered transient and retriable.
pub const RETRIABLE_STATUS_CODES: [u16; 2] = [429, 503];

/// Executes requests against a transport under the retry policy.
pub(crate) struct RetryExecutor {
    transport: Arc<dyn HttpTransport>,
    logger: Option<Arc<dyn Logger>>,
    wait_time: Duration,
}

impl RetryExecutor {
    pub(crate) fn new(
        transport: Arc<dyn HttpTransport>,
        logger: Option<Arc<dyn Logger>>,
        wait_time: Duration,
    ) -> Self {
        Self {
            transport,
            logger,
            wait_time,
        }
    }

    /// Runs the request with up to `max_retries` additional attempts.
    ///
    /// Returns the response for every HTTP outcome, including a 429/503 that
    /// exhausted the budget. Fails only when all attempts aborted before a
    /// response existed.
    pub(crate) async fn execute(
        &self,
        params: &RequestParams,
        max_retries: u32,
    ) -> Result<TransportResponse, ClientError> {
        let mut attempt: u32 = 1;
        loop {
            match self.transport.fetch(params).await {
                Ok(response) => {
                    if RETRIABLE_STATUS_CODES.contains(&response.status) {
                        if attempt <= max_retries {
                            tracing::debug!(
                                status = response.status,
                                attempt,
                                max_retries,
                                "retriable status received, retrying"
                            );
                            self.log_retry(params, Some(response.summary()), attempt, max_retries);
                            tokio::time::sleep(self.wait_time).await;
                            attempt += 1;
                            continue;
                        }
                        // Budget exhausted: hand the response back and let the
                        // caller translate it. No HTTP-Response event on this
                        // path, matching the observable log sequence.
                        return Ok(response);
                    }

                    self.log(LogEvent::HttpResponse {
                        request_params: params.clone(),
                        response: response.summary(),
                    });
                    return Ok(response);
                }
                Err(error) => {
                    if attempt <= max_retries {
                        tracing::debug!(%error, attempt, max_retries, "transport failed, retrying");
                        self.log_retry(params, None, attempt, max_retries);
                        tokio::time::sleep(self.wait_time).await;
                        attempt += 1;
                        continue;
                    }

                    let message = if max_retries > 0 {
                        format!(
                            "Attempted maximum number of {max_retries} network retries. Last message - {error}"
                        )
                    } else {
                        error.to_string()
                    };
                    return Err(ClientError::NetworkExhausted {
                        message: format_error_message(&message),
                    });
                }
            }
        }
    }

    fn log_retry(
        &self,
        params: &RequestParams,
        last_response: Option<ResponseSummary>,
        retry_attempt: u32,
        max_retries: u32,
    ) {
        self.log(LogEvent::HttpRetry {
            request_params: params.clone(),
            last_response,
            retry_attempt,
            max_retries,
        });
    }

    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            logger.log(event);
        }
    }
}
