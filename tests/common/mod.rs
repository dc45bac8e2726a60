//! Shared test helpers: a scripted transport and a recording logger.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

use graphql_http_client::{
    ClientConfig, GraphqlClient, HttpTransport, LogEvent, Logger, RequestParams, ResponseBody,
    TransportError, TransportResponse,
};

/// Wait between retries in tests; keeps the retry suites fast.
pub const TEST_RETRY_WAIT: Duration = Duration::from_millis(10);

/// One scripted transport outcome.
pub enum MockReply {
    Response {
        status: u16,
        status_text: &'static str,
        content_type: &'static str,
        body: MockBody,
    },
    Abort(&'static str),
}

/// Body shapes the mock can produce.
pub enum MockBody {
    /// Whole body in a single push chunk.
    Text(String),
    /// Push-style chunk sequence.
    Chunks(Vec<String>),
    /// Pull-style reader over the given text.
    Reader(String),
}

impl MockReply {
    pub fn json(status: u16, status_text: &'static str, body: &str) -> Self {
        Self::Response {
            status,
            status_text,
            content_type: "application/json",
            body: MockBody::Text(body.to_string()),
        }
    }

    pub fn multipart(chunks: Vec<String>) -> Self {
        Self::Response {
            status: 200,
            status_text: "OK",
            content_type: "multipart/mixed; boundary=graphql",
            body: MockBody::Chunks(chunks),
        }
    }
}

/// Transport that replays a scripted list of outcomes and records every
/// request it receives.
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RequestParams>>,
}

impl MockTransport {
    pub fn new(replies: Vec<MockReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Number of fetch calls made so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// All recorded requests, in order.
    pub fn requests(&self) -> Vec<RequestParams> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn fetch(&self, request: &RequestParams) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock transport ran out of scripted replies");

        match reply {
            MockReply::Abort(message) => Err(TransportError::Aborted {
                message: message.to_string(),
            }),
            MockReply::Response {
                status,
                status_text,
                content_type,
                body,
            } => {
                let mut headers = HashMap::new();
                if !content_type.is_empty() {
                    headers.insert("content-type".to_string(), content_type.to_string());
                }
                let body = match body {
                    MockBody::Text(text) => ResponseBody::from_text(text),
                    MockBody::Chunks(chunks) => ResponseBody::Chunks(
                        futures_util::stream::iter(
                            chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))),
                        )
                        .boxed(),
                    ),
                    MockBody::Reader(text) => {
                        ResponseBody::Reader(Box::new(std::io::Cursor::new(text.into_bytes())))
                    }
                };
                Ok(TransportResponse {
                    status,
                    status_text: status_text.to_string(),
                    headers,
                    body,
                })
            }
        }
    }
}

/// Logger that records events for later assertions.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, event: LogEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Builds a client over the given transport with a fast retry wait.
pub fn test_client(transport: Arc<MockTransport>, retries: u32) -> GraphqlClient {
    let config = ClientConfig::builder("https://shop.example.com/graphql")
        .retries(retries)
        .retry_wait_time(TEST_RETRY_WAIT)
        .build()
        .unwrap();
    GraphqlClient::new(config).with_transport(transport)
}
