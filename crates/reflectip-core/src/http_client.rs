use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::header::HeaderValue;
use reqwest::Url;

use crate::config::DEFAULT_TIMEOUT_MS;
use crate::error::ValidationError;

/// User agent sent when `REFLECTIP_USER_AGENT` is unset.
pub const DEFAULT_USER_AGENT: &str = concat!("reflectip/", env!("CARGO_PKG_VERSION"));

/// Chunked response body. Consumers own it exclusively and drop it when done.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// GET request envelope used by provider queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Response head plus a body that has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    body: BodyStream,
}

impl HttpResponse {
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self { status, body }
    }

    /// Response whose body arrives as a single chunk.
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let chunk: Result<Bytes, HttpError> = Ok(body.into());
        Self::new(status, Box::pin(stream::iter([chunk])))
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub fn into_body(self) -> BodyStream {
        self.body
    }
}

impl Debug for HttpResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// What went wrong at the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Connect,
    Timeout,
    Status(u16),
    Body,
    Request,
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
    retryable: bool,
}

impl HttpError {
    pub fn connect(message: impl Into<String>) -> Self {
        Self {
            kind: HttpErrorKind::Connect,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: HttpErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            kind: HttpErrorKind::Status(status),
            message: format!("upstream returned status {status}"),
            retryable: status == 408 || status == 429 || status >= 500,
        }
    }

    pub fn body(message: impl Into<String>) -> Self {
        Self {
            kind: HttpErrorKind::Body,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self {
            kind: HttpErrorKind::Request,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// GET-capable transport used by the resolver.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production HTTP client backed by reqwest. Only https URLs are allowed.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    /// Fails when `user_agent` is not a valid header value or the TLS
    /// backend cannot be initialised.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, ValidationError> {
        let user_agent = header_value("user_agent", user_agent)?;
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .https_only(true)
            .build()
            .map_err(|e| ValidationError::HttpClient {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

/// Checks that `value` can be sent as an HTTP header value.
pub(crate) fn header_value(key: &'static str, value: &str) -> Result<HeaderValue, ValidationError> {
    HeaderValue::from_str(value).map_err(|_| ValidationError::InvalidConfig {
        key,
        value: value.to_owned(),
        reason: "must be a valid HTTP header value",
    })
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(&request.url)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::timeout(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::connect(format!("connection failed: {e}"))
                } else {
                    HttpError::request(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response.bytes_stream().map(|chunk| {
                chunk.map_err(|e| {
                    if e.is_timeout() {
                        HttpError::timeout(format!("timed out reading response body: {e}"))
                    } else {
                        HttpError::body(format!("failed to read response body: {e}"))
                    }
                })
            });

            Ok(HttpResponse::new(status, Box::pin(body)))
        })
    }
}

#[derive(Debug, Clone)]
enum CannedResponse {
    Body { status: u16, body: Bytes },
    Fault(HttpError),
}

/// Offline transport answering from a fixed URL table.
///
/// Unknown URLs fail with a connect error.
#[derive(Debug, Clone, Default)]
pub struct StaticHttpClient {
    responses: BTreeMap<String, CannedResponse>,
}

impl StaticHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(
        mut self,
        url: impl Into<String>,
        status: u16,
        body: impl Into<Bytes>,
    ) -> Self {
        self.responses.insert(
            normalize_url(url.into()),
            CannedResponse::Body {
                status,
                body: body.into(),
            },
        );
        self
    }

    pub fn with_fault(mut self, url: impl Into<String>, error: HttpError) -> Self {
        self.responses
            .insert(normalize_url(url.into()), CannedResponse::Fault(error));
        self
    }
}

impl HttpClient for StaticHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let url = normalize_url(request.url);
            match self.responses.get(&url) {
                Some(CannedResponse::Body { status, body }) => {
                    Ok(HttpResponse::from_bytes(*status, body.clone()))
                }
                Some(CannedResponse::Fault(error)) => Err(error.clone()),
                None => Err(HttpError::connect(format!("no canned response for {url}"))),
            }
        })
    }
}

fn normalize_url(url: String) -> String {
    match Url::parse(&url) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => url,
    }
}
