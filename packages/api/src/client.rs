//! HTTP request helper.
//!
//! Every request goes to a configured base URL (the `/api` prefix of the
//! backend) with a default `Content-Type: application/json`. The helper
//! normalizes HTTP outcomes into [`ApiResponse`]:
//!
//! - non-2xx status → `ApiResponse::Backend(message)`, where the message is
//!   the `{"error": ...}` body if the backend sent one, else the status text
//! - 2xx with an empty or non-JSON body → `ApiResponse::Data(None)`
//! - 2xx with a JSON body → `ApiResponse::Data(Some(T))`
//!
//! Only transport-level failure (connection refused, bad URL, body
//! serialization) is an `Err`. Callers that want backend errors as `Err`
//! go through [`ApiResponse::into_result`].

use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// Outcome of a request, as reported by the backend.
///
/// HTTP-level failure is a value, not an `Err`; the helper only fails for
/// transport problems.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    /// 2xx response. `None` when the response carried no JSON body.
    Data(Option<T>),
    /// Non-2xx response, carrying the backend's error message.
    Backend(String),
}

impl<T> ApiResponse<T> {
    /// Convert a backend-reported error into an ordinary `Err`.
    ///
    /// This is the bridge the entity-storage client uses: transport and
    /// backend failures collapse into one error channel.
    pub fn into_result(self) -> Result<Option<T>, Error> {
        match self {
            ApiResponse::Data(data) => Ok(data),
            ApiResponse::Backend(message) => Err(Error::Backend(message)),
        }
    }

    pub fn is_backend_error(&self) -> bool {
        matches!(self, ApiResponse::Backend(_))
    }
}

/// Per-request options merged over the client defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<http::Method>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn method(mut self, method: http::Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Shape of the backend's error convention for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client bound to the backend API prefix.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    default_headers: Vec<(String, String)>,
}

impl ApiClient {
    /// Create a client for the given API base URL, e.g.
    /// `http://localhost:8080/api`.
    ///
    /// A default `Content-Type: application/json` header is sent with every
    /// request; per-request headers are merged on top and only displace it
    /// when set explicitly.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Self::builder(base_url, Client::builder())
    }

    /// Create a client with a per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        Self::builder(base_url, Client::builder().timeout(timeout))
    }

    fn builder(base_url: &str, builder: reqwest::ClientBuilder) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = builder.default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url,
            default_headers: Vec::new(),
        })
    }

    /// Add a header sent with every request, below per-request headers.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Resolve a path suffix against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    /// Issue a request and normalize the outcome.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, Error> {
        let url = self.endpoint(path)?;
        let method = options.method.unwrap_or(http::Method::GET);

        let mut request = self.client.request(method, url);
        for (name, value) in &self.default_headers {
            // Per-request headers win; skip a shadowed default entirely.
            let shadowed = options
                .headers
                .iter()
                .any(|(n, _)| n.eq_ignore_ascii_case(name));
            if !shadowed {
                request = request.header(name, value);
            }
        }
        for (name, value) in &options.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            // Prefer the backend's error body, fall back to the status text.
            let fallback = status.canonical_reason().unwrap_or("Unknown").to_string();
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => fallback,
            };
            return Ok(ApiResponse::Backend(message));
        }

        // Empty or non-JSON bodies are not parse errors, they are "no data".
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if content_length == Some("0") || !content_type.contains("application/json") {
            return Ok(ApiResponse::Data(None));
        }

        Ok(ApiResponse::Data(Some(response.json::<T>().await?)))
    }

    /// GET a path.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, Error> {
        self.fetch(path, RequestOptions::default()).await
    }

    /// POST a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, Error> {
        let options = RequestOptions::default()
            .method(http::Method::POST)
            .json_body(serde_json::to_value(body)?);
        self.fetch(path, options).await
    }

    /// PUT, with or without a JSON body. An absent body sends no body at
    /// all rather than a serialized null.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, Error> {
        let mut options = RequestOptions::default().method(http::Method::PUT);
        if let Some(body) = body {
            options = options.json_body(serde_json::to_value(body)?);
        }
        self.fetch(path, options).await
    }

    /// DELETE a path.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, Error> {
        self.fetch(path, RequestOptions::default().method(http::Method::DELETE))
            .await
    }

    /// POST a JSON body and stream the response as decoded text chunks.
    ///
    /// The stream is finite and non-restartable: one `String` per transport
    /// chunk, lossily UTF-8 decoded, until the body ends. Dropping the
    /// stream abandons the read. Fails up front when the status is not
    /// success; there is no retry.
    pub async fn stream<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<impl Stream<Item = Result<String, Error>>, Error> {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::stream(format!(
                "HTTP error! status: {}",
                status.as_u16()
            )));
        }

        Ok(response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(Error::from)
        }))
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying transport client, for requests outside the API prefix
    /// (e.g. static resources that do not follow the error-body convention).
    pub fn transport(&self) -> &Client {
        &self.client
    }
}
