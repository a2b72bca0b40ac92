// SPDX-License-Identifier: MPL-2.0
//! `reqwest` client wrapper that reports every exchange to an
//! [`HttpInstrumentor`].
//!
//! Non-2xx responses are logged as failures but still returned as `Ok`;
//! transport errors are logged and returned unchanged. The body of a non-2xx
//! response is buffered so it can be logged, and the caller receives an
//! equivalent response that reads from that buffer. Successful bodies are
//! left untouched.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Request, RequestBuilder, Response, ResponseBuilderExt, Url};
use serde_json::{Map, Value};

use super::http::{HttpFailure, HttpInstrumentor};
use crate::config::DEFAULT_HTTP_TIMEOUT_SECS;

#[derive(Debug, Clone)]
pub struct InstrumentedClient {
    client: Client,
    instrumentor: HttpInstrumentor,
    /// Headers the wrapped client adds to every request.
    default_headers: HeaderMap,
    base_url: Option<String>,
    parsed_base: Option<Url>,
}

impl InstrumentedClient {
    /// Wraps an existing client.
    ///
    /// Its default headers are unknown here, so logged request headers only
    /// show what each request sets itself.
    #[must_use]
    pub fn new(client: Client, instrumentor: HttpInstrumentor) -> Self {
        Self {
            client,
            instrumentor,
            default_headers: HeaderMap::new(),
            base_url: None,
            parsed_base: None,
        }
    }

    /// Builds a client with a JSON content type and the given timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_timeout(
        instrumentor: HttpInstrumentor,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers.clone())
            .build()?;
        Ok(Self {
            default_headers: headers,
            ..Self::new(client, instrumentor)
        })
    }

    /// Same as [`InstrumentedClient::with_timeout`] with a 30 second timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_defaults(instrumentor: HttpInstrumentor) -> Result<Self, reqwest::Error> {
        Self::with_timeout(instrumentor, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Resolves relative request paths against `base_url`.
    ///
    /// Logged URLs are shown relative to the base, as the caller wrote them.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        self.parsed_base = match Url::parse(&base_url) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!(error = %err, base_url = %base_url, "base URL does not parse, logging absolute URLs");
                None
            }
        };
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn instrumentor(&self) -> &HttpInstrumentor {
        &self.instrumentor
    }

    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    // =========================================================================
    // Request Building
    // =========================================================================

    /// Starts a request. Send it with [`InstrumentedClient::send`].
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, self.resolve(url))
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    fn resolve(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !url.contains("://") => {
                format!("{base}/{}", url.trim_start_matches('/'))
            }
            _ => url.to_string(),
        }
    }

    /// Shows `url` relative to the base when both share an origin and the
    /// base path. Both sides are normalized, so host case and explicit
    /// default ports do not matter.
    fn display_url(&self, url: &Url) -> String {
        let Some(base) = &self.parsed_base else {
            return url.to_string();
        };
        let same_origin = base.scheme() == url.scheme()
            && base.host_str() == url.host_str()
            && base.port_or_known_default() == url.port_or_known_default();
        if !same_origin {
            return url.to_string();
        }

        let base_path = base.path().trim_end_matches('/');
        match url
            .path()
            .strip_prefix(base_path)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        {
            Some(rest) => match url.query() {
                Some(query) => format!("{rest}?{query}"),
                None => rest.to_string(),
            },
            None => url.to_string(),
        }
    }

    /// Request headers as sent, including the client defaults the request
    /// does not override.
    fn outgoing_headers(&self, request: &Request) -> HeaderMap {
        let mut headers = request.headers().clone();
        for (name, value) in &self.default_headers {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        headers
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Builds and sends `builder`.
    ///
    /// # Errors
    ///
    /// Returns the builder or transport error unchanged after recording it.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, reqwest::Error> {
        match builder.build() {
            Ok(request) => self.execute(request).await,
            Err(err) => {
                self.instrumentor.on_request_error(&err);
                Err(err)
            }
        }
    }

    /// Sends a built request.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged after recording it. A non-2xx
    /// response whose body cannot be read is reported as that read error.
    pub async fn execute(&self, request: Request) -> Result<Response, reqwest::Error> {
        let url = self.display_url(request.url());
        let headers = headers_to_json(&self.outgoing_headers(&request));
        let context = self
            .instrumentor
            .on_request(request.method().as_str(), &url, headers);

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                self.instrumentor
                    .on_failure(Some(&context), transport_failure(&err));
                return Err(err);
            }
        };

        let status = response.status();
        if status.is_success() {
            self.instrumentor.on_response(
                &context,
                status.as_u16(),
                headers_to_json(response.headers()),
            );
            return Ok(response);
        }

        match buffer_body(response).await {
            Ok((response, body)) => {
                let mut failure = HttpFailure::status(status.as_u16());
                if let Some(body) = body {
                    failure = failure.with_response(body);
                }
                self.instrumentor.on_failure(Some(&context), failure);
                Ok(response)
            }
            Err(err) => {
                let mut failure = transport_failure(&err);
                failure.status = Some(status.as_u16());
                self.instrumentor.on_failure(Some(&context), failure);
                Err(err)
            }
        }
    }
}

fn transport_failure(err: &reqwest::Error) -> HttpFailure {
    let mut failure = HttpFailure::transport(err);
    failure.status = err.status().map(|status| status.as_u16());
    failure
}

/// Reads the whole body and returns a response serving the same status,
/// version, headers, URL and bytes, plus the body as JSON (or as text when
/// it is not JSON). An empty body yields `None`.
async fn buffer_body(response: Response) -> Result<(Response, Option<Value>), reqwest::Error> {
    let status = response.status();
    let version = response.version();
    let url = response.url().clone();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    let logged = if body.is_empty() {
        None
    } else {
        Some(
            serde_json::from_slice::<Value>(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())),
        )
    };

    let mut builder = http::Response::builder()
        .status(status)
        .version(version)
        .url(url);
    if let Some(slot) = builder.headers_mut() {
        *slot = headers;
    }
    let rebuilt = match builder.body(body.clone()) {
        Ok(rebuilt) => rebuilt,
        Err(err) => {
            tracing::warn!(error = %err, "failed to rebuild buffered response, keeping status only");
            let mut fallback = http::Response::new(body);
            *fallback.status_mut() = status;
            fallback
        }
    };
    Ok((Response::from(rebuilt), logged))
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::LogStore;
    use std::sync::Arc;

    fn client() -> InstrumentedClient {
        let instrumentor = HttpInstrumentor::new(Arc::new(LogStore::in_memory()));
        InstrumentedClient::with_defaults(instrumentor).expect("client should build")
    }

    #[test]
    fn relative_paths_join_base_url() {
        let client = client().with_base_url("http://localhost:8080/api/");

        assert_eq!(client.resolve("/users"), "http://localhost:8080/api/users");
        assert_eq!(client.resolve("users"), "http://localhost:8080/api/users");
        assert_eq!(client.resolve("https://other.test/x"), "https://other.test/x");
    }

    #[test]
    fn paths_without_base_are_unchanged() {
        assert_eq!(client().resolve("/users"), "/users");
    }

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("test URL should parse")
    }

    #[test]
    fn display_url_strips_base() {
        let client = client().with_base_url("http://localhost:8080");

        assert_eq!(client.display_url(&url("http://localhost:8080/x?y=1")), "/x?y=1");
        assert_eq!(
            client.display_url(&url("http://localhost:8081/x")),
            "http://localhost:8081/x"
        );
        assert_eq!(
            client.display_url(&url("https://other.test/x")),
            "https://other.test/x"
        );
    }

    #[test]
    fn display_url_compares_normalized_base() {
        let upper = client().with_base_url("http://LOCALHOST/api");
        assert_eq!(upper.display_url(&url("http://localhost/api/x")), "/x");

        let explicit_port = client().with_base_url("http://localhost:80");
        assert_eq!(explicit_port.display_url(&url("http://localhost/x")), "/x");
    }

    #[test]
    fn display_url_requires_base_path_boundary() {
        let client = client().with_base_url("http://localhost/api");

        assert_eq!(
            client.display_url(&url("http://localhost/apix")),
            "http://localhost/apix"
        );
        assert_eq!(
            client.display_url(&url("http://localhost/other")),
            "http://localhost/other"
        );
    }

    #[test]
    fn outgoing_headers_include_client_defaults() {
        let client = client();
        let request = client
            .get("http://localhost/x")
            .header("x-trace", "abc")
            .build()
            .expect("request should build");

        let headers = headers_to_json(&client.outgoing_headers(&request));

        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["x-trace"], "abc");
    }

    #[test]
    fn request_headers_override_client_defaults() {
        let client = client();
        let request = client
            .post("http://localhost/x")
            .header(CONTENT_TYPE, "text/plain")
            .build()
            .expect("request should build");

        let headers = client.outgoing_headers(&request);

        assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn headers_become_json_object() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let json = headers_to_json(&headers);

        assert_eq!(json["content-type"], "application/json");
    }
}
