use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use reqwest;

/// HTTP method enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
        }
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => http::Method::GET,
            HttpMethod::POST => http::Method::POST,
            HttpMethod::PUT => http::Method::PUT,
            HttpMethod::DELETE => http::Method::DELETE,
        }
    }
}

/// A very simple version that only holds response data
#[derive(Debug, Clone)]
pub struct SimpleHttpResponse {
    /// HTTP status code
    status_code: u16,
    /// Response body
    body: String,
    /// Response headers
    headers: HashMap<String, String>,
}

impl SimpleHttpResponse {
    /// Create a new response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status_code: status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status_code
    }

    /// Get a reference to the response body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Look up a header (names are lowercase)
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get the body as text (consumes the response)
    pub fn text(self) -> String {
        self.body
    }

    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Check if successful (2xx status)
    pub fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }
}

/// Trait for HTTP client operations, allowing for mocking.
///
/// An `Err` from any method means no response was received.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform HTTP GET request and return a SimpleHttpResponse
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<SimpleHttpResponse>;

    /// Perform HTTP POST request and return a SimpleHttpResponse
    async fn post(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: String,
    ) -> Result<SimpleHttpResponse>;

    /// Perform HTTP PUT request and return a SimpleHttpResponse
    async fn put(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: String,
    ) -> Result<SimpleHttpResponse>;

    /// Perform HTTP DELETE request and return a SimpleHttpResponse
    async fn delete(
        &self,
        url: &str,
        headers: HashMap<String, String>,
    ) -> Result<SimpleHttpResponse>;
}

/// Implementation of HttpClient using reqwest
pub struct ReqwestHttpClient {
    /// Internal reqwest client
    client: reqwest::Client,
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> Result<SimpleHttpResponse> {
        let mut request = self.client.request(method.into(), url);

        // Add headers
        for (key, value) in headers {
            request = request.header(key, value);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        // Send request
        let response = request.send().await?;

        // Convert to SimpleHttpResponse
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        let mut result = SimpleHttpResponse::new(status, body);
        if let Some(content_type) = content_type {
            result = result.with_header("content-type", content_type);
        }

        Ok(result)
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: HashMap<String, String>) -> Result<SimpleHttpResponse> {
        self.execute(HttpMethod::GET, url, headers, None).await
    }

    async fn post(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: String,
    ) -> Result<SimpleHttpResponse> {
        self.execute(HttpMethod::POST, url, headers, Some(body)).await
    }

    async fn put(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: String,
    ) -> Result<SimpleHttpResponse> {
        self.execute(HttpMethod::PUT, url, headers, Some(body)).await
    }

    async fn delete(
        &self,
        url: &str,
        headers: HashMap<String, String>,
    ) -> Result<SimpleHttpResponse> {
        self.execute(HttpMethod::DELETE, url, headers, None).await
    }
}

/// Mock implementation of HttpClient for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// A request the mock received
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: HttpMethod,
        pub url: String,
        pub headers: HashMap<String, String>,
        pub body: Option<String>,
    }

    impl RecordedRequest {
        pub fn header(&self, key: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str())
        }

        pub fn json_body(&self) -> serde_json::Value {
            self.body
                .as_deref()
                .and_then(|b| serde_json::from_str(b).ok())
                .unwrap_or(serde_json::Value::Null)
        }
    }

    #[derive(Debug, Clone)]
    enum MockReply {
        Respond(SimpleHttpResponse),
        Unreachable,
    }

    /// A mock HTTP client that returns predefined responses
    #[derive(Default)]
    pub struct MockHttpClient {
        /// Map of (method, URL) to replies
        responses: Arc<Mutex<HashMap<(HttpMethod, String), MockReply>>>,
        /// Record of requests made
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl MockHttpClient {
        /// Create a new mock client
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a mock response for a method and URL
        pub fn mock_response(
            &self,
            method: HttpMethod,
            url: impl Into<String>,
            status: u16,
            body: impl Into<String>,
        ) {
            let response = SimpleHttpResponse::new(status, body);
            self.responses
                .lock()
                .unwrap()
                .insert((method, url.into()), MockReply::Respond(response));
        }

        /// Register a JSON response
        pub fn mock_json<T: serde::Serialize>(
            &self,
            method: HttpMethod,
            url: impl Into<String>,
            status: u16,
            data: &T,
        ) {
            let body = serde_json::to_string(data).unwrap();
            let response = SimpleHttpResponse::new(status, body)
                .with_header("content-type", "application/json");
            self.responses
                .lock()
                .unwrap()
                .insert((method, url.into()), MockReply::Respond(response));
        }

        /// Make a URL fail as if the server could not be reached
        pub fn mock_unreachable(&self, method: HttpMethod, url: impl Into<String>) {
            self.responses
                .lock()
                .unwrap()
                .insert((method, url.into()), MockReply::Unreachable);
        }

        /// Get the list of recorded requests
        pub fn get_requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn reply(
            &self,
            method: HttpMethod,
            url: &str,
            headers: HashMap<String, String>,
            body: Option<String>,
        ) -> Result<SimpleHttpResponse> {
            self.requests.lock().unwrap().push(RecordedRequest {
                method,
                url: url.to_string(),
                headers,
                body,
            });

            let responses = self.responses.lock().unwrap();
            match responses.get(&(method, url.to_string())) {
                Some(MockReply::Respond(response)) => Ok(response.clone()),
                Some(MockReply::Unreachable) => {
                    Err(anyhow::anyhow!("connection refused: {}", url))
                }
                None => Err(anyhow::anyhow!(
                    "No mock response configured for {} {}",
                    method.as_str(),
                    url
                )),
            }
        }
    }

    #[async_trait::async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(
            &self,
            url: &str,
            headers: HashMap<String, String>,
        ) -> Result<SimpleHttpResponse> {
            self.reply(HttpMethod::GET, url, headers, None)
        }

        async fn post(
            &self,
            url: &str,
            headers: HashMap<String, String>,
            body: String,
        ) -> Result<SimpleHttpResponse> {
            self.reply(HttpMethod::POST, url, headers, Some(body))
        }

        async fn put(
            &self,
            url: &str,
            headers: HashMap<String, String>,
            body: String,
        ) -> Result<SimpleHttpResponse> {
            self.reply(HttpMethod::PUT, url, headers, Some(body))
        }

        async fn delete(
            &self,
            url: &str,
            headers: HashMap<String, String>,
        ) -> Result<SimpleHttpResponse> {
            self.reply(HttpMethod::DELETE, url, headers, None)
        }
    }
}
