use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::transport::{HttpClient, HttpMethod, ReqwestHttpClient, SimpleHttpResponse};
use crate::auth::storage::TokenStore;
use crate::config::ApiConfig;
use crate::error::{DeskError, DeskResult};

/// REST client for the event management API.
///
/// Authorized calls read the token store once, when the request is
/// dispatched, and attach the access token as a bearer credential. A request
/// already in flight keeps the token it captured even if the session changes
/// underneath it; it is not retried or cancelled. The client only reports
/// failures: it never logs the user out or redirects.
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    tokens: Arc<dyn TokenStore>,
    root: String,
}

impl ApiClient {
    pub fn new(
        root: impl Into<String>,
        http: Arc<dyn HttpClient>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            http,
            tokens,
            root: root.into(),
        }
    }

    /// Build a reqwest-backed client from configuration
    pub fn from_config(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> DeskResult<Self> {
        let http = match config.request_timeout_seconds {
            Some(secs) => ReqwestHttpClient::with_timeout(Duration::from_secs(secs))
                .map_err(|e| DeskError::Config(e.to_string()))?,
            None => ReqwestHttpClient::new(),
        };
        Ok(Self::new(config.root_url.clone(), Arc::new(http), tokens))
    }

    /// The path is appended verbatim; no slashes are added or removed.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    pub async fn get_authorized(&self, path: &str) -> DeskResult<Value> {
        self.send(HttpMethod::GET, path, None, true).await
    }

    pub async fn post_authorized<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> DeskResult<Value> {
        let body = serde_json::to_string(body)?;
        self.send(HttpMethod::POST, path, Some(body), true).await
    }

    pub async fn put_authorized<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> DeskResult<Value> {
        let body = serde_json::to_string(body)?;
        self.send(HttpMethod::PUT, path, Some(body), true).await
    }

    pub async fn delete_authorized(&self, path: &str) -> DeskResult<Value> {
        self.send(HttpMethod::DELETE, path, None, true).await
    }

    /// Unauthenticated POST, used for login and registration only
    pub async fn post_unauthorized<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> DeskResult<Value> {
        let body = serde_json::to_string(body)?;
        self.send(HttpMethod::POST, path, Some(body), false).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> DeskResult<T> {
        decode(self.get_authorized(path).await?)
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> DeskResult<T> {
        decode(self.post_authorized(path, body).await?)
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> DeskResult<T> {
        decode(self.put_authorized(path, body).await?)
    }

    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        authorized: bool,
    ) -> DeskResult<Value> {
        let url = self.url(path);
        let request_id = Uuid::new_v4();

        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        if body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if authorized {
            // An empty store does not short-circuit: the server decides
            match self.tokens.get().await? {
                Some(tokens) => {
                    headers.insert(
                        "Authorization".to_string(),
                        format!("Bearer {}", tokens.access),
                    );
                }
                None => debug!(%request_id, path = path, "No access token, sending without credentials"),
            }
        }

        debug!(%request_id, method = method.as_str(), url = %url, "Sending request");

        let result = match (method, body) {
            (HttpMethod::GET, _) => self.http.get(&url, headers).await,
            (HttpMethod::DELETE, _) => self.http.delete(&url, headers).await,
            (HttpMethod::POST, body) => {
                self.http.post(&url, headers, body.unwrap_or_default()).await
            }
            (HttpMethod::PUT, body) => self.http.put(&url, headers, body.unwrap_or_default()).await,
        };

        let response = result.map_err(|e| {
            warn!(%request_id, url = %url, error = %e, "Request did not complete");
            DeskError::Network(e.to_string())
        })?;

        debug!(%request_id, status = response.status(), "Received response");
        interpret(response)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> DeskResult<T> {
    Ok(serde_json::from_value(value)?)
}

/// Map a response onto the error taxonomy, or parse the success body
fn interpret(response: SimpleHttpResponse) -> DeskResult<Value> {
    let status = response.status();

    if response.is_success() {
        let body = response.text();
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&body).map_err(|e| DeskError::Decode(e.to_string()));
    }

    let payload = serde_json::from_str::<Value>(response.body()).ok();
    let message = payload
        .as_ref()
        .and_then(error_message)
        .unwrap_or_else(|| format!("Request failed with status {}", status));

    if status == 401 || status == 403 {
        warn!(status = status, "Request rejected as unauthorized");
        return Err(DeskError::Auth { status, message });
    }

    Err(DeskError::Api {
        status,
        message,
        payload,
    })
}

/// Pull a readable message out of an error payload.
///
/// Looks at `detail`, then `error`, then the first field error.
fn error_message(payload: &Value) -> Option<String> {
    for key in ["detail", "error"] {
        if let Some(message) = payload.get(key).and_then(Value::as_str) {
            return Some(message.to_string());
        }
    }

    match payload {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => items.first().and_then(first_text),
        Value::Object(fields) => fields.iter().find_map(|(field, errors)| {
            first_text(errors).map(|text| format!("{}: {}", field, text))
        }),
        _ => None,
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(|item| item.as_str().map(str::to_string)),
        _ => None,
    }
}
