//! HTTP transport
//!
//! [`RestTransport`] is the seam the resource APIs are written against;
//! [`RestClient`] implements it over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use bot_common::{BotToken, RestConfig};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RestError;

/// JSON request/response transport
#[async_trait]
pub trait RestTransport: Send + Sync {
    /// Send a request to `path` (relative to the API base) and decode the reply
    ///
    /// Empty bodies (204 No Content) come back as `Value::Null`.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, RestError>;

    async fn get(&self, path: &str) -> Result<Value, RestError> {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, RestError> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value, RestError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value, RestError> {
        self.request(Method::DELETE, path, None).await
    }
}

/// Error body returned by the API on failure
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

/// `reqwest`-backed REST client
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Build a client authenticated with `token`
    pub fn new(config: &RestConfig, token: &BotToken) -> Result<Self, RestError> {
        Self::with_options(
            &config.base_url,
            token,
            &config.user_agent,
            config.timeout(),
        )
    }

    pub fn with_options(
        base_url: &str,
        token: &BotToken,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, RestError> {
        let mut auth = HeaderValue::from_str(&token.authorization_header())
            .map_err(|_| RestError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl RestTransport for RestClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, RestError> {
        debug!(%method, path, "REST request");

        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, path, "REST request rejected: unauthorized");
            return Err(RestError::Unauthorized);
        }

        if !status.is_success() {
            let parsed: Option<ApiErrorBody> = serde_json::from_slice(&bytes).ok();
            let (code, message) = match parsed {
                Some(body) => (
                    body.code,
                    body.message
                        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
                ),
                None => (None, String::from_utf8_lossy(&bytes).into_owned()),
            };
            warn!(%method, path, status = status.as_u16(), ?code, %message, "REST request failed");
            return Err(RestError::Status {
                status: status.as_u16(),
                code,
                message,
            });
        }

        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}
