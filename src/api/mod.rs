pub mod dto;
pub mod transport;

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::session::Session;

pub use dto::Page;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport};

/// Authenticated access to the backend REST API.
///
/// Every request carries the stored access token. A 401 triggers one
/// token refresh (shared between concurrent callers) and exactly one
/// retry; if that still fails the tokens are cleared and the caller gets
/// [`AppError::AuthenticationRequired`].
pub struct ApiClient {
    base: String,
    transport: Arc<dyn HttpTransport>,
    session: Session,
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(base: impl Into<String>, transport: Arc<dyn HttpTransport>, session: Session) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            transport,
            session,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// `{base}/api/{path}` without a trailing slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base, path.trim_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        let value = self.request(Method::Get, url, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post<T: DeserializeOwned>(&self, url: &str, body: &impl Serialize) -> Result<T, AppError> {
        let value = self.request(Method::Post, url, Some(serde_json::to_value(body)?)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn patch<T: DeserializeOwned>(&self, url: &str, body: &impl Serialize) -> Result<T, AppError> {
        let value = self.request(Method::Patch, url, Some(serde_json::to_value(body)?)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn put<T: DeserializeOwned>(&self, url: &str, body: &impl Serialize) -> Result<T, AppError> {
        let value = self.request(Method::Put, url, Some(serde_json::to_value(body)?)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        let value = self.request(Method::Delete, url, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Returns `Value::Null` for 204 and non-JSON responses.
    pub async fn request(&self, method: Method, url: &str, body: Option<Value>) -> Result<Value, AppError> {
        let token = self.session.access_token().await?;
        let response = self.send(method, url, body.clone(), token.clone()).await?;

        if response.status != 401 {
            return decode_response(response);
        }

        info!("Token expired, attempting refresh...");
        let fresh = self.refresh_after(token.as_deref()).await?;

        info!("Token refreshed, retrying {} {}", method, url);
        let retry = self.send(method, url, body, Some(fresh)).await?;
        if retry.status == 401 {
            warn!("request still unauthorized after refresh, clearing session");
            self.session.clear_tokens().await?;
            return Err(AppError::AuthenticationRequired);
        }

        decode_response(retry)
    }

    /// Follows `next` links and concatenates every page. Bare arrays and
    /// single objects are accepted as unpaginated responses.
    pub async fn fetch_all(&self, url: &str) -> Result<Vec<Value>, AppError> {
        let mut all = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(current) = next.take() {
            let response = self.request(Method::Get, &current, None).await?;
            match response {
                Value::Object(mut page) if page.contains_key("results") => {
                    if let Some(Value::Array(results)) = page.remove("results") {
                        all.extend(results);
                    }
                    next = page
                        .get("next")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string);
                }
                Value::Array(items) => all = items,
                Value::Null => {}
                other => all = vec![other],
            }
        }

        Ok(all)
    }

    /// One page of a list endpoint; unpaginated bodies become a single page.
    pub async fn fetch_page(&self, url: &str) -> Result<Page<Value>, AppError> {
        match self.request(Method::Get, url, None).await? {
            Value::Object(page) if page.contains_key("results") => {
                Ok(serde_json::from_value(Value::Object(page))?)
            }
            other => Ok(Page {
                results: results_of(other),
                ..Default::default()
            }),
        }
    }

    /// Like `fetch` on a list endpoint but tolerant of unpaginated bodies.
    pub async fn list_values(&self, url: &str) -> Result<Vec<Value>, AppError> {
        let value = self.request(Method::Get, url, None).await?;
        Ok(results_of(value))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), AppError> {
        let request = ApiRequest {
            method: Method::Post,
            url: format!("{}/", self.endpoint("token")),
            bearer: None,
            body: Some(serde_json::to_value(dto::LoginRequest { username, password })?),
        };
        let response = self.transport.send(&request).await?;
        let tokens: dto::TokenPair = serde_json::from_value(decode_response(response)?)?;
        self.session.set_tokens(&tokens.access, &tokens.refresh).await?;
        info!("logged in as {}", username);
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.session.clear_tokens().await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        bearer: Option<String>,
    ) -> Result<ApiResponse, AppError> {
        debug!("{} {}", method, url);
        let request = ApiRequest {
            method,
            url: url.to_string(),
            bearer,
            body,
        };
        self.transport.send(&request).await
    }

    /// Single-flight refresh: whoever takes the lock second sees the token
    /// the first caller stored and reuses it.
    async fn refresh_after(&self, stale: Option<&str>) -> Result<String, AppError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.session.access_token().await? {
            if Some(current.as_str()) != stale {
                debug!("token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let Some(refresh) = self.session.refresh_token().await? else {
            warn!("no refresh token stored, redirecting to login");
            self.session.clear_tokens().await?;
            return Err(AppError::AuthenticationRequired);
        };

        let request = ApiRequest {
            method: Method::Post,
            url: format!("{}/", self.endpoint("token/refresh")),
            bearer: None,
            body: Some(serde_json::to_value(dto::RefreshRequest { refresh: &refresh })?),
        };

        let refreshed = match self.transport.send(&request).await {
            Ok(response) if response.is_success() => {
                serde_json::from_str::<dto::AccessToken>(&response.body).ok()
            }
            Ok(response) => {
                warn!("Token refresh failed with status {}", response.status);
                None
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                None
            }
        };

        match refreshed {
            Some(token) => {
                self.session.set_access_token(&token.access).await?;
                Ok(token.access)
            }
            None => {
                self.session.clear_tokens().await?;
                Err(AppError::AuthenticationRequired)
            }
        }
    }
}

fn decode_response(response: ApiResponse) -> Result<Value, AppError> {
    if !response.is_success() {
        let detail = serde_json::from_str::<dto::ErrorBody>(&response.body)
            .ok()
            .and_then(|b| b.detail);
        let message = detail
            .or_else(|| {
                StatusCode::from_u16(response.status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Request failed".to_string());
        return Err(AppError::Http {
            status: response.status,
            message,
        });
    }

    if response.status == 204 || !response.is_json() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(&response.body)?)
}

/// `data.results || data` for list bodies.
pub fn results_of(value: Value) -> Vec<Value> {
    match value {
        Value::Object(mut page) if page.contains_key("results") => match page.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
