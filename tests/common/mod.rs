#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use faculty_admin::api::{ApiClient, ApiRequest, ApiResponse, HttpTransport, Method};
use faculty_admin::error::AppError;
use faculty_admin::session::Session;
use serde_json::{Value, json};

pub const BASE: &str = "http://backend";

struct Rule {
    method: Method,
    url: String,
    prefix: bool,
    bearer: Option<String>,
    responses: VecDeque<ApiResponse>,
}

impl Rule {
    fn matches(&self, request: &ApiRequest) -> bool {
        let url_ok = if self.prefix {
            request.url.starts_with(&self.url)
        } else {
            request.url == self.url
        };
        let bearer_ok = match &self.bearer {
            Some(expected) => request.bearer.as_deref() == Some(expected.as_str()),
            None => true,
        };
        self.method == request.method && url_ok && bearer_ok
    }
}

/// Fake backend: answers from scripted rules and records every request.
/// The last queued response of a rule is repeated; unmatched requests get
/// `200 []`.
#[derive(Default)]
pub struct ScriptedTransport {
    rules: Mutex<Vec<Rule>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: Method, url: &str, prefix: bool, bearer: Option<&str>, responses: Vec<ApiResponse>) {
        self.rules.lock().unwrap().push(Rule {
            method,
            url: url.to_string(),
            prefix,
            bearer: bearer.map(str::to_string),
            responses: responses.into(),
        });
    }

    pub fn on(&self, method: Method, url: &str, status: u16, body: Value) {
        self.push(method, url, false, None, vec![json_response(status, body)]);
    }

    pub fn on_prefix(&self, method: Method, url: &str, status: u16, body: Value) {
        self.push(method, url, true, None, vec![json_response(status, body)]);
    }

    pub fn on_with_token(&self, method: Method, url: &str, token: &str, status: u16, body: Value) {
        self.push(method, url, false, Some(token), vec![json_response(status, body)]);
    }

    pub fn on_sequence(&self, method: Method, url: &str, responses: Vec<(u16, Value)>) {
        let responses = responses
            .into_iter()
            .map(|(status, body)| json_response(status, body))
            .collect();
        self.push(method, url, false, None, responses);
    }

    /// Every `methods` call answers 401 and so does the token refresh, the
    /// way a backend behaves once the refresh token has expired too.
    pub fn expire_session(&self, methods: &[Method]) {
        let rejected = json!({"detail": "Given token not valid for any token type"});
        for method in methods {
            self.on_prefix(*method, BASE, 401, rejected.clone());
        }
        self.on(Method::Post, &format!("{}/", url("token/refresh")), 401, rejected);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, url_prefix: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url.starts_with(url_prefix))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        // give concurrent callers a chance to interleave
        tokio::task::yield_now().await;

        let mut rules = self.rules.lock().unwrap();
        let found = rules.iter_mut().rev().find(|rule| rule.matches(request));
        let response = match found {
            Some(rule) if rule.responses.len() > 1 => rule.responses.pop_front(),
            Some(rule) => rule.responses.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| json_response(200, json!([]))))
    }
}

pub fn json_response(status: u16, body: Value) -> ApiResponse {
    ApiResponse {
        status,
        content_type: Some("application/json".to_string()),
        body: body.to_string(),
    }
}

pub fn url(path: &str) -> String {
    format!("{}/api/{}", BASE, path)
}

pub async fn logged_in_client(transport: Arc<ScriptedTransport>) -> ApiClient {
    let session = Session::in_memory();
    session.set_tokens("access-1", "refresh-1").await.unwrap();
    ApiClient::new(BASE, transport, session)
}
