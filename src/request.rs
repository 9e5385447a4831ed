use crate::error::{HttpError, HttpResult};
use backoffice_shared::HEADER_REQUEST_ID;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

pub use backoffice_shared::protocol::HttpMethod;

// =========================================================
// Core abstraction (HTTP Interface Abstraction)
// =========================================================

/// Outgoing request. `Clone` so the auth stage can retry it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub id: Uuid,
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        let id = Uuid::new_v4();
        let mut headers = HashMap::new();
        headers.insert(HEADER_REQUEST_ID.to_string(), id.to_string());
        Self {
            id,
            url: url.to_string(),
            method,
            headers,
            body: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(url, HttpMethod::Get)
    }

    pub fn post(url: &str) -> Self {
        Self::new(url, HttpMethod::Post)
    }

    pub fn delete(url: &str) -> Self {
        Self::new(url, HttpMethod::Delete)
    }

    /// Sets a header, replacing any existing one regardless of case.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.set_header(key, value);
        self
    }

    pub fn set_header(&mut self, key: &str, value: &str) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(key));
        self.headers.insert(key.to_string(), value.to_string());
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> HttpResult<Self> {
        let raw = serde_json::to_string(body).map_err(|e| HttpError::InvalidRequest(e.to_string()))?;
        self.body = Some(raw);
        Ok(self.with_header("Content-Type", "application/json"))
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> HttpResult<T> {
        serde_json::from_str(&self.body).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// Turns a non-2xx response into [`HttpError::Status`].
    pub fn error_for_status(self, method: HttpMethod, url: &str) -> HttpResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HttpError::Status {
                method: method.as_str(),
                url: url.to_string(),
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Sends one request and yields exactly one response or error.
///
/// Non-2xx statuses are responses, not errors, at this level.
#[async_trait::async_trait(?Send)]
pub trait Transport {
    async fn send(&self, req: HttpRequest) -> HttpResult<HttpResponse>;
}

#[async_trait::async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for Rc<T> {
    async fn send(&self, req: HttpRequest) -> HttpResult<HttpResponse> {
        (**self).send(req).await
    }
}

// =========================================================
// Implementation: reqwest client (Production)
// =========================================================

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, req: HttpRequest) -> HttpResult<HttpResponse> {
        let method = match req.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.client.request(method, &req.url);
        for (k, v) in &req.headers {
            builder = builder.header(k, v);
        }
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_builder() {
                HttpError::InvalidRequest(e.to_string())
            } else {
                HttpError::Network(e.to_string())
            }
        })?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = resp
            .text()
            .await
            .map_err(|e| HttpError::Network(format!("body read failed: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
