//! Authentication stage
//!
//! Attaches the stored token to every request. A 401 gets exactly one
//! recovery attempt: refresh the token, store it, retry once. When that is
//! not possible the session is ended and the caller gets
//! [`HttpError::SessionExpired`].

use super::{Interceptor, Next};
use crate::credential::CredentialStore;
use crate::error::{HttpError, HttpResult};
use crate::request::{HttpRequest, HttpResponse, Transport};
use crate::router::Navigator;
use backoffice_shared::{RefreshRequest, RefreshResponse};
use std::rc::Rc;

// =========================================================
// Token refresh
// =========================================================

#[async_trait::async_trait(?Send)]
pub trait TokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> HttpResult<RefreshResponse>;
}

/// Calls the refresh endpoint directly on the transport, outside the
/// interceptor chain.
pub struct HttpTokenRefresher {
    transport: Rc<dyn Transport>,
    url: String,
}

impl HttpTokenRefresher {
    pub fn new(transport: Rc<dyn Transport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> HttpResult<RefreshResponse> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let req = HttpRequest::post(&self.url).with_json(&body)?;
        let method = req.method;
        self.transport
            .send(req)
            .await?
            .error_for_status(method, &self.url)?
            .json()
    }
}

// =========================================================
// Interceptor
// =========================================================

pub struct AuthInterceptor {
    credentials: Rc<CredentialStore>,
    refresher: Rc<dyn TokenRefresher>,
    navigator: Rc<dyn Navigator>,
    header: String,
    scheme: String,
    login_path: String,
    public_urls: Vec<String>,
}

impl AuthInterceptor {
    pub fn new(
        credentials: Rc<CredentialStore>,
        refresher: Rc<dyn TokenRefresher>,
        navigator: Rc<dyn Navigator>,
        header: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            refresher,
            navigator,
            header: header.into(),
            scheme: String::new(),
            login_path: crate::route::AppRoute::auth_failure_redirect()
                .to_path()
                .to_string(),
            public_urls: Vec::new(),
        }
    }

    /// Prefix for the header value, e.g. `Bearer`.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Marks an endpoint (sign-in, token refresh) as anonymous: no token is
    /// attached and a 401 is returned as is.
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_urls.push(url.into());
        self
    }

    fn is_public(&self, url: &str) -> bool {
        let url = url.split(['?', '#']).next().unwrap_or(url);
        self.public_urls.iter().any(|public| public == url)
    }

    fn authorize(&self, mut req: HttpRequest, token: Option<&str>) -> HttpRequest {
        if let Some(token) = token {
            let value = if self.scheme.is_empty() {
                token.to_string()
            } else {
                format!("{} {}", self.scheme, token)
            };
            req.set_header(&self.header, &value);
        }
        req
    }

    /// Ends the session. Navigation is fire-and-forget.
    fn expire(&self, cause: &HttpError) -> HttpError {
        if let Err(e) = self.credentials.clear() {
            tracing::warn!(error = %e, "persisted credential could not be removed");
        }
        self.navigator.navigate(&self.login_path);
        HttpError::SessionExpired(cause.to_string())
    }

    async fn recover(
        &self,
        original: HttpRequest,
        next: Next<'_>,
        rejected: HttpError,
    ) -> HttpResult<HttpResponse> {
        let Some(refresh_token) = self.credentials.refresh_token() else {
            tracing::info!(request_id = %original.id, "401 without refresh token, ending session");
            return Err(self.expire(&rejected));
        };

        let renewed = match self.refresher.refresh(&refresh_token).await {
            Ok(renewed) => renewed,
            Err(e) => {
                tracing::info!(request_id = %original.id, error = %e, "token refresh failed, ending session");
                return Err(self.expire(&rejected));
            }
        };

        if let Err(e) = self
            .credentials
            .renew(renewed.token.clone(), renewed.refresh_token.clone())
        {
            // Still current in memory, only lost on restart
            tracing::warn!(error = %e, "refreshed credential could not be persisted");
        }

        tracing::debug!(request_id = %original.id, "token refreshed, retrying once");
        let retry = self.authorize(original, Some(&renewed.token));
        match next.run(retry).await {
            Err(e) if e.is_unauthorized() => Err(self.expire(&e)),
            other => other,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Interceptor for AuthInterceptor {
    async fn handle(&self, req: HttpRequest, next: Next<'_>) -> HttpResult<HttpResponse> {
        if self.is_public(&req.url) {
            return next.run(req).await;
        }

        let token = self.credentials.get_token();
        let first = self.authorize(req.clone(), token.as_deref());

        match next.run(first).await {
            // Anonymous calls (login) have no session to recover
            Err(e) if e.is_unauthorized() && token.is_some() => self.recover(req, next, e).await,
            other => other,
        }
    }
}
