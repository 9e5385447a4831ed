use super::{Interceptor, Next};
use crate::error::HttpResult;
use crate::loading::LoadingIndicator;
use crate::request::{HttpRequest, HttpResponse};

/// Keeps the loading indicator raised while a request is in flight.
pub struct LoadingInterceptor {
    indicator: LoadingIndicator,
}

impl LoadingInterceptor {
    pub fn new(indicator: LoadingIndicator) -> Self {
        Self { indicator }
    }
}

#[async_trait::async_trait(?Send)]
impl Interceptor for LoadingInterceptor {
    async fn handle(&self, req: HttpRequest, next: Next<'_>) -> HttpResult<HttpResponse> {
        // Released on return, on error and if the future is dropped
        let _handle = self.indicator.begin();
        next.run(req).await
    }
}
