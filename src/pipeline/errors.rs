//! Error reporting stage
//!
//! Transparent to the caller: every failure is returned unchanged and a
//! normalized copy goes to the notification sink.

use super::{Interceptor, Next};
use crate::error::HttpResult;
use crate::notify::{Notification, NotificationSink};
use crate::request::{HttpRequest, HttpResponse};
use std::rc::Rc;

pub struct ErrorInterceptor {
    sink: Rc<dyn NotificationSink>,
}

impl ErrorInterceptor {
    pub fn new(sink: Rc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

#[async_trait::async_trait(?Send)]
impl Interceptor for ErrorInterceptor {
    async fn handle(&self, req: HttpRequest, next: Next<'_>) -> HttpResult<HttpResponse> {
        let request_id = req.id;
        let result = next.run(req).await;
        if let Err(e) = &result {
            tracing::debug!(%request_id, error = %e, "request failed");
            self.sink
                .notify(Notification::from_error(e).with_request_id(request_id));
        }
        result
    }
}
