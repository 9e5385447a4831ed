//! Request interception pipeline
//!
//! An ordered list of [`Interceptor`] stages in front of a [`Transport`].
//! Each stage receives the request and a [`Next`] handle for the rest of the
//! chain; it may rewrite the request, short-circuit, call `next` again
//! (retry) or observe the result on the way back.

pub mod auth;
pub mod errors;
pub mod loading;

use crate::error::HttpResult;
use crate::request::{HttpRequest, HttpResponse, Transport};
use serde::de::DeserializeOwned;
use std::rc::Rc;

#[async_trait::async_trait(?Send)]
pub trait Interceptor {
    async fn handle(&self, req: HttpRequest, next: Next<'_>) -> HttpResult<HttpResponse>;
}

/// The remainder of the chain after the current stage.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Rc<dyn Interceptor>],
    transport: &'a dyn Transport,
}

impl Next<'_> {
    /// Runs the remaining stages, then the transport. Non-2xx responses come
    /// back as [`crate::error::HttpError::Status`].
    pub async fn run(self, req: HttpRequest) -> HttpResult<HttpResponse> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    transport: self.transport,
                };
                stage.handle(req, next).await
            }
            None => {
                let method = req.method;
                let url = req.url.clone();
                self.transport
                    .send(req)
                    .await?
                    .error_for_status(method, &url)
            }
        }
    }
}

pub struct Pipeline {
    stages: Vec<Rc<dyn Interceptor>>,
    transport: Rc<dyn Transport>,
}

impl Pipeline {
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self {
            stages: Vec::new(),
            transport,
        }
    }

    /// Appends a stage. Stages run in insertion order, outermost first.
    pub fn with(mut self, stage: impl Interceptor + 'static) -> Self {
        self.stages.push(Rc::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub async fn send(&self, req: HttpRequest) -> HttpResult<HttpResponse> {
        let next = Next {
            stages: &self.stages,
            transport: self.transport.as_ref(),
        };
        next.run(req).await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, req: HttpRequest) -> HttpResult<T> {
        self.send(req).await?.json()
    }
}

#[cfg(test)]
mod tests;
