//! Tower Service implementation for tenancy middleware.

use crate::config::TenancyConfig;
use crate::error::TenancyError;
use crate::extract::extract_tenancy;
use axum::response::IntoResponse;
use http::{Method, Request, Response};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;
use vouch_core::TenancyContext;

/// Tower Service that extracts and validates the tenancy context.
///
/// On success the `TenancyContext` is inserted into the request extensions.
/// Requests without an app are rejected with 400 unless the config says the
/// app is optional. CORS preflight requests pass through untouched.
#[derive(Debug, Clone)]
pub struct TenancyService<S> {
    inner: S,
    config: Arc<TenancyConfig>,
}

impl<S> TenancyService<S> {
    pub fn new(inner: S, config: Arc<TenancyConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TenancyService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: From<String> + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = TenancyServiceFuture<S, ReqBody, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        if req.method() == Method::OPTIONS {
            return self.forward(req);
        }

        // Set by an outer layer that already resolved the tenancy.
        if req.extensions().get::<TenancyContext>().is_some() {
            return self.forward(req);
        }

        match extract_tenancy(&req, &self.config) {
            Ok(tenancy) => {
                tracing::debug!(tenancy = %tenancy, "Tenancy context extracted");
                req.extensions_mut().insert(tenancy);
                self.forward(req)
            }
            Err(TenancyError::AppMissing) if !self.config.require_app => {
                tracing::debug!("Tenancy not required, proceeding without");
                self.forward(req)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Tenancy extraction failed");
                TenancyServiceFuture::Error { error: Some(err) }
            }
        }
    }
}

impl<S> TenancyService<S> {
    fn forward<ReqBody, ResBody>(
        &mut self,
        req: Request<ReqBody>,
    ) -> TenancyServiceFuture<S, ReqBody, ResBody>
    where
        S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone,
    {
        // Take the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        TenancyServiceFuture::Inner {
            future: inner.call(req),
        }
    }
}

pin_project! {
    /// Future for TenancyService.
    #[project = TenancyServiceFutureProj]
    pub enum TenancyServiceFuture<S, ReqBody, ResBody>
    where
        S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    {
        Inner {
            #[pin]
            future: S::Future,
        },
        Error {
            error: Option<TenancyError>,
        },
    }
}

impl<S, ReqBody, ResBody> Future for TenancyServiceFuture<S, ReqBody, ResBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: From<String>,
{
    type Output = Result<Response<ResBody>, S::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            TenancyServiceFutureProj::Inner { future } => future.poll(cx),
            TenancyServiceFutureProj::Error { error } => {
                let err = error.take().unwrap_or(TenancyError::AppMissing);
                let (parts, _) = err.clone().into_response().into_parts();
                let body = serde_json::to_string(&crate::error::ErrorResponse::from(err))
                    .unwrap_or_default();
                Poll::Ready(Ok(Response::from_parts(parts, ResBody::from(body))))
            }
        }
    }
}
