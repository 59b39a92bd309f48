//! # vouch-tenant
//!
//! Tower/Axum middleware that extracts the tenancy triple (app, environment,
//! organization) from incoming HTTP requests and makes it available to route
//! handlers as a [`vouch_core::TenancyContext`] request extension.
//!
//! ## Features
//!
//! - **Header Extraction**: `X-App-ID`, `X-Environment-ID`, `X-Organization-ID`
//! - **Upstream Context**: a `TenancyContext` inserted by an earlier layer wins
//! - **Validation**: every header must hold a UUID
//! - **Error Responses**: structured JSON 400 errors for missing or invalid context
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::post};
//! use vouch_core::TenancyContext;
//! use vouch_tenant::TenancyLayer;
//!
//! async fn send(Extension(tenancy): Extension<TenancyContext>) -> String {
//!     format!("Sending for {tenancy}")
//! }
//!
//! let app = Router::new()
//!     .route("/email_otp/send", post(send))
//!     .layer(TenancyLayer::new());
//! ```

mod config;
mod error;
mod extract;
mod layer;
mod service;

pub use config::{
    TenancyConfig, TenancyConfigBuilder, DEFAULT_APP_HEADER, DEFAULT_ENVIRONMENT_HEADER,
    DEFAULT_ORGANIZATION_HEADER,
};
pub use error::{ErrorResponse, TenancyError};
pub use extract::{extract_tenancy, header_id};
pub use layer::TenancyLayer;
pub use service::{TenancyService, TenancyServiceFuture};
