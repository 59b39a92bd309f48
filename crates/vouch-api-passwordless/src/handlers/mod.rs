//! HTTP handlers.

pub mod csrf;
pub mod health;
pub mod passwordless;

pub use csrf::{csrf_stats_handler, csrf_token_handler};
pub use health::health_handler;
pub use passwordless::{send_code_handler, verify_code_handler};
