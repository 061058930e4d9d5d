//! Dify image scorer library
//!
//! Modules:
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `dify`: Thin client for the Dify upload, workflow and diagnostic endpoints.
//! - `evaluation`: Request/response types, the workflow invoker, response
//!   normalization and ranking.
//! - `image`: Base64 codec for local image resources.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `DifyClient`,
//! `Evaluator`, `AppError` and `AppResult`.
pub mod api;
pub mod dify;
pub mod evaluation;
pub mod image;
pub mod config;
pub mod error;

pub use config::Config;
pub use dify::client::DifyClient;
pub use error::{AppError, AppResult};
pub use evaluation::invoker::Evaluator;
