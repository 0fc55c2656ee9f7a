//! # kuppi-api
//!
//! HTTP server for the Kuppi notes backend: email-OTP signup and password
//! reset, bearer-token login, per-user notes, OCR and Gemini-backed answers
//! and summaries.
//!
//! The binary in `main.rs` reads [`config::AppConfig`], wires an
//! [`AppState`] over either PostgreSQL or in-memory stores and serves
//! [`build_router`].

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod services;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::ApiJson;
pub use routes::{build_router, ApiDoc};
pub use state::{AppState, Collaborators, GlobalRateLimiter};
