//! Core library for the stockboard client.
//!
//! Provides the authenticated HTTP client for the stockboard backend, the
//! session token store, the login/logout flow and client configuration.
//! Front ends (the CLI, a GUI) wire these together and supply a
//! [`navigation::Navigator`] to react to expired sessions.

pub mod api;
pub mod auth;
pub mod config;
pub mod navigation;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthService, Credentials, TokenStore};
pub use config::Config;
pub use navigation::Navigator;
