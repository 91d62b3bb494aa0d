//! REST API client module for the stockboard backend.
//!
//! This module provides the `ApiClient` for issuing JSON requests against
//! the backend's base URL. Every request passes through the request
//! interceptors (bearer token injection) and every response through the
//! response interceptors (forced logout on 401).

pub mod client;
pub mod error;
pub mod interceptor;

pub use client::{ApiClient, ApiClientBuilder};
pub use error::ApiError;
pub use interceptor::{
    AuthHeaderInterceptor, RequestInterceptor, ResponseInterceptor, UnauthorizedInterceptor,
};
