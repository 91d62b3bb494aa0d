use thiserror::Error;

use super::store::StoreError;

/// Message used when the login endpoint gives no `detail`
pub const DEFAULT_LOGIN_ERROR: &str = "Login failed";

#[derive(Error, Debug)]
pub enum AuthError {
    /// Login was rejected or the response could not be used. The message is
    /// the backend's `detail` when it sent one.
    #[error("{0}")]
    Authentication(String),

    #[error("Token storage failed: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn login_failed() -> Self {
        AuthError::Authentication(DEFAULT_LOGIN_ERROR.to_string())
    }
}
