use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::ApiClient;

use super::error::AuthError;
use super::store::TokenStore;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

/// Username/password body posted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Login/logout flow over the shared API client and its token store.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        let store = api.token_store();
        Self { api, store }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Post `credentials` to the login endpoint and persist the returned
    /// `access_token`.
    ///
    /// Goes through the regular client, so a 401 here also clears the
    /// stored token and triggers the login redirect.
    pub async fn login<C>(&self, credentials: &C) -> Result<String, AuthError>
    where
        C: Serialize + ?Sized,
    {
        let endpoint = self.api.login_endpoint().to_string();
        let response: LoginResponse = match self.api.post(&endpoint, credentials).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login request failed");
                return Err(e
                    .detail()
                    .map(AuthError::Authentication)
                    .unwrap_or_else(AuthError::login_failed));
            }
        };

        let token = match response.access_token {
            Some(token) if !token.is_empty() => token,
            _ => {
                warn!("Login response did not contain an access token");
                return Err(AuthError::login_failed());
            }
        };

        self.store.set(&token)?;
        info!("Login succeeded");
        Ok(token)
    }

    /// Forget the stored token. Succeeds whether or not one was present.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Current token, unvalidated. Store read failures read as absent.
    pub fn get_token(&self) -> Option<String> {
        match self.store.get() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read token");
                None
            }
        }
    }

    /// Presence check only; an expired or revoked token still counts.
    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}
