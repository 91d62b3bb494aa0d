//! Hooks run on every outgoing request and every incoming response.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::warn;

use crate::auth::TokenStore;
use crate::navigation::Navigator;

/// Enriches the headers of an outgoing request. Must not fail the request.
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, headers: &mut HeaderMap);
}

/// Observes the status of every response before it reaches the caller.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, status: StatusCode);
}

/// Sets `Authorization: <scheme> <token>` when the store holds a token.
pub struct AuthHeaderInterceptor {
    store: Arc<dyn TokenStore>,
    scheme: String,
}

impl AuthHeaderInterceptor {
    pub fn new(store: Arc<dyn TokenStore>, scheme: impl Into<String>) -> Self {
        Self {
            store,
            scheme: scheme.into(),
        }
    }
}

impl RequestInterceptor for AuthHeaderInterceptor {
    fn on_request(&self, headers: &mut HeaderMap) {
        let token = match self.store.get() {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to read token, sending request without it");
                return;
            }
        };

        match HeaderValue::from_str(&format!("{} {}", self.scheme, token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Stored token is not a valid header value, skipping Authorization"),
        }
    }
}

/// On 401: clear the token slot, then send the navigator to the login route.
pub struct UnauthorizedInterceptor {
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl UnauthorizedInterceptor {
    pub fn new(
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            store,
            navigator,
            login_route: login_route.into(),
        }
    }
}

impl ResponseInterceptor for UnauthorizedInterceptor {
    fn on_response(&self, status: StatusCode) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear token after 401");
        }
        self.navigator.navigate(&self.login_route);
    }
}
