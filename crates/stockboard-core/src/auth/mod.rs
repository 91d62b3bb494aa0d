//! Authentication module for the session token and the login flow.
//!
//! This module provides:
//! - `TokenStore`: the single token slot, with memory, file and OS
//!   keychain backends
//! - `AuthService`: login, logout and presence checks over the API client
//!
//! Tokens are opaque. There is no expiry tracking or refresh; a token is
//! kept until logout or until the backend answers 401.

pub mod error;
pub mod keychain;
pub mod service;
pub mod store;

use std::sync::Arc;

pub use error::AuthError;
pub use keychain::KeyringTokenStore;
pub use service::{AuthService, Credentials};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};

use crate::config::{Config, ConfigError, TokenBackend};

/// Open the token store selected by `config.token_backend`.
pub fn open_store(config: &Config) -> Result<Arc<dyn TokenStore>, ConfigError> {
    let store: Arc<dyn TokenStore> = match config.token_backend {
        TokenBackend::File => Arc::new(FileTokenStore::new(config.cache_dir()?, &config.token_key)),
        TokenBackend::Keyring => Arc::new(KeyringTokenStore::new(config.token_key.clone())),
        TokenBackend::Memory => Arc::new(MemoryTokenStore::new()),
    };
    Ok(store)
}
