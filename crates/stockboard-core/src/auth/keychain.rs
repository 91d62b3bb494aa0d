use keyring::Entry;

use super::store::{StoreError, TokenStore};

/// Keychain service name the token entry is filed under
pub const SERVICE_NAME: &str = "stockboard";

/// Token kept in the OS keychain under (`stockboard`, key).
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    key: String,
}

impl KeyringTokenStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Ok(Entry::new(SERVICE_NAME, &self.key)?)
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        self.entry()?.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
