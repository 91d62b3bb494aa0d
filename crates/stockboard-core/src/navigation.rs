//! Navigation capability handed to the API client.
//!
//! When the backend rejects the session the client does not change any
//! global state itself; it asks the application's `Navigator` to move the
//! user to the login route.

use std::sync::Mutex;

use tracing::warn;

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that only logs the redirect. Used when the application does
/// not supply one.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        warn!(route = route, "Session expired, navigating to login");
    }
}

/// Navigator that remembers every route it was sent to.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.routes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.lock().push(route.to_string());
    }
}
