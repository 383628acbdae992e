//! Debounced context search with cancellation-on-supersede.
//!
//! Typing in the context picker fires a search per keystroke; only the
//! latest one may deliver results. Starting a new search cancels any prior
//! pending search, and a cancelled search returns nothing rather than
//! applying stale results.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use sidekick_core::search::{CodeSearch, CodeSymbol};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Coordinates debounced, supersedable searches against the host's code
/// search capability.
pub struct ContextSearchCoordinator {
    backend: Arc<dyn CodeSearch>,
    current: Mutex<Option<CancellationToken>>,
    debounce: Duration,
}

impl ContextSearchCoordinator {
    pub fn new(backend: Arc<dyn CodeSearch>) -> Self {
        Self {
            backend,
            current: Mutex::new(None),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Overrides the debounce interval (used by tests).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Runs a debounced search. Returns `None` when superseded by a newer
    /// search; cancellation is a silent early return, not an error.
    pub async fn search(&self, query: &str) -> Option<Vec<CodeSymbol>> {
        let token = CancellationToken::new();
        {
            let mut current = self.current.lock().unwrap();
            if let Some(previous) = current.replace(token.clone()) {
                previous.cancel();
            }
        }

        tokio::select! {
            _ = token.cancelled() => return None,
            _ = tokio::time::sleep(self.debounce) => {}
        }

        let results = self.backend.search(query).await;

        // A search superseded mid-flight must not apply its results.
        if token.is_cancelled() {
            return None;
        }
        Some(results)
    }

    /// Cancels whatever search is currently pending.
    pub fn cancel_pending(&self) {
        if let Some(token) = self.current.lock().unwrap().take() {
            token.cancel();
        }
    }
}
