//! Enable/disable state of the search module

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether the search endpoint and its admin controls are exposed
///
/// Disabling hides the search page (404) and the dashboard controls;
/// indexed content is kept.
#[derive(Debug)]
pub struct SearchModule {
    enabled: AtomicBool,
}

impl SearchModule {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
        tracing::info!("Search module enabled");
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        tracing::info!("Search module disabled");
    }
}

impl Default for SearchModule {
    fn default() -> Self {
        Self::new(true)
    }
}
