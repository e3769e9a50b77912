use std::sync::Arc;

use haulquote_core::config::AttributionConfig;
use haulquote_relay::{DiagnosticsLog, Dispatcher};

/// Shared handles behind every route. Cloning is cheap; the dispatcher and
/// diagnostics buffer are the only cross-request state in the process.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub diagnostics: DiagnosticsLog,
    pub attribution: AttributionConfig,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, attribution: AttributionConfig) -> Self {
        let diagnostics = dispatcher.diagnostics().clone();
        Self { dispatcher: Arc::new(dispatcher), diagnostics, attribution }
    }
}
