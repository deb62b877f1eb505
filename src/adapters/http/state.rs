use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::services::{InferenceService, UploadedImage};
use crate::domain::session::AnalysisSession;

/// Shared state for the axum handlers: the use-case service plus the
/// single page session.
#[derive(Clone)]
pub struct HttpState {
    /// Owns the detector handle loaded at startup.
    pub inference: Arc<InferenceService>,
    pub session: Arc<Mutex<AnalysisSession<UploadedImage>>>,
    /// Why the model is unavailable, shown once on the page.
    pub model_error: Option<String>,
}

impl HttpState {
    pub fn new(inference: Arc<InferenceService>, model_error: Option<String>) -> Self {
        Self { inference, session: Arc::new(Mutex::new(AnalysisSession::default())), model_error }
    }
}
