use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    ImageReceived,
    Analyzing,
    ReportRendered,
    Errored,
}

/// Per-user page state. `I` is whatever the service keeps for the
/// uploaded picture.
#[derive(Debug)]
pub struct AnalysisSession<I> {
    phase: SessionPhase,
    image: Option<Arc<I>>,
    last_error: Option<String>,
}

impl<I> Default for AnalysisSession<I> {
    fn default() -> Self {
        Self { phase: SessionPhase::Idle, image: None, last_error: None }
    }
}

impl<I> AnalysisSession<I> {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn image(&self) -> Option<&Arc<I>> {
        self.image.as_ref()
    }

    /// A new upload replaces whatever was there, unless a run is in flight.
    pub fn receive_image(&mut self, image: I) -> DomainResult<Arc<I>> {
        if self.phase == SessionPhase::Analyzing {
            return Err(DomainError::Busy("分析進行中，請稍候".into()));
        }
        let image = Arc::new(image);
        self.image = Some(image.clone());
        self.last_error = None;
        self.phase = SessionPhase::ImageReceived;
        Ok(image)
    }

    /// Trigger: ImageReceived/ReportRendered/Errored → Analyzing.
    pub fn begin_analysis(&mut self) -> DomainResult<Arc<I>> {
        match self.phase {
            SessionPhase::Idle => Err(DomainError::InvalidInput("請先上傳一張照片".into())),
            SessionPhase::Analyzing => Err(DomainError::Busy("分析進行中，請稍候".into())),
            SessionPhase::ImageReceived | SessionPhase::ReportRendered | SessionPhase::Errored => {
                let image = self
                    .image
                    .clone()
                    .ok_or_else(|| DomainError::InvalidInput("請先上傳一張照片".into()))?;
                self.phase = SessionPhase::Analyzing;
                self.last_error = None;
                Ok(image)
            }
        }
    }

    pub fn finish_analysis<T>(&mut self, outcome: &DomainResult<T>) {
        if self.phase != SessionPhase::Analyzing {
            return;
        }
        match outcome {
            Ok(_) => self.phase = SessionPhase::ReportRendered,
            Err(e) => {
                self.phase = SessionPhase::Errored;
                self.last_error = Some(e.to_string());
            }
        }
    }
}
