use serde::{Deserialize, Serialize};

use crate::domain::{detection::Detection, report::DetectionReport, session::SessionPhase};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub title: String,
    pub flowers: Vec<String>,
    pub model_loaded: bool,
    pub model_error: Option<String>,
    pub conf_threshold: f32,
    pub phase: SessionPhase,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub preview: String,
    pub phase: SessionPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub width: u32,
    pub height: u32,
    pub annotated: String,
    pub detections: Vec<Detection>,
    pub report: DetectionReport,
    pub phase: SessionPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
