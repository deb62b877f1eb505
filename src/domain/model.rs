use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Minimum score for a detection to be reported.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Where the service expects the exported weights, relative to its cwd.
pub const DEFAULT_WEIGHTS_FILE: &str = "best.onnx";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelId {
    pub name: String,       // logical name, e.g. "taiwan_flower_v1"
    pub onnx_path: PathBuf, // filesystem path
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_size: u32,       // 640 typical
    pub conf_threshold: f32,   // 0..1
    pub iou_threshold: f32,    // 0..1
    pub max_detections: usize, // e.g. 300
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: CONFIDENCE_THRESHOLD,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}
