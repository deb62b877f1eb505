use serde::{Deserialize, Serialize};

use super::detection::Detection;
use super::labels::LabelTable;

pub const NOTHING_DETECTED_WARNING: &str =
    "畫面中未偵測到指定花朵，請嘗試調整拍攝角度或降低信心門檻值。";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    pub display_name: String,
    pub label: String,
    /// Already rounded to two decimals and clamped into [0, 1].
    pub confidence: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionReport {
    NothingDetected { warning: String },
    Detected { lines: Vec<ReportLine> },
}

impl DetectionReport {
    pub fn build(detections: &[Detection], labels: &LabelTable) -> Self {
        if detections.is_empty() {
            return Self::NothingDetected { warning: NOTHING_DETECTED_WARNING.to_string() };
        }
        let lines = detections
            .iter()
            .map(|d| {
                let display_name = labels.display_name(&d.label).to_string();
                let confidence = format_confidence(d.score);
                let text = format!("{} ({}) 信心指數: {}", display_name, d.label, confidence);
                ReportLine { display_name, label: d.label.clone(), confidence, text }
            })
            .collect();
        Self::Detected { lines }
    }

    pub fn lines(&self) -> &[ReportLine] {
        match self {
            Self::Detected { lines } => lines,
            Self::NothingDetected { .. } => &[],
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::NothingDetected { warning } => Some(warning),
            Self::Detected { .. } => None,
        }
    }
}

pub fn format_confidence(score: f32) -> String {
    let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
    format!("{:.2}", score)
}
