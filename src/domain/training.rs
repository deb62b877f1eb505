use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DATASET_DESCRIPTOR: &str = "data.yaml";
pub const ACCELERATOR_ENV: &str = "CUDA_VISIBLE_DEVICES";

/// Output root the detection library uses for detect-task runs.
pub const RUNS_ROOT: &str = "runs/detect";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    Accelerator(u32),
    Cpu,
}

impl Device {
    /// Accelerator 0 when the env value is set and non-empty, CPU otherwise.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Device::Accelerator(0),
            _ => Device::Cpu,
        }
    }

    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(ACCELERATOR_ENV).ok().as_deref())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Accelerator(i) => write!(f, "{i}"),
            Device::Cpu => f.write_str("cpu"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub base_weights: String,
    pub epochs: u32,
    pub image_size: u32,
    pub batch: u32,
    pub run_name: String,
    pub patience: u32,
    pub device: Device,
}

impl TrainingConfig {
    /// Nano base model, sized for a laptop or a free notebook GPU.
    pub fn taiwan_flowers(device: Device) -> Self {
        Self {
            base_weights: "yolov8n.pt".to_string(),
            epochs: 50,
            image_size: 640,
            batch: 16,
            run_name: "taiwan_flower_v1".to_string(),
            patience: 10,
            device,
        }
    }

    pub fn run_dir(&self, workdir: &Path) -> PathBuf {
        workdir.join(RUNS_ROOT).join(&self.run_name)
    }

    pub fn best_weights(&self, workdir: &Path) -> PathBuf {
        self.run_dir(workdir).join("weights").join("best.pt")
    }
}

#[derive(Debug, Clone)]
pub struct TrainingRequest {
    pub workdir: PathBuf,
    pub descriptor: PathBuf,
    pub config: TrainingConfig,
    pub export_onnx: bool,
}

impl TrainingRequest {
    pub fn descriptor_path(&self) -> PathBuf {
        self.workdir.join(&self.descriptor)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingOutcome {
    pub best_weights: PathBuf,
    pub onnx_weights: Option<PathBuf>,
}
