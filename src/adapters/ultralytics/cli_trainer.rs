use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info};

use crate::application::ports::TrainerPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::training::{TrainingConfig, RUNS_ROOT};

/// Drives the Ultralytics `yolo` command line as a child process.
pub struct UltralyticsCliTrainer {
    program: PathBuf,
}

impl UltralyticsCliTrainer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn train_args(descriptor: &Path, cfg: &TrainingConfig) -> Vec<String> {
        vec![
            "detect".into(),
            "train".into(),
            format!("data={}", descriptor.display()),
            format!("model={}", cfg.base_weights),
            format!("epochs={}", cfg.epochs),
            format!("imgsz={}", cfg.image_size),
            format!("batch={}", cfg.batch),
            // pin the output root instead of the library's persisted runs_dir
            format!("project={RUNS_ROOT}"),
            format!("name={}", cfg.run_name),
            format!("patience={}", cfg.patience),
            format!("device={}", cfg.device),
            // keep runs/detect/<name> stable across reruns
            "exist_ok=True".into(),
        ]
    }

    pub fn export_args(weights: &Path, image_size: u32) -> Vec<String> {
        vec![
            "export".into(),
            format!("model={}", weights.display()),
            "format=onnx".into(),
            format!("imgsz={image_size}"),
        ]
    }

    async fn run(&self, workdir: &Path, args: &[String]) -> DomainResult<()> {
        info!("Running {} {}", self.program.display(), args.join(" "));
        let status = Command::new(&self.program)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| {
                error!("Failed to start {}: {}", self.program.display(), e);
                DomainError::TrainingFailed(format!("無法執行 {}: {e}", self.program.display()))
            })?;

        if !status.success() {
            return Err(DomainError::TrainingFailed(format!(
                "{} 結束狀態 {}",
                self.program.display(),
                status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TrainerPort for UltralyticsCliTrainer {
    async fn train(&self, workdir: &Path, descriptor: &Path, config: &TrainingConfig) -> DomainResult<()> {
        self.run(workdir, &Self::train_args(descriptor, config)).await
    }

    async fn export_onnx(&self, workdir: &Path, weights: &Path, image_size: u32) -> DomainResult<PathBuf> {
        // the child already runs inside workdir
        let model = weights.strip_prefix(workdir).unwrap_or(weights);
        self.run(workdir, &Self::export_args(model, image_size)).await?;
        let onnx = weights.with_extension("onnx");
        if !onnx.is_file() {
            return Err(DomainError::TrainingFailed(format!("找不到匯出的 {}", onnx.display())));
        }
        Ok(onnx)
    }
}
