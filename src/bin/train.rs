use clap::Parser;
use std::sync::Arc;

use flower_lens::adapters::ultralytics::cli_trainer::UltralyticsCliTrainer;
use flower_lens::application::services::TrainingService;
use flower_lens::config::{init_logging, TrainArgs};
use flower_lens::domain::training::{Device, TrainingConfig, TrainingRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = TrainArgs::parse();

    let request = TrainingRequest {
        workdir: args.workdir.clone(),
        descriptor: args.data.clone(),
        config: TrainingConfig::taiwan_flowers(Device::from_env()),
        export_onnx: !args.skip_export,
    };
    let service = TrainingService::new(Arc::new(UltralyticsCliTrainer::new(&args.yolo_bin)));

    tracing::info!("開始訓練模型...");
    match service.run(&request).await {
        Ok(outcome) => {
            tracing::info!("✅ 訓練完成！");
            tracing::info!("最佳模型權重已儲存於: {}", outcome.best_weights.display());
            match &outcome.onnx_weights {
                Some(onnx) => tracing::info!(
                    "請將 {} 複製到網頁服務的工作目錄 (best.onnx) 以便使用。",
                    onnx.display()
                ),
                None => tracing::info!("請先匯出為 ONNX 並命名為 best.onnx 以便網頁服務使用。"),
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ 訓練過程中發生錯誤: {}", e);
            Err(e.into())
        }
    }
}
