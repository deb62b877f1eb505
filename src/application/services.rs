use base64::{prelude::BASE64_STANDARD, Engine};
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    application::ports::{AnnotatorPort, ChannelOrder, DetectorPort, TrainerPort},
    domain::{
        dataset::DatasetDescriptor,
        detection::Detection,
        errors::{DomainError, DomainResult},
        labels::LabelTable,
        model::YoloParams,
        report::DetectionReport,
        training::{TrainingOutcome, TrainingRequest},
    },
};

pub const MODEL_MISSING_MESSAGE: &str = "找不到模型檔案。請先執行完成訓練。";

/// A decoded upload, kept as-is for preview and re-analysis.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub format: ImageFormat,
    pub rgb: RgbImage,
}

impl UploadedImage {
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub annotated: RgbImage,
    pub detections: Vec<Detection>,
    pub report: DetectionReport,
}

/// Decode → detect → annotate → report for a single image.
pub struct InferenceService {
    detector: Option<Arc<dyn DetectorPort>>,
    annotator: Arc<dyn AnnotatorPort>,
    labels: LabelTable,
    params: YoloParams,
}

impl InferenceService {
    pub fn new(
        detector: Option<Arc<dyn DetectorPort>>,
        annotator: Arc<dyn AnnotatorPort>,
        labels: LabelTable,
        params: YoloParams,
    ) -> Self {
        if detector.is_none() {
            warn!("Inference service started without a model; analysis is disabled");
        }
        Self { detector, annotator, labels, params }
    }

    pub fn model_loaded(&self) -> bool {
        self.detector.is_some()
    }

    pub fn params(&self) -> &YoloParams {
        &self.params
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Only JPEG and PNG uploads are accepted.
    pub fn decode_upload(bytes: &[u8]) -> DomainResult<UploadedImage> {
        if bytes.is_empty() {
            return Err(DomainError::DecodeFailed("檔案是空的".into()));
        }
        let format = image::guess_format(bytes).map_err(|e| DomainError::DecodeFailed(e.to_string()))?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(DomainError::DecodeFailed(format!("不支援的格式: {:?}", format)));
        }
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| DomainError::DecodeFailed(e.to_string()))?;
        Ok(UploadedImage { format, rgb: img.to_rgb8() })
    }

    /// Blocking; run it on a blocking thread.
    pub fn analyze(&self, image: &UploadedImage) -> DomainResult<AnalysisResult> {
        let detector = self
            .detector
            .as_ref()
            .ok_or_else(|| DomainError::ArtifactMissing(MODEL_MISSING_MESSAGE.into()))?;

        let t0 = std::time::Instant::now();
        let mut detections: Vec<Detection> = detector
            .detect(&image.rgb, &self.params)?
            .into_iter()
            .filter(|d| d.score > self.params.conf_threshold)
            .collect();
        detections.sort_by(|a, b| b.score.total_cmp(&a.score));

        let annotated = to_display_rgb(
            self.annotator.annotate(&image.rgb, &detections),
            self.annotator.channel_order(),
        );
        let report = DetectionReport::build(&detections, &self.labels);

        info!(
            "Analysis finished: {} detection(s) in {:.1} ms",
            detections.len(),
            t0.elapsed().as_secs_f32() * 1000.0
        );
        Ok(AnalysisResult { annotated, detections, report })
    }
}

/// Returns an RGB raster regardless of what the annotator produced.
pub fn to_display_rgb(mut img: RgbImage, order: ChannelOrder) -> RgbImage {
    if order == ChannelOrder::Bgr {
        for px in img.pixels_mut() {
            px.0.swap(0, 2);
        }
    }
    img
}

pub fn png_data_url(img: &RgbImage) -> DomainResult<String> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| DomainError::InferenceFailed(format!("PNG 編碼失敗: {e}")))?;
    Ok(format!("data:image/png;base64,{}", BASE64_STANDARD.encode(buf.into_inner())))
}

/// Validates the dataset, drives the trainer and locates its output.
#[derive(Clone)]
pub struct TrainingService {
    trainer: Arc<dyn TrainerPort>,
}

impl TrainingService {
    pub fn new(trainer: Arc<dyn TrainerPort>) -> Self {
        Self { trainer }
    }

    pub async fn run(&self, req: &TrainingRequest) -> DomainResult<TrainingOutcome> {
        let descriptor_path = req.descriptor_path();
        if !descriptor_path.is_file() {
            return Err(DomainError::ArtifactMissing(format!(
                "{}。請確認您已經把 Roboflow 下載的檔案解壓縮，並放在專案目錄下。",
                descriptor_path.display()
            )));
        }
        let raw = tokio::fs::read_to_string(&descriptor_path)
            .await
            .map_err(|e| DomainError::InvalidInput(format!("{}: {e}", descriptor_path.display())))?;
        let dataset = DatasetDescriptor::parse(&raw)?;
        info!(
            "Dataset: {} classes {:?} (train={}, val={})",
            dataset.names.len(),
            dataset.names,
            dataset.train.as_deref().unwrap_or("-"),
            dataset.val.as_deref().unwrap_or("-")
        );

        let cfg = &req.config;
        info!(
            "Training {} on {} for {} epochs (imgsz={}, batch={}, patience={}, device={})",
            cfg.run_name, cfg.base_weights, cfg.epochs, cfg.image_size, cfg.batch, cfg.patience, cfg.device
        );
        self.trainer.train(&req.workdir, &req.descriptor, cfg).await?;

        let best_weights = cfg.best_weights(&req.workdir);
        if !best_weights.is_file() {
            return Err(DomainError::TrainingFailed(format!(
                "訓練結束但找不到權重檔 {}",
                best_weights.display()
            )));
        }

        let onnx_weights = if req.export_onnx {
            Some(self.trainer.export_onnx(&req.workdir, &best_weights, cfg.image_size).await?)
        } else {
            None
        };

        Ok(TrainingOutcome { best_weights, onnx_weights })
    }
}
