use async_trait::async_trait;
use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::domain::{
    detection::Detection, errors::DomainResult, model::YoloParams, training::TrainingConfig,
};

/// A loaded detector. Runs are blocking and exclusive; callers move them
/// off the async runtime.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, image: &RgbImage, params: &YoloParams) -> DomainResult<Vec<Detection>>;
}

/// Channel layout of the raster an annotator hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

pub trait AnnotatorPort: Send + Sync {
    fn channel_order(&self) -> ChannelOrder;
    fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_artifact(&self, path: &Path) -> DomainResult<()>;
}

#[async_trait]
pub trait TrainerPort: Send + Sync {
    async fn train(&self, workdir: &Path, descriptor: &Path, config: &TrainingConfig) -> DomainResult<()>;

    /// Converts trained weights into the artifact the web service loads.
    async fn export_onnx(&self, workdir: &Path, weights: &Path, image_size: u32) -> DomainResult<PathBuf>;
}
