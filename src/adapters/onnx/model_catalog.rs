use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::{DetectorPort, ModelCatalogPort};
use crate::application::services::MODEL_MISSING_MESSAGE;
use crate::domain::dataset::DatasetDescriptor;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::ModelId;

pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Class-id → label list, taken from the dataset descriptor the model
    /// was trained with. Missing or unreadable descriptors yield `None`.
    pub async fn class_names(&self, descriptor: &Path) -> Option<Vec<String>> {
        let raw = tokio::fs::read_to_string(descriptor).await.ok()?;
        match DatasetDescriptor::parse(&raw) {
            Ok(d) => Some(d.names),
            Err(e) => {
                warn!("Ignoring class names from {}: {}", descriptor.display(), e);
                None
            }
        }
    }

    /// Loads the detector once. The error is kept so the page can show it.
    pub async fn load(&self, model: &ModelId, descriptor: &Path) -> DomainResult<Arc<dyn DetectorPort>> {
        self.validate_artifact(&model.onnx_path).await?;

        let names = self.class_names(descriptor).await.unwrap_or_else(|| {
            warn!("No class names at {}, labels fall back to class ids", descriptor.display());
            Vec::new()
        });

        let path = model.onnx_path.clone();
        let engine = tokio::task::spawn_blocking(move || OnnxYoloEngine::load(&path, names))
            .await
            .map_err(|e| DomainError::InferenceFailed(e.to_string()))?
            .map_err(|e| {
                error!("Failed to load YOLO model: {:?}", e);
                DomainError::InferenceFailed(format!("模型載入失敗: {e}"))
            })?;

        info!("Model {} ready", model.name);
        Ok(Arc::new(engine))
    }
}

impl Default for OnnxModelCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_artifact(&self, path: &Path) -> DomainResult<()> {
        if path.as_os_str().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        if !path.is_file() {
            return Err(DomainError::ArtifactMissing(format!(
                "{} ({})",
                MODEL_MISSING_MESSAGE,
                path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn missing_weights_are_reported_without_loading() {
        let cat = OnnxModelCatalog::new();
        let model = ModelId { name: "t".into(), onnx_path: PathBuf::from("definitely/not/here.onnx") };
        let err = cat.load(&model, Path::new("nope.yaml")).await.err().unwrap();
        assert!(matches!(err, DomainError::ArtifactMissing(_)));
        assert!(err.to_string().contains(MODEL_MISSING_MESSAGE));
    }

    #[tokio::test]
    async fn class_names_come_from_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("data.yaml");
        std::fs::write(&yaml, "names: [Bidens, Lantana]\n").unwrap();
        let names = OnnxModelCatalog::new().class_names(&yaml).await.unwrap();
        assert_eq!(names, vec!["Bidens", "Lantana"]);
    }
}
