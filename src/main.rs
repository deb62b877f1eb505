use clap::Parser;
use std::sync::Arc;
use tower_http::services::ServeDir;

use flower_lens::adapters::{
    http::{router, state::HttpState},
    onnx::model_catalog::OnnxModelCatalog,
    render::annotator::BoxAnnotator,
};
use flower_lens::application::services::InferenceService;
use flower_lens::config::{init_logging, ServeArgs};
use flower_lens::domain::{
    labels::LabelTable,
    model::{ModelId, YoloParams},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = ServeArgs::parse();

    tracing::info!("🔧 Loading model from {}", args.weights.display());

    // Loaded once; every request shares this handle.
    let catalog = OnnxModelCatalog::new();
    let model = ModelId { name: "taiwan_flower_v1".into(), onnx_path: args.weights.clone() };
    let (detector, model_error) = match catalog.load(&model, &args.dataset).await {
        Ok(d) => (Some(d), None),
        Err(e) => {
            tracing::error!("{}", e);
            (None, Some(e.to_string()))
        }
    };

    let annotator = match &args.font {
        Some(path) => BoxAnnotator::with_font_file(path).unwrap_or_else(|e| {
            tracing::warn!("{:#}; drawing boxes without labels", e);
            BoxAnnotator::new(None)
        }),
        None => BoxAnnotator::new(None),
    };

    let inference = Arc::new(InferenceService::new(
        detector,
        Arc::new(annotator),
        LabelTable::taiwan_flowers(),
        YoloParams::default(),
    ));
    let state = HttpState::new(inference, model_error);

    let app = router(state).fallback_service(ServeDir::new(&args.static_dir));

    tracing::info!("🚀 Flower detector listening on http://{}", args.bind);
    tracing::info!("📂 Static files served from {}", args.static_dir.display());

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
