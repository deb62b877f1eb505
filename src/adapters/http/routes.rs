use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};

use crate::adapters::http::state::HttpState;
use crate::application::dto::{AnalyzeResponse, ErrorResponse, StatusResponse, UploadResponse};
use crate::application::services::{png_data_url, InferenceService, MODEL_MISSING_MESSAGE};
use crate::domain::errors::DomainError;
use crate::domain::session::SessionPhase;

pub const PAGE_TITLE: &str = "台灣路上常見花朵辨識";

/// Domain errors rendered as `{ "error": ... }` with a matching status.
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::ArtifactMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::DecodeFailed(_) => StatusCode::BAD_REQUEST,
            DomainError::InvalidInput(_) | DomainError::Busy(_) => StatusCode::CONFLICT,
            DomainError::InferenceFailed(_) | DomainError::TrainingFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse { error: format!("發生錯誤: {}", self.0) })).into_response()
    }
}

pub async fn get_status(State(st): State<HttpState>) -> impl IntoResponse {
    let session = st.session.lock().await;
    Json(StatusResponse {
        title: PAGE_TITLE.to_string(),
        flowers: st.inference.labels().display_names(),
        model_loaded: st.inference.model_loaded(),
        model_error: if st.inference.model_loaded() {
            None
        } else {
            Some(st.model_error.clone().unwrap_or_else(|| MODEL_MISSING_MESSAGE.to_string()))
        },
        conf_threshold: st.inference.params().conf_threshold,
        phase: session.phase(),
        last_error: session.last_error().map(str::to_string),
    })
}

pub async fn upload(State(st): State<HttpState>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::InvalidInput(e.to_string()))?
    {
        if field.name() == Some("file") {
            let data = field.bytes().await.map_err(|e| DomainError::InvalidInput(e.to_string()))?;
            bytes = Some(data);
            break;
        }
    }
    let bytes = bytes.ok_or_else(|| DomainError::InvalidInput("缺少 file 欄位".into()))?;

    let decoded = tokio::task::spawn_blocking(move || {
        let image = InferenceService::decode_upload(&bytes)?;
        let preview = png_data_url(&image.rgb)?;
        Ok::<_, DomainError>((image, preview))
    })
    .await
    .map_err(|e| DomainError::DecodeFailed(e.to_string()))?;
    let (image, preview) = decoded.inspect_err(|e| warn!("Upload rejected: {}", e))?;

    let (width, height, format) = (image.width(), image.height(), format!("{:?}", image.format));
    let mut session = st.session.lock().await;
    session.receive_image(image)?;
    info!("Image received: {}x{} {}", width, height, format);

    Ok(Json(UploadResponse { width, height, format, preview, phase: session.phase() }))
}

pub async fn analyze(State(st): State<HttpState>) -> Result<Json<AnalyzeResponse>, ApiError> {
    if !st.inference.model_loaded() {
        return Err(DomainError::ArtifactMissing(MODEL_MISSING_MESSAGE.into()).into());
    }
    let image = st.session.lock().await.begin_analysis()?;

    // Own task so the session is settled even if the client goes away.
    let task_state = st.clone();
    let handle = tokio::spawn(async move {
        let inference = task_state.inference.clone();
        let result = tokio::task::spawn_blocking(move || {
            let analysis = inference.analyze(&image)?;
            let annotated = png_data_url(&analysis.annotated)?;
            Ok::<_, DomainError>(AnalyzeResponse {
                width: analysis.annotated.width(),
                height: analysis.annotated.height(),
                annotated,
                detections: analysis.detections,
                report: analysis.report,
                phase: SessionPhase::ReportRendered,
            })
        })
        .await
        .unwrap_or_else(|e| Err(DomainError::InferenceFailed(e.to_string())));

        let mut session = task_state.session.lock().await;
        session.finish_analysis(&result);
        if let Err(e) = &result {
            error!("Analysis failed: {}", e);
        }
        result
    });

    let response = handle
        .await
        .map_err(|e| DomainError::InferenceFailed(e.to_string()))??;
    Ok(Json(response))
}
