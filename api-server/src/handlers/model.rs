//! Loaded model metadata

use axum::{extract::State, Json};
use serde::Serialize;

use phishguard_core::logic::model::inference::EngineStatus;
use phishguard_core::logic::model::ModelMetadata;

use crate::{AppError, AppResult, AppState};

#[derive(Serialize)]
pub struct ModelResponse {
    pub model: ModelMetadata,
    pub engine: EngineStatus,
}

pub async fn info(State(state): State<AppState>) -> AppResult<Json<ModelResponse>> {
    let model = state
        .inference
        .metadata()
        .cloned()
        .ok_or_else(|| AppError::NotFound("No model metadata".to_string()))?;

    Ok(Json(ModelResponse {
        model,
        engine: state.inference.status(),
    }))
}
