//! Feature-vector scoring handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use phishguard_core::Label;

use crate::{AppResult, AppState};

/// Any subset of the feature layout; absent names score as 0
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub label: Label,
    pub score: f64,
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(req) = payload?;
    let prediction = state.inference.predict(&req.features)?;

    tracing::debug!(
        label = %prediction.label,
        score = prediction.score,
        provided = req.features.len(),
        "prediction"
    );

    Ok(Json(PredictResponse {
        label: prediction.label,
        score: prediction.score,
    }))
}
