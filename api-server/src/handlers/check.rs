//! URL check handler: heuristic screen, then the model

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use phishguard_core::logic::model::UrlVerdict;

use crate::{AppResult, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CheckRequest {
    #[validate(length(min = 1, max = 4096))]
    pub url: String,
}

pub async fn check(
    State(state): State<AppState>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> AppResult<Json<UrlVerdict>> {
    let Json(req) = payload?;
    req.validate()?;

    let verdict = state.inference.check_url(&req.url, &state.config.heuristics);
    Ok(Json(verdict))
}
