// src/handlers/results.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::{quiz::QuizResultsResponse, user::validate_user_id},
    services::results,
    storage::StateStore,
};

/// Total points; 0 for users without answers.
pub async fn get_points(
    State(store): State<Arc<dyn StateStore>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_user_id(&user_id)?;
    let punkte = results::total_points(store.as_ref(), &user_id).await?;
    Ok(Json(json!({ "punkte": punkte })))
}

pub async fn get_answered_questions(
    State(store): State<Arc<dyn StateStore>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_user_id(&user_id)?;
    let fragen = results::answered_questions(store.as_ref(), &user_id).await?;
    Ok(Json(json!({ "fragen": fragen })))
}

/// Answer history together with the total.
pub async fn get_quiz_results(
    State(store): State<Arc<dyn StateStore>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_user_id(&user_id)?;
    let state = results::load_state(store.as_ref(), &user_id).await?;
    Ok(Json(QuizResultsResponse::from(state)))
}

/// Raw quiz state. Unlike the other reads this reports absence as 404.
pub async fn get_raw_state(
    State(store): State<Arc<dyn StateStore>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_user_id(&user_id)?;

    let state = store
        .get_state(&user_id)
        .await?
        .ok_or(AppError::NotFound("Keine Daten gefunden".to_string()))?;

    Ok(Json(json!({
        "punkte": state.total_points(),
        "beantworteteFragen": state.answered,
    })))
}
