// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    catalog::Catalog,
    error::AppError,
    models::{
        quiz::{SubmitAnswerRequest, SubmitAnswerResponse},
        user::validate_user_id,
    },
    services::quiz::{self, NextQuestion},
    storage::StateStore,
};

/// Returns the user's question subset, drawing one on first contact.
pub async fn get_questions(
    State(store): State<Arc<dyn StateStore>>,
    State(catalog): State<Arc<Catalog>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_user_id(&user_id)?;

    let fragen = quiz::get_assignment(store.as_ref(), &catalog, &user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch assignment for {}: {:?}", user_id, e);
            AppError::from(e)
        })?;

    Ok(Json(json!({ "fragen": fragen })))
}

/// Returns the next unanswered question, or `done` once all are answered.
pub async fn start_quiz(
    State(store): State<Arc<dyn StateStore>>,
    State(catalog): State<Arc<Catalog>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_user_id(&user_id)?;

    let next = quiz::next_question(store.as_ref(), &catalog, &user_id).await?;

    let body = match next {
        NextQuestion::Pending(key) => {
            let text = catalog.get(&key).map(|e| e.prompt.clone());
            json!({ "frage": key, "text": text })
        }
        NextQuestion::Done => json!({ "done": true }),
    };

    Ok(Json(body))
}

/// Grades and records one answer.
///
/// * Missing fields are rejected with 400.
/// * A second answer to the same question changes nothing.
pub async fn submit_answer(
    State(store): State<Arc<dyn StateStore>>,
    State(catalog): State<Arc<Catalog>>,
    payload: Result<Json<SubmitAnswerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let submission = req.into_submission()?;

    let outcome = quiz::submit_answer(
        store.as_ref(),
        &catalog,
        &submission.user_id,
        &submission.question_key,
        &submission.answer,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to save answer of {}: {:?}", submission.user_id, e);
        AppError::from(e)
    })?;

    Ok(Json(SubmitAnswerResponse {
        message: if outcome.accepted {
            "Quiz-Daten gespeichert!"
        } else {
            "Frage wurde bereits beantwortet"
        },
        punkte: outcome.total_points,
        accepted: outcome.accepted,
        vergeben: outcome.points_delta,
    }))
}
