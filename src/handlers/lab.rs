// src/handlers/lab.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::{lab_result::StoreResultsRequest, user::validate_user_id},
    services::archive,
    storage::{BlobStore, ExportSink, StateStore},
};

/// Uploads the lab report PDF (multipart fields `pdf` and `userId`).
/// The first upload per user is kept; later uploads return its URL.
pub async fn upload_pdf(
    State(blobs): State<Arc<dyn BlobStore>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut pdf: Option<Vec<u8>> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("pdf") => pdf = Some(field.bytes().await?.to_vec()),
            Some("userId") => user_id = Some(field.text().await?),
            _ => {}
        }
    }

    let Some(pdf) = pdf.filter(|bytes| !bytes.is_empty()) else {
        tracing::warn!("Upload without PDF rejected");
        return Err(AppError::BadRequest("Kein PDF gefunden".to_string()));
    };
    let user_id = user_id.ok_or(AppError::BadRequest("Fehlende Benutzer-ID".to_string()))?;
    validate_user_id(&user_id)?;

    let report = archive::upload_report(blobs.as_ref(), &user_id, pdf)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store report of {}: {:?}", user_id, e);
            AppError::from(e)
        })?;

    let message = if report.created {
        "PDF gespeichert"
    } else {
        "PDF bereits gespeichert"
    };

    Ok(Json(json!({ "message": message, "url": report.url })))
}

/// Stores the final lab result and mirrors it into the CSV export.
pub async fn store_results(
    State(store): State<Arc<dyn StateStore>>,
    State(export): State<Arc<dyn ExportSink>>,
    payload: Result<Json<StoreResultsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let result = req.into_result()?;

    archive::store_result(store.as_ref(), export.as_ref(), &result)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store lab result of {}: {:?}", result.user_id, e);
            AppError::from(e)
        })?;

    Ok(Json(json!({ "message": "Ergebnisse gespeichert" })))
}

pub async fn get_lab_result(
    State(store): State<Arc<dyn StateStore>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_user_id(&user_id)?;

    let result = store
        .get_lab_result(&user_id)
        .await?
        .ok_or(AppError::NotFound("Keine Ergebnisse gefunden".to_string()))?;

    Ok(Json(result))
}

/// Downloads the CSV export.
pub async fn export_csv(
    State(export): State<Arc<dyn ExportSink>>,
) -> Result<impl IntoResponse, AppError> {
    let csv = export.render().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"labor_ergebnisse.csv\"",
            ),
        ],
        csv,
    ))
}
