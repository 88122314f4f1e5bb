// src/services/archive.rs

use crate::{
    config::REPORT_DIR,
    error::StoreError,
    models::lab_result::LabResult,
    storage::{BlobStore, ExportSink, StateStore},
};

/// Where a user's lab report PDF lives in the blob store.
pub fn report_path(user_id: &str) -> String {
    format!("{}/Pruefbericht_{}.pdf", REPORT_DIR, user_id)
}

/// Outcome of a report upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedReport {
    pub url: String,
    /// False when an earlier upload was kept.
    pub created: bool,
}

/// Stores the report unless the user already has one; the first upload wins.
pub async fn upload_report(
    blobs: &dyn BlobStore,
    user_id: &str,
    bytes: Vec<u8>,
) -> Result<UploadedReport, StoreError> {
    let path = report_path(user_id);

    if let Some(url) = blobs.url_of(&path).await? {
        tracing::info!("Report for {} already stored, skipping upload", user_id);
        return Ok(UploadedReport { url, created: false });
    }

    let url = blobs.put(&path, bytes).await?;
    tracing::info!("Stored first report for {} at {}", user_id, url);
    Ok(UploadedReport { url, created: true })
}

/// Persists the final lab result and mirrors it into the export.
///
/// The stored result is authoritative: an export failure is logged, not returned.
pub async fn store_result(
    store: &dyn StateStore,
    export: &dyn ExportSink,
    result: &LabResult,
) -> Result<(), StoreError> {
    store.upsert_lab_result(result).await?;

    match export.append_if_absent(result).await {
        Ok(true) => tracing::info!("Exported lab result of {}", result.user_id),
        Ok(false) => {}
        Err(e) => tracing::error!("Failed to export lab result of {}: {}", result.user_id, e),
    }

    Ok(())
}
