// src/storage/export.rs

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::StoreError,
    models::lab_result::LabResult,
    storage::{BlobStore, StateStore},
};

pub const CSV_HEADER: [&str; 5] = [
    "Matrikelnummer",
    "Quiz-Punkte",
    "Optimaler Bitumengehalt",
    "Maximale Raumdichte",
    "Datum",
];

/// Mirror of the lab results as a CSV file. At most one row per user.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Adds the row unless the user already has one. Returns whether it was added.
    async fn append_if_absent(&self, row: &LabResult) -> Result<bool, StoreError>;

    /// The complete CSV document.
    async fn render(&self) -> Result<String, StoreError>;
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn into_text(writer: csv::Writer<Vec<u8>>) -> Result<String, StoreError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::Corrupt(format!("flushing CSV failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Renders a full CSV document, header first.
pub fn render_csv(rows: &[LabResult]) -> Result<String, StoreError> {
    let mut writer = csv_writer();
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record(row.csv_record())?;
    }
    into_text(writer)
}

fn render_row(row: &LabResult) -> Result<String, StoreError> {
    let mut writer = csv_writer();
    writer.write_record(row.csv_record())?;
    into_text(writer)
}

/// True if some line of `content` belongs to `user_id`.
pub fn contains_user(content: &str, user_id: &str) -> bool {
    let prefix = format!("{},", user_id);
    content.lines().any(|line| line.starts_with(&prefix))
}

/// Export kept as one shared CSV blob.
///
/// The blob has no append primitive, so every write replaces it whole.
/// Writers inside this process are serialized by `writer`; separate
/// processes sharing the blob can still lose rows.
pub struct BlobCsvExport {
    blobs: Arc<dyn BlobStore>,
    path: String,
    writer: Mutex<()>,
}

impl BlobCsvExport {
    pub fn new(blobs: Arc<dyn BlobStore>, path: impl Into<String>) -> Self {
        Self {
            blobs,
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<String, StoreError> {
        match self.blobs.get(&self.path).await? {
            Some(bytes) => String::from_utf8(bytes)
                .map_err(|e| StoreError::Corrupt(format!("{} is not UTF-8: {}", self.path, e))),
            None => render_csv(&[]),
        }
    }
}

#[async_trait]
impl ExportSink for BlobCsvExport {
    async fn append_if_absent(&self, row: &LabResult) -> Result<bool, StoreError> {
        let _guard = self.writer.lock().await;

        let mut content = self.load().await?;
        if contains_user(&content, &row.user_id) {
            tracing::info!("User {} already present in {}, skipping", row.user_id, self.path);
            return Ok(false);
        }

        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&render_row(row)?);

        self.blobs.put(&self.path, content.into_bytes()).await?;
        tracing::info!("Appended user {} to {}", row.user_id, self.path);
        Ok(true)
    }

    async fn render(&self) -> Result<String, StoreError> {
        self.load().await
    }
}

/// Export kept as one row per user in the state store, turned into CSV on read.
pub struct RenderedCsvExport {
    store: Arc<dyn StateStore>,
}

impl RenderedCsvExport {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ExportSink for RenderedCsvExport {
    async fn append_if_absent(&self, row: &LabResult) -> Result<bool, StoreError> {
        let inserted = self.store.insert_export_row_if_absent(row).await?;
        if !inserted {
            tracing::info!("User {} already has an export row, skipping", row.user_id);
        }
        Ok(inserted)
    }

    async fn render(&self) -> Result<String, StoreError> {
        let rows = self.store.list_export_rows().await?;
        render_csv(&rows)
    }
}
