use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    catalog::Catalog,
    config::{CSV_FILE_NAME, Config, ExportMode},
    storage::{
        BlobCsvExport, BlobStore, ExportSink, RenderedCsvExport, StateStore, TimedStateStore,
        blob::TimedBlobStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub export: Arc<dyn ExportSink>,
    pub catalog: Arc<Catalog>,
    pub config: Config,
}

impl AppState {
    /// Wires the stores together.
    /// Every store and blob call is bounded by `config.store_timeout`.
    pub fn new(
        config: Config,
        store: Arc<dyn StateStore>,
        blobs: Arc<dyn BlobStore>,
        catalog: Catalog,
    ) -> Self {
        let store: Arc<dyn StateStore> = Arc::new(TimedStateStore::new(store, config.store_timeout));
        let blobs: Arc<dyn BlobStore> = Arc::new(TimedBlobStore::new(blobs, config.store_timeout));

        let export: Arc<dyn ExportSink> = match config.export_mode {
            ExportMode::Blob => Arc::new(BlobCsvExport::new(blobs.clone(), CSV_FILE_NAME)),
            ExportMode::Rendered => Arc::new(RenderedCsvExport::new(store.clone())),
        };

        Self {
            store,
            blobs,
            export,
            catalog: Arc::new(catalog),
            config,
        }
    }
}

impl FromRef<AppState> for Arc<dyn StateStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<dyn BlobStore> {
    fn from_ref(state: &AppState) -> Self {
        state.blobs.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ExportSink> {
    fn from_ref(state: &AppState) -> Self {
        state.export.clone()
    }
}

impl FromRef<AppState> for Arc<Catalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}
