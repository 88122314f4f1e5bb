// src/storage/mod.rs

//! Persistence seams.
//!
//! The quiz and archive logic is written once against [`StateStore`],
//! [`BlobStore`] and [`ExportSink`]. Every implementation must make its
//! mutating calls atomic per user, since concurrent requests for the same
//! user are coordinated only through the store.

pub mod blob;
pub mod export;
pub mod memory;
pub mod postgres;

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    error::StoreError,
    models::{
        lab_result::LabResult,
        quiz::{AnsweredQuestion, QuizState, StateUpdate},
    },
};

pub use blob::{BlobStore, LocalBlobStore, MemoryBlobStore};
pub use export::{BlobCsvExport, ExportSink, RenderedCsvExport};
pub use memory::MemoryStateStore;
pub use postgres::PgStateStore;

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get_assignment(&self, user_id: &str) -> Result<Option<Vec<String>>, StoreError>;

    /// Stores `keys` unless the user already has an assignment.
    /// Returns whichever assignment is committed afterwards.
    async fn create_assignment_if_absent(
        &self,
        user_id: &str,
        keys: &[String],
    ) -> Result<Vec<String>, StoreError>;

    async fn get_state(&self, user_id: &str) -> Result<Option<QuizState>, StoreError>;

    /// Atomically appends `answer` unless its question key is already present.
    async fn upsert_state(
        &self,
        user_id: &str,
        answer: AnsweredQuestion,
    ) -> Result<StateUpdate, StoreError>;

    /// Inserts or fully replaces the user's lab result.
    async fn upsert_lab_result(&self, result: &LabResult) -> Result<(), StoreError>;

    async fn get_lab_result(&self, user_id: &str) -> Result<Option<LabResult>, StoreError>;

    /// First writer wins. Returns false when the user already has a row.
    async fn insert_export_row_if_absent(&self, row: &LabResult) -> Result<bool, StoreError>;

    /// All export rows, oldest first.
    async fn list_export_rows(&self) -> Result<Vec<LabResult>, StoreError>;
}

/// Runs a storage future with a deadline.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// Wraps a `StateStore` so no call can hang a request.
pub struct TimedStateStore {
    inner: Arc<dyn StateStore>,
    limit: Duration,
}

impl TimedStateStore {
    pub fn new(inner: Arc<dyn StateStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl StateStore for TimedStateStore {
    async fn get_assignment(&self, user_id: &str) -> Result<Option<Vec<String>>, StoreError> {
        bounded(self.limit, self.inner.get_assignment(user_id)).await
    }

    async fn create_assignment_if_absent(
        &self,
        user_id: &str,
        keys: &[String],
    ) -> Result<Vec<String>, StoreError> {
        bounded(self.limit, self.inner.create_assignment_if_absent(user_id, keys)).await
    }

    async fn get_state(&self, user_id: &str) -> Result<Option<QuizState>, StoreError> {
        bounded(self.limit, self.inner.get_state(user_id)).await
    }

    async fn upsert_state(
        &self,
        user_id: &str,
        answer: AnsweredQuestion,
    ) -> Result<StateUpdate, StoreError> {
        bounded(self.limit, self.inner.upsert_state(user_id, answer)).await
    }

    async fn upsert_lab_result(&self, result: &LabResult) -> Result<(), StoreError> {
        bounded(self.limit, self.inner.upsert_lab_result(result)).await
    }

    async fn get_lab_result(&self, user_id: &str) -> Result<Option<LabResult>, StoreError> {
        bounded(self.limit, self.inner.get_lab_result(user_id)).await
    }

    async fn insert_export_row_if_absent(&self, row: &LabResult) -> Result<bool, StoreError> {
        bounded(self.limit, self.inner.insert_export_row_if_absent(row)).await
    }

    async fn list_export_rows(&self) -> Result<Vec<LabResult>, StoreError> {
        bounded(self.limit, self.inner.list_export_rows()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StalledStore;

    #[async_trait]
    impl StateStore for StalledStore {
        async fn get_assignment(&self, _: &str) -> Result<Option<Vec<String>>, StoreError> {
            std::future::pending().await
        }

        async fn create_assignment_if_absent(
            &self,
            _: &str,
            keys: &[String],
        ) -> Result<Vec<String>, StoreError> {
            Ok(keys.to_vec())
        }

        async fn get_state(&self, _: &str) -> Result<Option<QuizState>, StoreError> {
            std::future::pending().await
        }

        async fn upsert_state(
            &self,
            _: &str,
            _: AnsweredQuestion,
        ) -> Result<StateUpdate, StoreError> {
            std::future::pending().await
        }

        async fn upsert_lab_result(&self, _: &LabResult) -> Result<(), StoreError> {
            Ok(())
        }

        async fn get_lab_result(&self, _: &str) -> Result<Option<LabResult>, StoreError> {
            Ok(None)
        }

        async fn insert_export_row_if_absent(&self, _: &LabResult) -> Result<bool, StoreError> {
            Ok(true)
        }

        async fn list_export_rows(&self) -> Result<Vec<LabResult>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn stalled_reads_time_out() {
        let store = TimedStateStore::new(Arc::new(StalledStore), Duration::from_millis(20));

        let err = store.get_state("42").await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_millis(20)));

        let err = store.get_assignment("42").await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let store = TimedStateStore::new(Arc::new(StalledStore), Duration::from_millis(20));
        let keys = vec!["A".to_string()];
        assert_eq!(store.create_assignment_if_absent("42", &keys).await.unwrap(), keys);
    }
}
