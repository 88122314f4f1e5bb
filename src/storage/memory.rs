// src/storage/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::StoreError,
    models::{
        lab_result::LabResult,
        quiz::{AnsweredQuestion, QuizState, StateUpdate},
    },
    storage::StateStore,
};

#[derive(Default)]
struct Tables {
    assignments: HashMap<String, Vec<String>>,
    states: HashMap<String, QuizState>,
    lab_results: HashMap<String, LabResult>,
    export_rows: Vec<LabResult>,
}

/// In-process `StateStore`.
///
/// A single mutex makes every call one atomic read-modify-write.
/// Data is lost on restart.
#[derive(Default)]
pub struct MemoryStateStore {
    tables: Mutex<Tables>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_assignment(&self, user_id: &str) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self.tables.lock().await.assignments.get(user_id).cloned())
    }

    async fn create_assignment_if_absent(
        &self,
        user_id: &str,
        keys: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let mut tables = self.tables.lock().await;
        let committed = tables
            .assignments
            .entry(user_id.to_string())
            .or_insert_with(|| keys.to_vec());
        Ok(committed.clone())
    }

    async fn get_state(&self, user_id: &str) -> Result<Option<QuizState>, StoreError> {
        Ok(self.tables.lock().await.states.get(user_id).cloned())
    }

    async fn upsert_state(
        &self,
        user_id: &str,
        answer: AnsweredQuestion,
    ) -> Result<StateUpdate, StoreError> {
        let mut tables = self.tables.lock().await;
        let state = tables.states.entry(user_id.to_string()).or_default();

        let inserted = !state.has_answered(&answer.question_key);
        if inserted {
            state.answered.push(answer);
        }

        Ok(StateUpdate {
            inserted,
            state: state.clone(),
        })
    }

    async fn upsert_lab_result(&self, result: &LabResult) -> Result<(), StoreError> {
        self.tables
            .lock()
            .await
            .lab_results
            .insert(result.user_id.clone(), result.clone());
        Ok(())
    }

    async fn get_lab_result(&self, user_id: &str) -> Result<Option<LabResult>, StoreError> {
        Ok(self.tables.lock().await.lab_results.get(user_id).cloned())
    }

    async fn insert_export_row_if_absent(&self, row: &LabResult) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.export_rows.iter().any(|r| r.user_id == row.user_id) {
            return Ok(false);
        }
        tables.export_rows.push(row.clone());
        Ok(true)
    }

    async fn list_export_rows(&self) -> Result<Vec<LabResult>, StoreError> {
        Ok(self.tables.lock().await.export_rows.clone())
    }
}
