// src/services/results.rs

use crate::{
    error::StoreError,
    models::quiz::{AnsweredQuestion, QuizState},
    storage::StateStore,
};

/// Current state, empty if the user never answered anything.
pub async fn load_state(store: &dyn StateStore, user_id: &str) -> Result<QuizState, StoreError> {
    Ok(store.get_state(user_id).await?.unwrap_or_default())
}

pub async fn total_points(store: &dyn StateStore, user_id: &str) -> Result<i64, StoreError> {
    Ok(load_state(store, user_id).await?.total_points())
}

pub async fn answered_questions(
    store: &dyn StateStore,
    user_id: &str,
) -> Result<Vec<AnsweredQuestion>, StoreError> {
    Ok(load_state(store, user_id).await?.answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStateStore;

    #[tokio::test]
    async fn unknown_users_get_empty_defaults() {
        let store = MemoryStateStore::new();
        assert_eq!(total_points(&store, "nobody").await.unwrap(), 0);
        assert!(answered_questions(&store, "nobody").await.unwrap().is_empty());
        assert_eq!(load_state(&store, "nobody").await.unwrap(), QuizState::default());
    }

    #[tokio::test]
    async fn aggregates_reflect_stored_answers() {
        let store = MemoryStateStore::new();
        for (key, points) in [("A", 10), ("B", 0)] {
            store
                .upsert_state(
                    "u1",
                    AnsweredQuestion {
                        question_key: key.to_string(),
                        prompt: "?".to_string(),
                        submitted_answer: "x".to_string(),
                        correct_answer: "y".to_string(),
                        points,
                    },
                )
                .await
                .unwrap();
        }

        assert_eq!(total_points(&store, "u1").await.unwrap(), 10);
        let keys: Vec<String> = answered_questions(&store, "u1")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.question_key)
            .collect();
        assert_eq!(keys, ["A", "B"]);
    }
}
