// src/services/quiz.rs

use rand::{Rng, seq::SliceRandom};

use crate::{
    catalog::Catalog,
    config::QUIZ_QUESTION_COUNT,
    error::StoreError,
    models::quiz::AnsweredQuestion,
    storage::StateStore,
};

const UNKNOWN_PROMPT: &str = "Unbekannte Frage";
const UNKNOWN_ANSWER: &str = "Keine Daten";

/// Outcome of a single answer submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// False when the question had been answered before.
    pub accepted: bool,
    pub points_delta: i64,
    pub total_points: i64,
}

/// The question a user should see next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextQuestion {
    Pending(String),
    Done,
}

/// Draws `count` distinct keys uniformly without replacement.
/// Uses a partial Fisher–Yates shuffle; fewer keys are returned if the catalog is smaller.
pub fn draw_assignment<R: Rng + ?Sized>(catalog: &Catalog, count: usize, rng: &mut R) -> Vec<String> {
    let mut keys = catalog.keys();
    let count = count.min(keys.len());
    let (picked, _) = keys.partial_shuffle(rng, count);
    picked.to_vec()
}

/// Returns the user's question subset, drawing and persisting one on first contact.
pub async fn get_assignment(
    store: &dyn StateStore,
    catalog: &Catalog,
    user_id: &str,
) -> Result<Vec<String>, StoreError> {
    if let Some(keys) = store.get_assignment(user_id).await? {
        return Ok(keys);
    }

    let drawn = draw_assignment(catalog, QUIZ_QUESTION_COUNT, &mut rand::thread_rng());
    let committed = store.create_assignment_if_absent(user_id, &drawn).await?;
    if committed != drawn {
        tracing::debug!("Concurrent assignment for {} won, using committed one", user_id);
    } else {
        tracing::info!("Assigned {} questions to {}", committed.len(), user_id);
    }
    Ok(committed)
}

/// First assigned question without an answer.
pub async fn next_question(
    store: &dyn StateStore,
    catalog: &Catalog,
    user_id: &str,
) -> Result<NextQuestion, StoreError> {
    let assignment = get_assignment(store, catalog, user_id).await?;
    let state = store.get_state(user_id).await?.unwrap_or_default();

    Ok(assignment
        .into_iter()
        .find(|key| !state.has_answered(key))
        .map_or(NextQuestion::Done, NextQuestion::Pending))
}

/// Grades an answer against the catalog.
/// Unknown keys are recorded with zero points instead of being rejected.
pub fn grade(catalog: &Catalog, question_key: &str, answer: &str) -> AnsweredQuestion {
    match catalog.get(question_key) {
        Some(entry) => AnsweredQuestion {
            question_key: question_key.to_string(),
            prompt: entry.prompt.clone(),
            submitted_answer: answer.to_string(),
            correct_answer: entry.answer.clone(),
            points: if entry.answer == answer { entry.points } else { 0 },
        },
        None => AnsweredQuestion {
            question_key: question_key.to_string(),
            prompt: UNKNOWN_PROMPT.to_string(),
            submitted_answer: answer.to_string(),
            correct_answer: UNKNOWN_ANSWER.to_string(),
            points: 0,
        },
    }
}

/// Records an answer once per question and returns the new total.
pub async fn submit_answer(
    store: &dyn StateStore,
    catalog: &Catalog,
    user_id: &str,
    question_key: &str,
    answer: &str,
) -> Result<SubmitOutcome, StoreError> {
    if catalog.get(question_key).is_none() {
        tracing::warn!("User {} answered unknown question '{}'", user_id, question_key);
    }

    let record = grade(catalog, question_key, answer);
    let points = record.points;
    let update = store.upsert_state(user_id, record).await?;

    if !update.inserted {
        tracing::info!("User {} already answered '{}', ignoring", user_id, question_key);
    }

    Ok(SubmitOutcome {
        accepted: update.inserted,
        points_delta: if update.inserted { points } else { 0 },
        total_points: update.state.total_points(),
    })
}
