// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::AppError, models::user::USER_ID_RE};

/// A graded answer as stored for a user.
/// Serialized with the field names the front end reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnsweredQuestion {
    #[serde(rename = "raum")]
    pub question_key: String,

    #[serde(rename = "frage")]
    pub prompt: String,

    #[serde(rename = "gegebeneAntwort")]
    pub submitted_answer: String,

    #[serde(rename = "richtigeAntwort")]
    pub correct_answer: String,

    #[serde(rename = "punkte")]
    pub points: i64,
}

/// Per-user quiz progress.
///
/// The total is always derived from `answered`, never stored next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizState {
    pub answered: Vec<AnsweredQuestion>,
}

impl QuizState {
    pub fn total_points(&self) -> i64 {
        self.answered.iter().map(|a| a.points).sum()
    }

    pub fn has_answered(&self, question_key: &str) -> bool {
        self.answered.iter().any(|a| a.question_key == question_key)
    }
}

/// Result of merging one answer into a user's state.
#[derive(Debug, Clone)]
pub struct StateUpdate {
    /// False when the question had already been answered.
    pub inserted: bool,
    pub state: QuizState,
}

/// DTO for `POST /api/quiz`.
/// Fields are optional so a missing field is reported as 400, not 422.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    #[validate(regex(path = *USER_ID_RE))]
    pub user_id: Option<String>,

    #[validate(length(max = 200))]
    pub raum: Option<String>,

    #[validate(length(max = 2000))]
    pub auswahl: Option<String>,
}

/// A validated answer submission.
#[derive(Debug)]
pub struct AnswerSubmission {
    pub user_id: String,
    pub question_key: String,
    pub answer: String,
}

impl SubmitAnswerRequest {
    pub fn into_submission(self) -> Result<AnswerSubmission, AppError> {
        self.validate()?;
        let (Some(user_id), Some(question_key), Some(answer)) = (self.user_id, self.raum, self.auswahl)
        else {
            return Err(AppError::BadRequest("Fehlende Daten".to_string()));
        };
        Ok(AnswerSubmission {
            user_id,
            question_key,
            answer,
        })
    }
}

/// Response of `POST /api/quiz`.
#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub message: &'static str,
    /// Running total after this submission.
    pub punkte: i64,
    pub accepted: bool,
    /// Points awarded by this submission.
    pub vergeben: i64,
}

/// Response of `GET /api/quizErgebnisse/{userId}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultsResponse {
    pub ergebnisse: Vec<AnsweredQuestion>,
    pub gesamt_punkte: i64,
}

impl From<QuizState> for QuizResultsResponse {
    fn from(state: QuizState) -> Self {
        Self {
            gesamt_punkte: state.total_points(),
            ergebnisse: state.answered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answered(key: &str, points: i64) -> AnsweredQuestion {
        AnsweredQuestion {
            question_key: key.to_string(),
            prompt: "?".to_string(),
            submitted_answer: "x".to_string(),
            correct_answer: "x".to_string(),
            points,
        }
    }

    #[test]
    fn total_is_sum_of_points() {
        let state = QuizState {
            answered: vec![answered("A", 10), answered("B", 0), answered("C", 10)],
        };
        assert_eq!(state.total_points(), 20);
        assert!(state.has_answered("B"));
        assert!(!state.has_answered("D"));
    }

    #[test]
    fn answered_question_uses_front_end_field_names() {
        let json = serde_json::to_value(answered("Mischer", 10)).unwrap();
        assert_eq!(json["raum"], "Mischer");
        assert_eq!(json["gegebeneAntwort"], "x");
        assert_eq!(json["richtigeAntwort"], "x");
        assert_eq!(json["punkte"], 10);
    }

    #[test]
    fn missing_fields_are_rejected() {
        let req: SubmitAnswerRequest =
            serde_json::from_str(r#"{"userId": "12345", "raum": "WPK"}"#).unwrap();
        assert!(matches!(req.into_submission(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn malformed_user_id_is_rejected() {
        let req: SubmitAnswerRequest =
            serde_json::from_str(r#"{"userId": "a,b", "raum": "WPK", "auswahl": "x"}"#).unwrap();
        assert!(matches!(req.into_submission(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn complete_request_becomes_submission() {
        let req: SubmitAnswerRequest =
            serde_json::from_str(r#"{"userId": "12345", "raum": "WPK", "auswahl": "x"}"#).unwrap();
        let sub = req.into_submission().unwrap();
        assert_eq!(sub.user_id, "12345");
        assert_eq!(sub.question_key, "WPK");
    }
}
