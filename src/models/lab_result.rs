// src/models/lab_result.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::AppError, models::user::USER_ID_RE};

/// Final result of a user's lab session.
/// Also the shape of one row in the CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LabResult {
    #[serde(rename = "userId")]
    pub user_id: String,

    #[serde(rename = "punkte")]
    pub points: i64,

    #[serde(rename = "optimalerBitumengehalt")]
    pub optimal_binder_content: f64,

    #[serde(rename = "maximaleRaumdichte")]
    pub max_bulk_density: f64,

    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

impl LabResult {
    /// Fields in CSV column order.
    pub fn csv_record(&self) -> [String; 5] {
        [
            self.user_id.clone(),
            self.points.to_string(),
            self.optimal_binder_content.to_string(),
            self.max_bulk_density.to_string(),
            self.recorded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ]
    }
}

/// DTO for `POST /api/storeResults`.
#[derive(Debug, Deserialize, Validate)]
pub struct StoreResultsRequest {
    #[serde(rename = "userId")]
    #[validate(regex(path = *USER_ID_RE))]
    pub user_id: Option<String>,

    #[validate(range(min = 0))]
    pub punkte: Option<i64>,

    #[serde(rename = "optimalerBitumengehalt")]
    pub optimaler_bitumengehalt: Option<f64>,

    #[serde(rename = "maximaleRaumdichte")]
    pub maximale_raumdichte: Option<f64>,
}

impl StoreResultsRequest {
    /// Validates the payload and stamps it with the current time.
    pub fn into_result(self) -> Result<LabResult, AppError> {
        self.validate()?;
        let (Some(user_id), Some(points), Some(optimal_binder_content), Some(max_bulk_density)) = (
            self.user_id,
            self.punkte,
            self.optimaler_bitumengehalt,
            self.maximale_raumdichte,
        ) else {
            return Err(AppError::BadRequest("Fehlende Daten".to_string()));
        };

        if !optimal_binder_content.is_finite() || !max_bulk_density.is_finite() {
            return Err(AppError::BadRequest("Ungültige Messwerte".to_string()));
        }

        Ok(LabResult {
            user_id,
            points,
            optimal_binder_content,
            max_bulk_density,
            recorded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn csv_record_uses_iso_timestamp() {
        let result = LabResult {
            user_id: "01234567".to_string(),
            points: 60,
            optimal_binder_content: 5.2,
            max_bulk_density: 2.45,
            recorded_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap(),
        };
        assert_eq!(
            result.csv_record(),
            [
                "01234567".to_string(),
                "60".to_string(),
                "5.2".to_string(),
                "2.45".to_string(),
                "2025-03-01T12:30:00.000Z".to_string(),
            ]
        );
    }

    #[test]
    fn zero_values_are_not_missing() {
        let req: StoreResultsRequest = serde_json::from_str(
            r#"{"userId": "1", "punkte": 0, "optimalerBitumengehalt": 0, "maximaleRaumdichte": 0}"#,
        )
        .unwrap();
        let result = req.into_result().unwrap();
        assert_eq!(result.points, 0);
    }

    #[test]
    fn missing_measurement_is_rejected() {
        let req: StoreResultsRequest =
            serde_json::from_str(r#"{"userId": "1", "punkte": 40, "optimalerBitumengehalt": 5.1}"#)
                .unwrap();
        assert!(matches!(req.into_result(), Err(AppError::BadRequest(_))));
    }
}
