// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

/// Matriculation numbers and similar opaque ids.
/// Commas and slashes are excluded since ids end up in CSV rows and blob paths.
pub static USER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,64}$").expect("user id pattern is valid"));

/// Checks a user id taken from a URL path.
pub fn validate_user_id(user_id: &str) -> Result<(), AppError> {
    if USER_ID_RE.is_match(user_id) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Ungültige Benutzer-ID '{}'", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matriculation_numbers() {
        assert!(validate_user_id("01234567").is_ok());
        assert!(validate_user_id("e1234567.tu-wien_x").is_ok());
    }

    #[test]
    fn rejects_separators_and_empty_ids() {
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("12,34").is_err());
        assert!(validate_user_id("../etc").is_err());
        assert!(validate_user_id(&"9".repeat(65)).is_err());
    }
}
