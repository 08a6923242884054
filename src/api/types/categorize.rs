//! Categorization request and response bodies

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ApiError;

/// Letters, digits, whitespace and basic punctuation
static TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9\s\.,!?-]+$").expect("title pattern is a valid regex")
});

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategorizeRequest {
    pub user_id: i64,
    pub title: String,
}

impl CategorizeRequest {
    /// Checks the title against the accepted character set
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::bad_request("Title must not be empty").with_param("title"));
        }

        if !TITLE_PATTERN.is_match(&self.title) {
            return Err(ApiError::bad_request(
                "Title may only contain letters, digits, spaces and . , ! ? -",
            )
            .with_param("title"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategorizeResponse {
    pub user_id: i64,
    pub title: String,
    pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str) -> CategorizeRequest {
        CategorizeRequest {
            user_id: 1,
            title: title.to_string(),
        }
    }

    #[test]
    fn test_accepts_plain_titles() {
        assert!(request("Senior Software Engineer").validate().is_ok());
        assert!(request("Plumber, Gas-Safe certified!").validate().is_ok());
        assert!(request("Chef? 2nd shift.").validate().is_ok());
    }

    #[test]
    fn test_rejects_disallowed_characters() {
        for title in ["<script>", "C++ developer", "R&D lead", "Ingénieur"] {
            let err = request(title).validate().unwrap_err();
            assert_eq!(err.response.error.param, Some("title".to_string()));
        }
    }

    #[test]
    fn test_rejects_blank_title() {
        assert!(request("").validate().is_err());
        assert!(request("   ").validate().is_err());
    }
}
