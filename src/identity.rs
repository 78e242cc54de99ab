/// User identity and popup form validation
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The user id + email pair registered with the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

impl Identity {
    /// Trim and validate raw form input.
    pub fn from_form(user_id: &str, email: &str) -> Result<Identity, ValidationError> {
        let user_id = user_id.trim();
        let email = email.trim();

        if user_id.is_empty() || email.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Identity {
            user_id: user_id.to_string(),
            email: email.to_string(),
        })
    }
}

/// `local-part@domain.tld`: no whitespace, no extra `@`, a dot after the `@`
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
        .is_match(email)
}
