/// Error types for the tracker and the popup registrar
use thiserror::Error;

/// Bad form input. The only error class shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Invalid email format")]
    InvalidEmail,
}

/// Failures that are logged and otherwise swallowed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("network request to {url} failed: {detail}")]
    Network { url: String, detail: String },

    #[error("HTTP error! status: {status} ({url})")]
    HttpStatus { url: String, status: u16 },

    #[error("local storage access failed: {0}")]
    Storage(String),

    #[error("could not parse url {url:?}: {source}")]
    UrlParse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("tab {tab_id} lookup failed: {detail}")]
    Tab { tab_id: i32, detail: String },

    #[error("failed to decode {what}: {detail}")]
    Decode { what: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_user_facing() {
        assert_eq!(ValidationError::MissingFields.to_string(), "Please fill in all fields");
        assert_eq!(ValidationError::InvalidEmail.to_string(), "Invalid email format");
    }

    #[test]
    fn test_http_status_display() {
        let err = Error::HttpStatus {
            url: "http://127.0.0.1:5000/log-activity".to_string(),
            status: 500,
        };
        assert!(err.to_string().contains("status: 500"));
    }
}
