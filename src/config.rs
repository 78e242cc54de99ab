/// Backend location and popup timings
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Base URL used when local storage carries no `backendUrl` override.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000/";

/// How long a popup status message stays visible.
pub const STATUS_CLEAR_AFTER: Duration = Duration::from_millis(3000);

/// Delay between a successful save and the popup closing itself.
pub const CLOSE_AFTER_SAVE: Duration = Duration::from_millis(1500);

/// Where the backend lives and how its endpoints are addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    base_url: Url,
}

impl BackendConfig {
    /// Parse a base URL. A missing trailing slash is added so endpoint
    /// joins append to the path instead of replacing its last segment.
    pub fn parse(base: &str) -> Result<Self> {
        let mut base_url = Url::parse(base).map_err(|source| Error::UrlParse {
            url: base.to_string(),
            source,
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(BackendConfig { base_url })
    }

    /// Build from an optional stored override, falling back to the default.
    pub fn from_override(stored: Option<&str>) -> Self {
        match stored.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => match Self::parse(raw) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Ignoring backendUrl override: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /get-email?user_id=<id>` with the id query-encoded
    pub fn get_email_url(&self, user_id: &str) -> Url {
        let mut url = self.endpoint("get-email");
        url.query_pairs_mut().append_pair("user_id", user_id);
        url
    }

    pub fn save_credentials_url(&self) -> Url {
        self.endpoint("save-credentials")
    }

    pub fn log_activity_url(&self) -> Url {
        self.endpoint("log-activity")
    }

    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        // base always ends with '/', so pushing the segment cannot fail for http(s)
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().push(name);
            }
            Err(()) => log::warn!("Backend url {} cannot carry a path", self.base_url),
        }
        url
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: Url::parse(DEFAULT_BACKEND_URL).expect("default backend url is valid"),
        }
    }
}
