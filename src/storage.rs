/// Typed access to chrome.storage.local
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::host::KeyValueStore;
use crate::identity::Identity;

pub const USER_ID_KEY: &str = "userId";
pub const EMAIL_KEY: &str = "email";
pub const INITIALIZED_KEY: &str = "initialized";
pub const BACKEND_URL_KEY: &str = "backendUrl";

/// Placeholder sent for identity fields that were never stored
pub const UNKNOWN: &str = "Unknown";

/// Identity as it sits in local storage; either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl StoredIdentity {
    /// Stored user id, if it is non-empty
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Stored email, if it is non-empty
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|s| !s.is_empty())
    }

    pub fn user_id_or_unknown(&self) -> &str {
        self.user_id().unwrap_or(UNKNOWN)
    }

    pub fn email_or_unknown(&self) -> &str {
        self.email().unwrap_or(UNKNOWN)
    }
}

impl From<&Identity> for StoredIdentity {
    fn from(identity: &Identity) -> Self {
        StoredIdentity {
            user_id: Some(identity.user_id.clone()),
            email: Some(identity.email.clone()),
        }
    }
}

pub async fn load_identity<S: KeyValueStore>(store: &S) -> Result<StoredIdentity> {
    let items = store.get(&[USER_ID_KEY, EMAIL_KEY]).await?;
    serde_json::from_value(Value::Object(items)).map_err(|e| Error::Decode {
        what: "stored identity",
        detail: e.to_string(),
    })
}

pub async fn save_identity<S: KeyValueStore>(store: &S, identity: &Identity) -> Result<()> {
    let items = match serde_json::to_value(StoredIdentity::from(identity)) {
        Ok(Value::Object(items)) => items,
        Ok(other) => {
            return Err(Error::Decode {
                what: "stored identity",
                detail: format!("expected an object, got {}", other),
            });
        }
        Err(e) => {
            return Err(Error::Decode {
                what: "stored identity",
                detail: e.to_string(),
            });
        }
    };
    store.set(items).await
}

/// Record that the worker has started at least once. Idempotent.
pub async fn mark_initialized<S: KeyValueStore>(store: &S) -> Result<()> {
    let mut items = Map::new();
    items.insert(INITIALIZED_KEY.to_string(), json!(true));
    store.set(items).await
}

/// Backend config with the stored `backendUrl` override applied.
/// Storage failures fall back to the default.
pub async fn load_backend_config<S: KeyValueStore>(store: &S) -> BackendConfig {
    match store.get(&[BACKEND_URL_KEY]).await {
        Ok(items) => BackendConfig::from_override(items.get(BACKEND_URL_KEY).and_then(Value::as_str)),
        Err(e) => {
            log::warn!("Could not read backend override: {}", e);
            BackendConfig::default()
        }
    }
}
