/// Popup logic: load the stored identity, refresh it from the backend,
/// validate and save new credentials.
use std::time::Duration;

use crate::backend::CredentialsApi;
use crate::config::CLOSE_AFTER_SAVE;
use crate::error::Result;
use crate::host::KeyValueStore;
use crate::identity::Identity;
use crate::storage::{StoredIdentity, load_identity, save_identity};

pub const SAVE_SUCCEEDED: &str = "Credentials saved successfully!";
pub const SAVE_FAILED: &str = "Failed to save credentials. Check console.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Error,
}

impl StatusTone {
    pub fn color(&self) -> &'static str {
        match self {
            StatusTone::Success => "green",
            StatusTone::Error => "red",
        }
    }
}

/// Transient inline message under the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub tone: StatusTone,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        StatusMessage {
            text: text.into(),
            tone: StatusTone::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        StatusMessage {
            text: text.into(),
            tone: StatusTone::Error,
        }
    }
}

/// What the popup should show after a submit
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub status: StatusMessage,
    /// Close the popup after this delay
    pub close_after: Option<Duration>,
}

pub struct Registrar<S, B> {
    store: S,
    backend: B,
}

impl<S: KeyValueStore, B: CredentialsApi> Registrar<S, B> {
    pub fn new(store: S, backend: B) -> Self {
        Registrar { store, backend }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Identity to prefill the form with; unreadable storage counts as empty.
    pub async fn stored_identity(&self) -> StoredIdentity {
        match load_identity(&self.store).await {
            Ok(identity) => identity,
            Err(e) => {
                log::warn!("Could not read stored identity: {}", e);
                StoredIdentity::default()
            }
        }
    }

    /// Email the backend holds for `user_id`. Failures are logged and yield `None`.
    pub async fn refresh_email(&self, user_id: &str) -> Option<String> {
        match self.backend.fetch_email(user_id).await {
            Ok(email) => email,
            Err(e) => {
                log::info!("Error fetching email: {}", e);
                None
            }
        }
    }

    pub async fn submit(&self, user_id: &str, email: &str) -> SubmitOutcome {
        let identity = match Identity::from_form(user_id, email) {
            Ok(identity) => identity,
            Err(invalid) => {
                return SubmitOutcome {
                    status: StatusMessage::error(invalid.to_string()),
                    close_after: None,
                };
            }
        };

        match self.register(&identity).await {
            Ok(()) => SubmitOutcome {
                status: StatusMessage::success(SAVE_SUCCEEDED),
                close_after: Some(CLOSE_AFTER_SAVE),
            },
            Err(e) => {
                log::error!("Save failed: {}", e);
                SubmitOutcome {
                    status: StatusMessage::error(SAVE_FAILED),
                    close_after: None,
                }
            }
        }
    }

    /// Save on the backend first; only a confirmed save is persisted locally.
    async fn register(&self, identity: &Identity) -> Result<()> {
        self.backend.save_credentials(identity).await?;
        save_identity(&self.store, identity).await
    }
}
