/// Active-tab cursor and the session records it produces
use chrono::SecondsFormat;
use serde::Serialize;

use crate::domain::normalize_hostname;
use crate::error::Result;
use crate::host::Timestamp;
use crate::storage::{StoredIdentity, UNKNOWN};
use crate::tab_data::{TabCache, TabId, TabInfo, TabUpdate};

/// Why a tracked interval ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    TabSwitch,
    TabClose,
}

/// Time spent on one tab, produced when the tab stops being the tracked one.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub tab_id: TabId,
    /// Full URL from the tab cache, or `"Unknown"`
    pub url: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub kind: SessionKind,
}

impl Session {
    /// Build the wire record, normalizing the URL to its hostname.
    pub fn to_record(&self, identity: &StoredIdentity) -> Result<ActivityRecord> {
        Ok(ActivityRecord {
            user_id: identity.user_id_or_unknown().to_string(),
            email: identity.email_or_unknown().to_string(),
            url: normalize_hostname(&self.url)?,
            start_time: format_timestamp(&self.start_time),
            end_time: format_timestamp(&self.end_time),
            activity_type: self.kind,
        })
    }
}

/// JSON body of `POST /log-activity`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub user_id: String,
    pub email: String,
    pub url: String,
    pub start_time: String,
    pub end_time: String,
    pub activity_type: SessionKind,
}

/// `2024-10-28T10:30:00.000Z`
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Which tab is being timed, and since when
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Idle,
    Tracking { tab_id: TabId, since: Timestamp },
}

/// State machine over tab navigation and removal events.
///
/// Every method runs to completion without suspending; the caller emits the
/// returned sessions afterwards.
#[derive(Debug, Clone, Default)]
pub struct TabActivityTracker {
    cursor: Cursor,
    tabs: TabCache,
}

impl TabActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        match self.cursor {
            Cursor::Idle => None,
            Cursor::Tracking { tab_id, .. } => Some(tab_id),
        }
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        match self.cursor {
            Cursor::Idle => None,
            Cursor::Tracking { since, .. } => Some(since),
        }
    }

    pub fn tabs(&self) -> &TabCache {
        &self.tabs
    }

    /// Cache the new URL of the active tab. Returns whether the cache changed.
    pub fn tab_updated(&mut self, update: &TabUpdate) -> bool {
        if !update.is_active_url_change() {
            return false;
        }
        self.tabs
            .insert(update.tab_id, TabInfo::new(update.url.clone(), update.title.clone()));
        true
    }

    /// A top-level navigation finished in `tab_id`, whose current metadata is `info`.
    ///
    /// Switching away from a different tracked tab closes its session.
    /// Navigating inside the tracked tab restarts its clock without a record.
    pub fn navigation_completed(
        &mut self,
        tab_id: TabId,
        info: TabInfo,
        now: Timestamp,
    ) -> Option<Session> {
        self.tabs.insert(tab_id, info);

        let finished = match self.cursor {
            Cursor::Tracking {
                tab_id: previous,
                since,
            } if previous != tab_id => Some(self.finish(previous, since, now, SessionKind::TabSwitch)),
            _ => None,
        };

        self.cursor = Cursor::Tracking { tab_id, since: now };
        finished
    }

    /// A tab closed. Only the tracked tab produces a session and leaves the cache.
    pub fn tab_removed(&mut self, tab_id: TabId, now: Timestamp) -> Option<Session> {
        match self.cursor {
            Cursor::Tracking {
                tab_id: tracked,
                since,
            } if tracked == tab_id => {
                let session = self.finish(tracked, since, now, SessionKind::TabClose);
                self.cursor = Cursor::Idle;
                self.tabs.remove(tab_id);
                Some(session)
            }
            _ => None,
        }
    }

    fn finish(&self, tab_id: TabId, since: Timestamp, now: Timestamp, kind: SessionKind) -> Session {
        let url = self
            .tabs
            .get(tab_id)
            .map(|info| info.url.clone())
            .unwrap_or_else(|| UNKNOWN.to_string());

        Session {
            tab_id,
            url,
            start_time: since,
            end_time: now,
            kind,
        }
    }
}
