/// Seams between the tracker logic and the browser host.
///
/// The browser implementations live in `chrome.rs`; tests provide mocks.
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::tab_data::{NavigationDetails, TabId, TabInfo, TabUpdate};

pub type Timestamp = DateTime<Utc>;

/// Local key-value store (`chrome.storage.local`)
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read `keys`; keys with no stored value are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    async fn set(&self, items: Map<String, Value>) -> Result<()>;
}

/// Current metadata for an open tab
#[allow(async_fn_in_trait)]
pub trait TabSource {
    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo>;
}

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Runs a task to completion in the background; the caller never awaits it.
pub trait Spawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

pub type Handler<T> = Box<dyn FnMut(T)>;

/// Browser event subscriptions used by the background worker
pub trait BrowserEvents {
    fn on_active_tab_changed(&self, handler: Handler<TabUpdate>);
    fn on_tab_navigated(&self, handler: Handler<NavigationDetails>);
    fn on_tab_closed(&self, handler: Handler<TabId>);
    fn on_host_started(&self, handler: Box<dyn FnMut()>);

    /// Deliver events that arrived before the handlers were attached, then
    /// pass new ones straight through.
    fn resume(&self);
}
