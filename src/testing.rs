/// In-memory hosts for unit tests
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};
use futures::executor::block_on;
use futures::future::LocalBoxFuture;
use serde_json::{Map, Value};

use crate::backend::{ActivityLog, HttpBackend, HttpRequest, HttpResponse, Transport};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::host::{BrowserEvents, Clock, Handler, KeyValueStore, Spawner, TabSource, Timestamp};
use crate::tab_data::{NavigationDetails, TabId, TabInfo, TabUpdate};
use crate::tracker::ActivityRecord;

/// Key-value store backed by a JSON object
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<Map<String, Value>>,
    failing: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(items: Value) -> Self {
        let store = Self::new();
        if let Value::Object(items) = items {
            *store.items.borrow_mut() = items;
        }
        store
    }

    /// Every access fails with `Error::Storage`
    pub fn failing() -> Self {
        let store = Self::new();
        store.failing.set(true);
        store
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.items.borrow().get(key).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        if self.failing.get() {
            return Err(Error::Storage("store unavailable".to_string()));
        }
        let items = self.items.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| items.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        if self.failing.get() {
            return Err(Error::Storage("store unavailable".to_string()));
        }
        self.writes.set(self.writes.get() + 1);
        self.items.borrow_mut().extend(items);
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Status(u16, String),
    Unreachable,
}

/// Records requests and answers each with the same scripted reply
#[derive(Debug)]
pub struct MockTransport {
    reply: RefCell<Reply>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn responding(status: u16, body: &str) -> Self {
        MockTransport {
            reply: RefCell::new(Reply::Status(status, body.to_string())),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        MockTransport {
            reply: RefCell::new(Reply::Unreachable),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn respond_with(&self, status: u16, body: &str) {
        *self.reply.borrow_mut() = Reply::Status(status, body.to_string());
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// Parsed JSON bodies of every request sent so far
    pub fn bodies(&self) -> Vec<Value> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|r| r.body.as_deref())
            .filter_map(|body| serde_json::from_str(body).ok())
            .collect()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.to_string();
        self.requests.borrow_mut().push(request);
        match self.reply.borrow().clone() {
            Reply::Status(status, body) => Ok(HttpResponse { status, body }),
            Reply::Unreachable => Err(Error::Network {
                url,
                detail: "Failed to fetch".to_string(),
            }),
        }
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            now: Cell::new(Utc.with_ymd_and_hms(2024, 10, 28, 10, 30, 0).unwrap()),
        }
    }

    pub fn advance(&self, seconds: i64) {
        self.now.set(self.now.get() + Duration::seconds(seconds));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

/// Queues spawned tasks until `run_all`
#[derive(Default)]
pub struct QueueSpawner {
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl QueueSpawner {
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run queued tasks, including ones they spawn, until none are left.
    pub fn run_all(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                block_on(task);
            }
        }
    }
}

impl Spawner for QueueSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}

/// Everything the background worker needs, in memory
pub struct MockHost {
    pub store: MemoryStore,
    pub tabs: RefCell<HashMap<TabId, TabInfo>>,
    pub tab_lookups: Cell<usize>,
    pub clock: ManualClock,
    pub spawner: QueueSpawner,
    pub backend: HttpBackend<MockTransport>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        MockHost {
            store,
            tabs: RefCell::new(HashMap::new()),
            tab_lookups: Cell::new(0),
            clock: ManualClock::new(),
            spawner: QueueSpawner::default(),
            backend: HttpBackend::new(BackendConfig::default(), MockTransport::responding(200, "{}")),
        }
    }

    pub fn open_tab(&self, tab_id: TabId, url: &str) {
        self.tabs.borrow_mut().insert(tab_id, TabInfo::new(url, url));
    }

    pub fn transport(&self) -> &MockTransport {
        self.backend.transport()
    }
}

impl KeyValueStore for MockHost {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        self.store.get(keys).await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        self.store.set(items).await
    }
}

impl TabSource for MockHost {
    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo> {
        self.tab_lookups.set(self.tab_lookups.get() + 1);
        self.tabs.borrow().get(&tab_id).cloned().ok_or_else(|| Error::Tab {
            tab_id,
            detail: format!("No tab with id: {}.", tab_id),
        })
    }
}

impl Clock for MockHost {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

impl Spawner for MockHost {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.spawner.spawn(task);
    }
}

impl ActivityLog for MockHost {
    async fn log_activity(&self, record: &ActivityRecord) -> Result<()> {
        self.backend.log_activity(record).await
    }
}

enum HeldEvent {
    TabUpdated(TabUpdate),
    Navigated(NavigationDetails),
    Closed(TabId),
    Started,
}

/// Subscription layer whose events are fired by hand.
///
/// Like the browser bridge, events fired before `resume` are held and
/// delivered in order once it is called.
#[derive(Default)]
pub struct MockEvents {
    tab_updated: RefCell<Option<Handler<TabUpdate>>>,
    navigated: RefCell<Option<Handler<NavigationDetails>>>,
    closed: RefCell<Option<Handler<TabId>>>,
    started: RefCell<Option<Box<dyn FnMut()>>>,
    resumed: Cell<bool>,
    held: RefCell<Vec<HeldEvent>>,
}

impl MockEvents {
    pub fn fire_tab_updated(&self, update: TabUpdate) {
        self.fire(HeldEvent::TabUpdated(update));
    }

    pub fn fire_navigated(&self, tab_id: TabId, frame_id: i32) {
        self.fire(HeldEvent::Navigated(NavigationDetails {
            tab_id,
            frame_id,
            url: String::new(),
        }));
    }

    pub fn fire_closed(&self, tab_id: TabId) {
        self.fire(HeldEvent::Closed(tab_id));
    }

    pub fn fire_started(&self) {
        self.fire(HeldEvent::Started);
    }

    pub fn is_fully_subscribed(&self) -> bool {
        self.tab_updated.borrow().is_some()
            && self.navigated.borrow().is_some()
            && self.closed.borrow().is_some()
            && self.started.borrow().is_some()
    }

    pub fn is_resumed(&self) -> bool {
        self.resumed.get()
    }

    fn fire(&self, event: HeldEvent) {
        if self.resumed.get() {
            self.deliver(event);
        } else {
            self.held.borrow_mut().push(event);
        }
    }

    fn deliver(&self, event: HeldEvent) {
        match event {
            HeldEvent::TabUpdated(update) => {
                if let Some(handler) = self.tab_updated.borrow_mut().as_mut() {
                    handler(update);
                }
            }
            HeldEvent::Navigated(details) => {
                if let Some(handler) = self.navigated.borrow_mut().as_mut() {
                    handler(details);
                }
            }
            HeldEvent::Closed(tab_id) => {
                if let Some(handler) = self.closed.borrow_mut().as_mut() {
                    handler(tab_id);
                }
            }
            HeldEvent::Started => {
                if let Some(handler) = self.started.borrow_mut().as_mut() {
                    handler();
                }
            }
        }
    }
}

impl BrowserEvents for MockEvents {
    fn on_active_tab_changed(&self, handler: Handler<TabUpdate>) {
        *self.tab_updated.borrow_mut() = Some(handler);
    }

    fn on_tab_navigated(&self, handler: Handler<NavigationDetails>) {
        *self.navigated.borrow_mut() = Some(handler);
    }

    fn on_tab_closed(&self, handler: Handler<TabId>) {
        *self.closed.borrow_mut() = Some(handler);
    }

    fn on_host_started(&self, handler: Box<dyn FnMut()>) {
        *self.started.borrow_mut() = Some(handler);
    }

    fn resume(&self) {
        self.resumed.set(true);
        let held = std::mem::take(&mut *self.held.borrow_mut());
        for event in held {
            self.deliver(event);
        }
    }
}
