/// Browser-side implementations of the host seams, backed by the JS bridge
use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::backend::{ActivityLog, HttpBackend, HttpRequest, HttpResponse, Transport};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::host::{BrowserEvents, Clock, Handler, KeyValueStore, Spawner, SystemClock, TabSource, Timestamp};
use crate::registrar::Registrar;
use crate::storage::load_backend_config;
use crate::tab_data::{NavigationDetails, TabId, TabInfo, TabUpdate};
use crate::tracker::ActivityRecord;
use crate::worker::ActivityWorker;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/chrome_bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(keys: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(items: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getTab(tab_id: i32) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn fetchText(method: &str, url: &str, body: Option<String>) -> std::result::Result<JsValue, JsValue>;

    fn addTabUpdatedListener(callback: &js_sys::Function);

    fn addNavigationCompletedListener(callback: &js_sys::Function);

    fn addTabRemovedListener(callback: &js_sys::Function);

    fn addStartupListener(callback: &js_sys::Function);

    fn replayPendingEvents();
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue> {
    // Plain JS objects and arrays, never Maps
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| Error::Decode {
            what: "value for JS",
            detail: e.to_string(),
        })
}

/// `chrome.storage.local`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStore;

impl KeyValueStore for ChromeStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let items = getStorage(to_js(&keys)?)
            .await
            .map_err(|e| Error::Storage(describe(&e)))?;

        if items.is_null() || items.is_undefined() {
            return Ok(Map::new());
        }

        serde_wasm_bindgen::from_value(items).map_err(|e| Error::Storage(format!("Failed to parse storage: {:?}", e)))
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        setStorage(to_js(&items)?)
            .await
            .map_err(|e| Error::Storage(describe(&e)))
    }
}

#[derive(Debug, Deserialize)]
struct FetchReply {
    status: u16,
    #[serde(default)]
    body: String,
}

/// `fetch()` with host default timeouts
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.to_string();
        let reply = fetchText(request.method.as_str(), &url, request.body)
            .await
            .map_err(|e| Error::Network {
                url: url.clone(),
                detail: describe(&e),
            })?;

        let reply: FetchReply = serde_wasm_bindgen::from_value(reply).map_err(|e| Error::Decode {
            what: "fetch reply",
            detail: e.to_string(),
        })?;

        Ok(HttpResponse {
            status: reply.status,
            body: reply.body,
        })
    }
}

/// Runs tasks on the browser's microtask queue
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        spawn_local(task);
    }
}

/// Host for the background worker
pub struct BrowserHost {
    store: ChromeStore,
    backend: RefCell<HttpBackend<FetchTransport>>,
}

impl BrowserHost {
    pub fn new(config: BackendConfig) -> Self {
        BrowserHost {
            store: ChromeStore,
            backend: RefCell::new(HttpBackend::new(config, FetchTransport)),
        }
    }

    /// Point later reports at a different backend.
    pub fn set_backend_config(&self, config: BackendConfig) {
        *self.backend.borrow_mut() = HttpBackend::new(config, FetchTransport);
    }
}

impl KeyValueStore for BrowserHost {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        self.store.get(keys).await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        self.store.set(items).await
    }
}

impl TabSource for BrowserHost {
    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo> {
        let tab = getTab(tab_id).await.map_err(|e| Error::Tab {
            tab_id,
            detail: describe(&e),
        })?;
        serde_wasm_bindgen::from_value(tab).map_err(|e| Error::Tab {
            tab_id,
            detail: e.to_string(),
        })
    }
}

impl ActivityLog for BrowserHost {
    async fn log_activity(&self, record: &ActivityRecord) -> Result<()> {
        // Clone so no borrow is held across the request
        let backend = self.backend.borrow().clone();
        backend.log_activity(record).await
    }
}

impl Clock for BrowserHost {
    fn now(&self) -> Timestamp {
        SystemClock.now()
    }
}

impl Spawner for BrowserHost {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        LocalSpawner.spawn(task);
    }
}

/// `chrome.tabs` / `chrome.webNavigation` / `chrome.runtime` listeners
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeEvents;

fn listen<T: DeserializeOwned + 'static>(
    register: fn(&js_sys::Function),
    what: &'static str,
    mut handler: Handler<T>,
) {
    let callback = Closure::wrap(Box::new(move |payload: JsValue| {
        match serde_wasm_bindgen::from_value::<T>(payload) {
            Ok(event) => handler(event),
            Err(e) => log::warn!("Dropping malformed {} event: {:?}", what, e),
        }
    }) as Box<dyn FnMut(JsValue)>);

    register(callback.as_ref().unchecked_ref());
    // Listeners live as long as the worker
    callback.forget();
}

impl BrowserEvents for ChromeEvents {
    fn on_active_tab_changed(&self, handler: Handler<TabUpdate>) {
        listen(addTabUpdatedListener, "tab update", handler);
    }

    fn on_tab_navigated(&self, handler: Handler<NavigationDetails>) {
        listen(addNavigationCompletedListener, "navigation", handler);
    }

    fn on_tab_closed(&self, handler: Handler<TabId>) {
        listen(addTabRemovedListener, "tab removal", handler);
    }

    fn on_host_started(&self, mut handler: Box<dyn FnMut()>) {
        let callback = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
        addStartupListener(callback.as_ref().unchecked_ref());
        callback.forget();
    }

    fn resume(&self) {
        replayPendingEvents();
    }
}

/// Wire the background worker to the browser.
///
/// The bridge attaches the browser listeners when the script is evaluated and
/// holds their events until the worker has subscribed. The stored backend
/// override is applied once read.
pub fn install_background_worker() {
    let host = Rc::new(BrowserHost::new(BackendConfig::default()));
    let worker = Rc::new(ActivityWorker::new(Rc::clone(&host)));
    ActivityWorker::subscribe(&worker, &ChromeEvents);

    spawn_local(async move {
        let config = load_backend_config(&ChromeStore).await;
        log::debug!("Reporting to {}", config.base_url());
        host.set_backend_config(config);
    });
}

pub type BrowserRegistrar = Registrar<ChromeStore, HttpBackend<FetchTransport>>;

/// Registrar for the popup, using the stored backend override if any.
pub async fn connect_registrar() -> BrowserRegistrar {
    let config = load_backend_config(&ChromeStore).await;
    Registrar::new(ChromeStore, HttpBackend::new(config, FetchTransport))
}
