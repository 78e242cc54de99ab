/// Background worker: feeds browser events into the tracker and reports
/// finished sessions to the backend.
///
/// Cursor and cache changes happen synchronously inside each handler.
/// Reports are spawned afterwards and never awaited by the handler.
use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::ActivityLog;
use crate::error::Result;
use crate::host::{BrowserEvents, Clock, KeyValueStore, Spawner, TabSource};
use crate::storage::{load_identity, mark_initialized};
use crate::tab_data::{NavigationDetails, TabId, TabUpdate};
use crate::tracker::{ActivityRecord, Session, TabActivityTracker};

/// Everything the worker needs from its host
pub trait WorkerHost: KeyValueStore + TabSource + ActivityLog + Clock + Spawner + 'static {}

impl<T> WorkerHost for T where T: KeyValueStore + TabSource + ActivityLog + Clock + Spawner + 'static {}

pub struct ActivityWorker<H> {
    tracker: RefCell<TabActivityTracker>,
    host: Rc<H>,
}

impl<H: WorkerHost> ActivityWorker<H> {
    pub fn new(host: Rc<H>) -> Self {
        ActivityWorker {
            tracker: RefCell::new(TabActivityTracker::new()),
            host,
        }
    }

    #[cfg(test)]
    pub fn tracker(&self) -> std::cell::Ref<'_, TabActivityTracker> {
        self.tracker.borrow()
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Register all four handlers with the browser, then release any events
    /// that arrived while the worker was loading.
    pub fn subscribe<E: BrowserEvents>(worker: &Rc<Self>, events: &E) {
        let on_updated = Rc::clone(worker);
        events.on_active_tab_changed(Box::new(move |update: TabUpdate| on_updated.handle_tab_updated(update)));

        let on_navigated = Rc::clone(worker);
        events.on_tab_navigated(Box::new(move |details: NavigationDetails| {
            let task = Rc::clone(&on_navigated);
            on_navigated
                .host
                .spawn(Box::pin(async move { task.handle_navigation_completed(details).await }));
        }));

        let on_closed = Rc::clone(worker);
        events.on_tab_closed(Box::new(move |tab_id: TabId| on_closed.handle_tab_removed(tab_id)));

        let on_started = Rc::clone(worker);
        events.on_host_started(Box::new(move || {
            let task = Rc::clone(&on_started);
            on_started
                .host
                .spawn(Box::pin(async move { task.handle_host_started().await }));
        }));

        events.resume();
        log::info!("Service Worker initialized!");
    }

    pub fn handle_tab_updated(&self, update: TabUpdate) {
        if self.tracker.borrow_mut().tab_updated(&update) {
            log::debug!("Tab {} now at {}", update.tab_id, update.url);
        }
    }

    pub async fn handle_navigation_completed(&self, details: NavigationDetails) {
        if !details.is_top_level() {
            return;
        }

        let info = match self.host.get_tab(details.tab_id).await {
            Ok(info) => info,
            Err(e) => {
                log::error!("Navigation error: {}", e);
                return;
            }
        };
        log::debug!("Navigated to: {}", details.url);

        let now = self.host.now();
        let finished = self
            .tracker
            .borrow_mut()
            .navigation_completed(details.tab_id, info, now);

        if let Some(session) = finished {
            self.emit(session);
        }
    }

    pub fn handle_tab_removed(&self, tab_id: TabId) {
        let now = self.host.now();
        let finished = self.tracker.borrow_mut().tab_removed(tab_id, now);

        if let Some(session) = finished {
            self.emit(session);
        }
    }

    pub async fn handle_host_started(&self) {
        log::info!("Extension started");
        if let Err(e) = mark_initialized(self.host.as_ref()).await {
            log::error!("Failed to mark extension initialized: {}", e);
        }
    }

    fn emit(&self, session: Session) {
        let host = Rc::clone(&self.host);
        self.host
            .spawn(Box::pin(async move { report_session(host.as_ref(), session).await }));
    }
}

/// Send one finished session to the backend, logging any failure.
pub async fn report_session<H: KeyValueStore + ActivityLog>(host: &H, session: Session) {
    match try_report_session(host, &session).await {
        Ok(record) => log::debug!(
            "Logged {:?} for {} ({} → {})",
            record.activity_type,
            record.url,
            record.start_time,
            record.end_time
        ),
        Err(e) => log::error!("Logging failed: {}", e),
    }
}

async fn try_report_session<H: KeyValueStore + ActivityLog>(
    host: &H,
    session: &Session,
) -> Result<ActivityRecord> {
    let identity = load_identity(host).await?;
    let record = session.to_record(&identity)?;
    log::info!("Logging: {:?}", record);
    host.log_activity(&record).await?;
    Ok(record)
}
