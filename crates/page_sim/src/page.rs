//! SimulatedPage - in-memory `HostEnvironment`
//!
//! Timers and idle callbacks are tokio tasks, so tests drive virtual time
//! with a paused clock. Events are delivered synchronously on the caller's
//! task, like a browser dispatching on its event loop.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{
    Callback, ContractError, ElementId, HostEnvironment, Listener, ListenerId, LoadHandlers,
    Placement, TimerId, TriggerKind,
};
use serde::Serialize;
use serde_json::Value;
use tokio::task::AbortHandle;
use tracing::{debug, instrument, trace};

use crate::dom::Document;

/// Page construction options
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Document has a `<head>`
    pub with_head: bool,
    /// Document has a `<footer>` inside the body
    pub with_footer: bool,
    /// Host reports idle-callback support
    pub idle_support: bool,
    /// Virtual time until the runtime reports idle
    pub idle_latency: Duration,
    /// Document is still parsing; `when_ready` callbacks wait for `finish_loading`
    pub loading: bool,
    /// Script sources containing any of these substrings fail to load
    pub fail_sources: Vec<String>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            with_head: true,
            with_footer: true,
            idle_support: true,
            idle_latency: Duration::ZERO,
            loading: false,
            fail_sources: Vec::new(),
        }
    }
}

/// How a simulated script load ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// Result of one simulated script load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadRecord {
    pub element: ElementId,
    pub src: String,
    pub outcome: LoadOutcome,
}

/// Summary of an attached `<script>` tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptInfo {
    pub element: ElementId,
    pub src: Option<String>,
    /// Tag of the parent node (`head`, `body`, `footer`, ...)
    pub container: String,
    pub attributes: Vec<(String, String)>,
}

impl ScriptInfo {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(k, _)| k == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct PageState {
    document: Document,
    listeners: BTreeMap<ListenerId, (TriggerKind, Listener)>,
    timers: HashMap<TimerId, AbortHandle>,
    load_handlers: HashMap<ElementId, LoadHandlers>,
    pending_loads: VecDeque<ElementId>,
    load_log: Vec<LoadRecord>,
    ready: bool,
    ready_callbacks: Vec<Callback>,
    globals: serde_json::Map<String, Value>,
    next_listener: u64,
    next_timer: u64,
}

/// In-memory page implementing every host capability
pub struct SimulatedPage {
    options: PageOptions,
    state: Arc<Mutex<PageState>>,
}

impl SimulatedPage {
    /// Page with default options: head, body, footer, idle support, ready
    pub fn new() -> Self {
        Self::with_options(PageOptions::default())
    }

    pub fn with_options(options: PageOptions) -> Self {
        let state = PageState {
            document: Document::new(options.with_head, options.with_footer),
            listeners: BTreeMap::new(),
            timers: HashMap::new(),
            load_handlers: HashMap::new(),
            pending_loads: VecDeque::new(),
            load_log: Vec::new(),
            ready: !options.loading,
            ready_callbacks: Vec::new(),
            globals: serde_json::Map::new(),
            next_listener: 1,
            next_timer: 1,
        };
        Self {
            options,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        lock_state(&self.state)
    }

    // ===== Event delivery =====

    /// Deliver one interaction event to every listener registered for it
    ///
    /// Returns the number of listeners invoked.
    #[instrument(name = "page_dispatch_event", skip(self), fields(event = %kind))]
    pub fn dispatch_event(&self, kind: TriggerKind) -> usize {
        self.dispatch_events(&[kind])
    }

    /// Deliver several events queued in the same task turn
    ///
    /// Listener lists are snapshotted for all events up front, so a listener
    /// removed by an earlier callback in the batch is still invoked, exactly
    /// like callbacks that were already enqueued when removal happened.
    pub fn dispatch_events(&self, kinds: &[TriggerKind]) -> usize {
        let mut queued: Vec<(TriggerKind, Listener)> = Vec::new();
        {
            let state = self.lock();
            for kind in kinds {
                for (registered, listener) in state.listeners.values() {
                    if registered == kind {
                        queued.push((*registered, Arc::clone(listener)));
                    }
                }
            }
        }

        trace!(events = ?kinds, queued = queued.len(), "Delivering events");
        for (kind, listener) in &queued {
            listener(*kind);
        }
        queued.len()
    }

    // ===== Readiness =====

    /// Mark the document parsed and run queued `when_ready` callbacks
    pub fn finish_loading(&self) {
        let callbacks = {
            let mut state = self.lock();
            state.ready = true;
            std::mem::take(&mut state.ready_callbacks)
        };
        debug!(callbacks = callbacks.len(), "Document ready");
        for callback in callbacks {
            callback();
        }
    }

    pub fn is_ready(&self) -> bool {
        self.lock().ready
    }

    // ===== Script loads =====

    /// Resolve every pending script load, including loads started by callbacks
    ///
    /// Sources matching `fail_sources` fire their error handler, all others
    /// fire their load handler.
    #[instrument(name = "page_settle_loads", skip(self))]
    pub fn settle_loads(&self) -> Vec<LoadRecord> {
        let mut settled = Vec::new();

        loop {
            let next = {
                let mut state = self.lock();
                let Some(element) = state.pending_loads.pop_front() else {
                    break;
                };
                let src = state
                    .document
                    .node(element)
                    .and_then(|n| n.attribute("src"))
                    .unwrap_or_default()
                    .to_string();
                let handlers = state.load_handlers.remove(&element).unwrap_or_default();
                let outcome = if self.should_fail(&src) {
                    LoadOutcome::Failed
                } else {
                    LoadOutcome::Loaded
                };
                let record = LoadRecord {
                    element,
                    src,
                    outcome,
                };
                state.load_log.push(record.clone());
                (record, handlers)
            };

            let (record, handlers) = next;
            debug!(src = %record.src, outcome = ?record.outcome, "Script load settled");
            let callback = match record.outcome {
                LoadOutcome::Loaded => handlers.on_load,
                LoadOutcome::Failed => handlers.on_error,
            };
            if let Some(callback) = callback {
                callback();
            }
            settled.push(record);
        }

        settled
    }

    /// Every load settled so far
    pub fn load_log(&self) -> Vec<LoadRecord> {
        self.lock().load_log.clone()
    }

    fn should_fail(&self, src: &str) -> bool {
        self.options
            .fail_sources
            .iter()
            .any(|pattern| src.contains(pattern.as_str()))
    }

    // ===== Inspection =====

    /// Number of registered interaction listeners
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Number of registered listeners for one event
    pub fn listeners_for(&self, kind: TriggerKind) -> usize {
        self.lock()
            .listeners
            .values()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Number of timers that have neither fired nor been cleared
    pub fn pending_timer_count(&self) -> usize {
        self.lock().timers.len()
    }

    /// Attached `<script>` tags in document order
    pub fn scripts(&self) -> Vec<ScriptInfo> {
        let state = self.lock();
        let doc = &state.document;
        doc.elements_by_tag("script")
            .into_iter()
            .filter_map(|id| {
                let node = doc.node(id)?;
                let container = node
                    .parent
                    .and_then(|p| doc.node(p))
                    .map(|p| p.tag.clone())
                    .unwrap_or_default();
                Some(ScriptInfo {
                    element: id,
                    src: node.attribute("src").map(str::to_string),
                    container,
                    attributes: node.attributes.clone(),
                })
            })
            .collect()
    }

    /// Script sources in document order
    pub fn script_sources(&self) -> Vec<String> {
        self.scripts().into_iter().filter_map(|s| s.src).collect()
    }

    /// Inner markup of attached `<noscript>` nodes with their container tag
    pub fn noscripts(&self) -> Vec<(String, String)> {
        let state = self.lock();
        let doc = &state.document;
        doc.elements_by_tag("noscript")
            .into_iter()
            .filter_map(|id| {
                let node = doc.node(id)?;
                let container = node.parent.and_then(|p| doc.node(p))?.tag.clone();
                Some((container, node.inner_html.clone().unwrap_or_default()))
            })
            .collect()
    }

    /// Tag of the first child of the body
    pub fn first_body_child_tag(&self) -> Option<String> {
        let state = self.lock();
        let doc = &state.document;
        let body = doc.node(doc.body())?;
        let first = body.children.first()?;
        doc.node(*first).map(|n| n.tag.clone())
    }

    /// All window globals as a JSON object
    pub fn globals(&self) -> Value {
        Value::Object(self.lock().globals.clone())
    }

    /// Render the attached document as HTML
    pub fn render_html(&self) -> String {
        self.lock().document.render()
    }
}

impl Default for SimulatedPage {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_state(state: &Mutex<PageState>) -> MutexGuard<'_, PageState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HostEnvironment for SimulatedPage {
    fn create_element(&self, tag: &str) -> ElementId {
        self.lock().document.create(tag)
    }

    fn set_attribute(
        &self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), ContractError> {
        let mut state = self.lock();
        let node = state.document.node_mut(element)?;
        match node.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => node.attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn set_inner_html(&self, element: ElementId, markup: &str) -> Result<(), ContractError> {
        self.lock().document.node_mut(element)?.inner_html = Some(markup.to_string());
        Ok(())
    }

    fn set_load_handlers(
        &self,
        element: ElementId,
        handlers: LoadHandlers,
    ) -> Result<(), ContractError> {
        let mut state = self.lock();
        state.document.node_mut(element)?;
        state.load_handlers.insert(element, handlers);
        Ok(())
    }

    fn append_child(&self, parent: ElementId, child: ElementId) -> Result<(), ContractError> {
        let mut state = self.lock();
        state.document.insert(parent, child, false)?;
        queue_load_if_script(&mut state, child);
        Ok(())
    }

    fn prepend_child(&self, parent: ElementId, child: ElementId) -> Result<(), ContractError> {
        let mut state = self.lock();
        state.document.insert(parent, child, true)?;
        queue_load_if_script(&mut state, child);
        Ok(())
    }

    fn container(&self, placement: Placement) -> Option<ElementId> {
        self.lock().document.container(placement)
    }

    fn body(&self) -> ElementId {
        self.lock().document.body()
    }

    fn add_listener(&self, kind: TriggerKind, listener: Listener) -> ListenerId {
        let mut state = self.lock();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.insert(id, (kind, listener));
        trace!(listener = %id, event = %kind, "Listener added");
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        if self.lock().listeners.remove(&id).is_some() {
            trace!(listener = %id, "Listener removed");
        }
    }

    fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerId {
        let mut state = self.lock();
        let id = TimerId(state.next_timer);
        state.next_timer += 1;

        let shared = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let live = lock_state(&shared).timers.remove(&id).is_some();
            if live {
                callback();
            }
        });
        state.timers.insert(id, task.abort_handle());
        trace!(timer = %id, delay_ms = delay.as_millis() as u64, "Timer scheduled");
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(handle) = self.lock().timers.remove(&id) {
            handle.abort();
            trace!(timer = %id, "Timer cleared");
        }
    }

    fn supports_idle(&self) -> bool {
        self.options.idle_support
    }

    fn request_idle(&self, timeout: Duration, callback: Callback) {
        let wait = self.options.idle_latency.min(timeout);
        tokio::spawn(async move {
            if wait.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(wait).await;
            }
            callback();
        });
    }

    fn when_ready(&self, callback: Callback) {
        let mut state = self.lock();
        if state.ready {
            drop(state);
            tokio::spawn(async move { callback() });
        } else {
            state.ready_callbacks.push(callback);
        }
    }

    fn global(&self, name: &str) -> Option<Value> {
        self.lock().globals.get(name).cloned()
    }

    fn set_global(&self, name: &str, value: Value) {
        self.lock().globals.insert(name.to_string(), value);
    }

    fn update_global(&self, name: &str, update: &mut dyn FnMut(&mut Value)) {
        let mut state = self.lock();
        let entry = state
            .globals
            .entry(name.to_string())
            .or_insert(Value::Null);
        update(entry);
    }
}

fn queue_load_if_script(state: &mut PageState, element: ElementId) {
    let is_loadable = state
        .document
        .node(element)
        .is_some_and(|n| n.tag == "script" && n.attribute("src").is_some());
    if is_loadable && state.document.is_attached(element) && !state.pending_loads.contains(&element)
    {
        state.pending_loads.push_back(element);
    }
}
