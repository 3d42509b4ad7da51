//! The focus session: one per page, owning hover/focus state and every
//! affordance drawn over the rendered document.
//!
//! The embedder forwards browser events (pointer, click, input, keyboard,
//! mutation and viewport callbacks) to [`VisualEditor`]; inbound host events
//! arrive through the channel handlers installed at construction. All of it
//! runs on one thread, so shared state lives in `RefCell`s that are never
//! borrowed across an `.await`. Async continuations re-check the selection
//! after every suspension point.

mod blocks;
mod focus;
mod host;
mod hover;
mod throttle;

#[cfg(test)]
mod tests;

pub use host::{BASE_FIELD_CLASS, VARIANT_FIELD_CLASS};
pub use throttle::Throttle;

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::channel::{events, Channel};
use crate::config::EditorConfig;
use crate::dom::{MutationRecord, NodeId, Page};
use crate::error::{VisualEditorError, VisualEditorResult};
use crate::fetch::SchemaStore;
use crate::overlay::{CommentHighlights, Cursor, FocusOverlay, InstanceButtons};
use crate::state::{FocusPhase, FocusState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub target: NodeId,
}

impl PointerSample {
    pub const fn new(x: f64, y: f64, target: NodeId) -> Self {
        Self { x, y, target }
    }
}

/// Host-controlled toggles and bootstrap facts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorMode {
    pub collab: bool,
    pub audience: bool,
    pub variant: Option<String>,
    pub locale: Option<String>,
    pub window_type: Option<String>,
}

/// Reply to the `init` bootstrap request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default)]
    pub window_type: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub collab: Option<bool>,
}

pub(crate) struct Inner {
    page: Rc<dyn Page>,
    channel: Option<Rc<Channel>>,
    store: SchemaStore,
    config: EditorConfig,
    spawner: Rc<dyn LocalSpawn>,
    state: RefCell<FocusState>,
    overlay: RefCell<FocusOverlay>,
    cursor: Cursor,
    buttons: RefCell<InstanceButtons>,
    comments: RefCell<CommentHighlights>,
    pointer: RefCell<Throttle<PointerSample>>,
    mode: RefCell<EditorMode>,
    watching: Cell<bool>,
    destroyed: Cell<bool>,
}

impl Inner {
    fn page(&self) -> &dyn Page {
        &*self.page
    }

    fn identity_attribute(&self) -> &str {
        &self.config.identity_attribute
    }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        if let Err(err) = self.spawner.spawn_local(task) {
            tracing::warn!(%err, "failed to spawn session task");
        }
    }

    /// Fire-and-forget notification; an absent or unreachable host is logged
    /// and otherwise ignored.
    fn notify(&self, event_type: &str, payload: Value) {
        let Some(channel) = self.channel.as_ref() else {
            tracing::trace!(event_type, "no host channel; event dropped");
            return;
        };
        if let Err(err) = channel.fire(event_type, payload) {
            tracing::warn!(event_type, %err, "failed to notify host");
        }
    }

    fn watch_mutations(&self) {
        self.page.observe_mutations(self.page.body());
        self.watching.set(true);
    }

    fn stop_watching(&self) {
        if self.watching.replace(false) {
            self.page.disconnect_mutations();
        }
    }
}

/// Entry point for everything the page forwards to the editing layer.
#[derive(Clone)]
pub struct VisualEditor {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for VisualEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualEditor")
            .field("state", &self.inner.state.borrow().to_string())
            .field("channel", &self.inner.channel.as_ref().map(|channel| channel.id()))
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

impl VisualEditor {
    /// Mounts the overlay nodes and registers the inbound host handlers.
    /// `channel` is `None` when no host window is reachable; the session
    /// still tracks hover and focus but never edits.
    pub fn new(
        page: Rc<dyn Page>,
        channel: Option<Rc<Channel>>,
        spawner: Rc<dyn LocalSpawn>,
        config: EditorConfig,
    ) -> Self {
        let overlay = FocusOverlay::mount(&*page);
        let cursor = Cursor::mount(&*page);
        let mode = EditorMode {
            collab: config.collab_enabled,
            ..EditorMode::default()
        };
        let inner = Rc::new(Inner {
            store: SchemaStore::new(channel.clone()),
            pointer: RefCell::new(Throttle::new(config.pointer_throttle_ms)),
            state: RefCell::new(FocusState::new()),
            overlay: RefCell::new(overlay),
            cursor,
            buttons: RefCell::new(InstanceButtons::new()),
            comments: RefCell::new(CommentHighlights::new()),
            mode: RefCell::new(mode),
            watching: Cell::new(false),
            destroyed: Cell::new(false),
            page,
            channel,
            spawner,
            config,
        });

        if let Some(channel) = inner.channel.as_ref() {
            host::register(channel, &inner);
        }
        if inner.config.empty_block_placeholders {
            inner.spawn(Rc::clone(&inner).refresh_empty_blocks());
        }
        tracing::info!(
            channel = ?inner.channel.as_ref().map(|channel| channel.id()),
            identity_attribute = %inner.config.identity_attribute,
            "visual editor session started"
        );
        Self { inner }
    }

    /// Bootstrap handshake with the host. `Ok(None)` without a host window.
    pub async fn init(&self) -> VisualEditorResult<Option<SessionInfo>> {
        if self.inner.destroyed.get() {
            return Err(VisualEditorError::Destroyed);
        }
        let Some(channel) = self.inner.channel.clone() else {
            return Ok(None);
        };
        let info: SessionInfo = channel.send_as(events::INIT, json!({})).await?;
        {
            let mut mode = self.inner.mode.borrow_mut();
            mode.locale = info.locale.clone();
            mode.window_type = info.window_type.clone();
            if let Some(collab) = info.collab {
                mode.collab = collab;
            }
        }
        tracing::debug!(window_type = ?info.window_type, locale = ?info.locale, "session bootstrapped");
        Ok(Some(info))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.inner.config
    }

    pub fn mode(&self) -> EditorMode {
        self.inner.mode.borrow().clone()
    }

    pub fn phase(&self) -> FocusPhase {
        self.inner.state.borrow().phase()
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.inner.state.borrow().selected_node()
    }

    pub fn hovered_node(&self) -> Option<NodeId> {
        self.inner.state.borrow().hovered()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Throttled; the embedder's timer drains the trailing sample with
    /// [`VisualEditor::flush_pointer`].
    pub fn pointer_move(&self, sample: PointerSample, now_ms: f64) {
        if self.inner.destroyed.get() {
            return;
        }
        let ready = self.inner.pointer.borrow_mut().offer(now_ms, sample);
        if let Some(sample) = ready {
            self.inner.handle_hover(sample);
        }
    }

    pub fn flush_pointer(&self, now_ms: f64) {
        let trailing = self.inner.pointer.borrow_mut().flush(now_ms);
        if let Some(sample) = trailing {
            self.inner.handle_hover(sample);
        }
    }

    pub fn click(&self, sample: PointerSample) {
        self.inner.handle_click(sample);
    }

    /// `input`/`change` event on `target` or one of its descendants.
    pub fn input(&self, target: NodeId) {
        self.inner.handle_input(target);
    }

    pub fn escape(&self) {
        self.inner.release_focus();
    }

    /// Programmatic unfocus.
    pub fn release(&self) {
        self.inner.release_focus();
    }

    pub fn mutations(&self, records: &[MutationRecord]) {
        self.inner.handle_mutations(records);
    }

    /// Scroll or resize of the window, or a resize of the focused node.
    pub fn viewport_changed(&self) {
        self.inner.reposition();
    }

    /// The page navigated without a reload.
    pub fn url_changed(&self, url: &str) {
        if self.inner.destroyed.get() {
            return;
        }
        tracing::debug!(url, "page url changed");
        self.inner.release_focus();
        self.inner.clear_hover();
        self.inner.comments.borrow_mut().clear(self.inner.page());
        self.inner.notify(events::URL_CHANGE, json!({ "url": url }));
    }

    /// Commits any pending edit, then removes every node and handler the
    /// session installed. Outstanding host requests are left to settle.
    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.get() {
            return;
        }
        inner.pointer.borrow_mut().cancel();
        inner.release_focus();
        inner.destroyed.set(true);
        inner.clear_hover();
        inner.stop_watching();

        let page = inner.page();
        inner.comments.borrow_mut().clear(page);
        inner.overlay.borrow().unmount(page);
        inner.cursor.unmount(page);
        if let Some(channel) = inner.channel.as_ref() {
            host::unregister(channel);
        }
        tracing::info!("visual editor session destroyed");
    }
}
