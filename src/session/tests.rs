use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use serde_json::{json, Value};

use super::{PointerSample, VisualEditor, BASE_FIELD_CLASS, VARIANT_FIELD_CLASS};
use crate::channel::testing::FakeHost;
use crate::channel::{events, Channel, MessageKind, MessageTarget, WireMessage};
use crate::config::EditorConfig;
use crate::dom::{MemoryPage, MutationRecord, NodeId, Page};
use crate::geometry::Rect;
use crate::overlay::{
    ADD_INSTANCE_BUTTON_CLASS, COMMENT_ICON_CLASS, CURSOR_CLASS, CURSOR_ICON_CLASS, EMPTY_BLOCK_CLASS,
    OVERLAY_OUTLINE_CLASS, OVERLAY_WRAPPER_CLASS, TOOLBAR_CLASS, VISIBLE_CLASS,
};
use crate::state::FocusPhase;

const CHANNEL_ID: &str = "visual-builder";
const CSLP: &str = "data-cslp";
const PSEUDO_CLASS: &str = "visual-builder__pseudo-editable-element";

fn schema_reply() -> Value {
    json!({
        "fieldSchemaMap": {
            "title": { "uid": "title", "display_name": "Title", "data_type": "text" },
            "body": {
                "uid": "body",
                "display_name": "Body",
                "data_type": "text",
                "field_metadata": { "multiline": true }
            },
            "summary": { "uid": "summary", "display_name": "Summary", "data_type": "text" },
            "items": { "uid": "items", "display_name": "Items", "data_type": "text", "multiple": true },
            "locked": {
                "uid": "locked",
                "display_name": "Locked",
                "data_type": "text",
                "field_metadata": { "update_restrict": true }
            },
            "cover": { "uid": "cover", "display_name": "Cover", "data_type": "file" }
        }
    })
}

fn host_responder(event_type: &str, payload: &Value) -> Option<Result<Value, Value>> {
    match event_type {
        events::INIT => Some(Ok(json!({ "windowType": "iframe", "locale": "en-us" }))),
        events::GET_FIELD_SCHEMA => Some(Ok(schema_reply())),
        events::GET_PERMISSIONS => Some(Ok(json!({ "update": true }))),
        events::GET_WORKFLOW_STAGE => Some(Ok(json!({ "name": "Draft", "updateAllowed": true }))),
        events::GET_FIELD_DATA => {
            let stored = match payload["entryPath"].as_str() {
                Some("summary") => json!("Full summary text"),
                _ => Value::Null,
            };
            Some(Ok(json!({ "fieldData": stored })))
        }
        _ => None,
    }
}

struct Harness {
    pool: LocalPool,
    page: Rc<MemoryPage>,
    host: Rc<FakeHost>,
    channel: Rc<Channel>,
    editor: VisualEditor,
    clock_ms: f64,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    fn with_config(config: EditorConfig) -> Self {
        let pool = LocalPool::new();
        let page = Rc::new(MemoryPage::new());
        let host = FakeHost::new();
        host.respond_with(host_responder);
        let target: Rc<dyn MessageTarget> = host.clone();
        let channel = Rc::new(Channel::new(CHANNEL_ID, Rc::downgrade(&target)));
        let editor = VisualEditor::new(
            page.clone(),
            Some(Rc::clone(&channel)),
            Rc::new(pool.spawner()),
            config,
        );
        let mut harness = Self {
            pool,
            page,
            host,
            channel,
            editor,
            clock_ms: 0.0,
        };
        harness.settle();
        harness
    }

    /// Runs tasks and answers host requests until nothing moves.
    fn settle(&mut self) {
        loop {
            self.pool.run_until_stalled();
            if !self.host.pump(&self.channel) {
                break;
            }
        }
    }

    fn field(&self, parent: NodeId, tag: &str, path: &str, text: &str) -> NodeId {
        let node = self.page.append_element(parent, tag, &[(CSLP, path)]);
        self.page.append_text(node, text);
        self.page.set_rect(node, Rect::new(10.0, 10.0, 200.0, 30.0));
        node
    }

    fn click(&mut self, node: NodeId) {
        self.editor.click(PointerSample::new(15.0, 15.0, node));
        self.settle();
    }

    fn hover(&mut self, node: NodeId) {
        self.clock_ms += 100.0;
        self.editor
            .pointer_move(PointerSample::new(15.0, 15.0, node), self.clock_ms);
    }

    fn type_text(&self, node: NodeId, text: &str) {
        self.page.set_text_content(node, text);
        self.editor.input(node);
    }

    fn mask(&self) -> NodeId {
        self.page
            .find_by_class("visual-builder__overlay--top")
            .expect("mask panel should be mounted")
    }

    fn payloads(&self, event_type: &str) -> Vec<Value> {
        self.host
            .requests(event_type)
            .into_iter()
            .map(|message| message.payload)
            .collect()
    }

    fn position_of(&self, event_type: &str, nth: usize) -> usize {
        self.host
            .sent
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, message)| message.kind == MessageKind::Request && message.event_type == event_type)
            .nth(nth)
            .map(|(position, _)| position)
            .expect("message should have been sent")
    }

    /// Delivers a host-initiated request and returns the posted reply.
    fn dispatch(&mut self, event_type: &str, payload: Value) -> WireMessage {
        let correlation_id = format!("host-{}", self.host.sent.borrow().len());
        let request = WireMessage::request(CHANNEL_ID, correlation_id.clone(), event_type, payload);
        let task = self
            .channel
            .handle_message(request)
            .expect("requests produce a handler task");
        self.pool
            .spawner()
            .spawn_local(task)
            .expect("handler task should spawn");
        self.settle();
        self.host
            .sent
            .borrow()
            .iter()
            .find(|message| message.kind == MessageKind::Reply && message.correlation_id == correlation_id)
            .cloned()
            .expect("host request should be answered")
    }

    fn overlay_visible(&self) -> bool {
        let wrapper = self
            .page
            .find_by_class(OVERLAY_WRAPPER_CLASS)
            .expect("overlay wrapper mounted");
        self.page.has_class(wrapper, VISIBLE_CLASS)
    }

    fn cursor_visible(&self) -> bool {
        let cursor = self.page.find_by_class(CURSOR_CLASS).expect("cursor mounted");
        self.page.has_class(cursor, VISIBLE_CLASS)
    }

    fn cursor_icon(&self) -> Option<String> {
        let icon = self.page.find_by_class(CURSOR_ICON_CLASS)?;
        self.page.attribute(icon, "data-icon")
    }
}

#[test]
fn edited_field_commits_once_on_mask_click() {
    let mut harness = Harness::with_config(EditorConfig::default().with_identity_attribute("data-field-id"));
    let page = Rc::clone(&harness.page);
    let paragraph = page.append_element(page.body(), "p", &[("data-field-id", "ct.entry.en-us.title")]);
    page.append_text(paragraph, "Hello world");
    page.set_rect(paragraph, Rect::new(10.0, 10.0, 200.0, 30.0));

    harness.click(paragraph);
    assert!(page.is_content_editable(paragraph));
    assert!(harness.overlay_visible());
    assert_eq!(harness.editor.phase(), FocusPhase::Focused);

    harness.type_text(paragraph, "test text");
    let mask = harness.mask();
    harness.click(mask);

    let updates = harness.payloads(events::UPDATE_FIELD);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["data"], "test text");
    assert_eq!(updates[0]["fieldMetadata"]["fieldPath"], "title");
    assert!(!page.is_content_editable(paragraph));
    assert!(!harness.overlay_visible());
    assert_eq!(harness.editor.selected_node(), None);
}

#[test]
fn focus_without_typing_sends_no_update() {
    let mut harness = Harness::new();
    let title = harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");

    harness.click(title);
    harness.editor.escape();

    assert!(harness.payloads(events::UPDATE_FIELD).is_empty());
    assert_eq!(harness.editor.phase(), FocusPhase::Idle);
}

#[test]
fn sibling_instances_commit_with_their_own_index() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let list = page.append_element(page.body(), "ul", &[(CSLP, "ct.entry.en-us.items")]);
    let first = harness.field(list, "li", "ct.entry.en-us.items.0", "First");
    let second = harness.field(list, "li", "ct.entry.en-us.items.1", "Second");

    harness.click(first);
    harness.type_text(first, "First edited");
    harness.click(second);
    assert!(page.is_content_editable(second));
    harness.type_text(second, "Second edited");
    harness.editor.escape();

    let updates = harness.payloads(events::UPDATE_FIELD);
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0]["data"], "First edited");
    assert_eq!(updates[0]["fieldMetadata"]["multipleFieldMetadata"]["index"], 0);
    assert_eq!(updates[1]["data"], "Second edited");
    assert_eq!(updates[1]["fieldMetadata"]["multipleFieldMetadata"]["index"], 1);
    assert_eq!(
        updates[1]["fieldMetadata"]["multipleFieldMetadata"]["parentDetails"]["parentCslpValue"],
        "ct.entry.en-us.items"
    );

    assert!(
        harness.position_of(events::UPDATE_FIELD, 0) < harness.position_of(events::FOCUS_FIELD, 1),
        "first field must be committed before the second is focused"
    );
}

#[test]
fn clicking_the_selected_field_again_is_a_no_op() {
    let mut harness = Harness::new();
    let title = harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");

    harness.click(title);
    harness.type_text(title, "Hello there");
    harness.click(title);

    assert_eq!(harness.payloads(events::MOUSE_CLICK).len(), 1);
    assert!(harness.payloads(events::UPDATE_FIELD).is_empty());
    assert!(harness.page.is_content_editable(title));
}

#[test]
fn rapid_second_click_wins_over_pending_focus() {
    let mut harness = Harness::new();
    let body = harness.page.body();
    let title = harness.field(body, "h1", "ct.entry.en-us.title", "Hello");
    let summary = harness.field(body, "p", "ct.entry.en-us.body", "Text");

    harness.editor.click(PointerSample::new(0.0, 0.0, title));
    harness.editor.click(PointerSample::new(0.0, 0.0, summary));
    harness.settle();

    assert_eq!(harness.editor.selected_node(), Some(summary));
    assert!(!harness.page.is_content_editable(title));
    assert!(harness.page.is_content_editable(summary));
    assert_eq!(harness.payloads(events::FOCUS_FIELD).len(), 1);
}

#[test]
fn click_outside_any_field_releases_focus() {
    let mut harness = Harness::new();
    let body = harness.page.body();
    let title = harness.field(body, "h1", "ct.entry.en-us.title", "Hello");
    let plain = harness.page.append_element(body, "div", &[]);

    harness.click(title);
    harness.type_text(title, "Changed");
    harness.click(plain);

    assert_eq!(harness.payloads(events::UPDATE_FIELD).len(), 1);
    assert_eq!(harness.editor.selected_node(), None);
}

#[test]
fn hover_shows_loading_cursor_then_field_type_and_instance_buttons() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let list = page.append_element(page.body(), "ul", &[(CSLP, "ct.entry.en-us.items")]);
    let first = harness.field(list, "li", "ct.entry.en-us.items.0", "First");
    let second = harness.field(list, "li", "ct.entry.en-us.items.1", "Second");
    page.set_rect(second, Rect::new(10.0, 50.0, 200.0, 30.0));
    let plain = page.append_element(page.body(), "div", &[]);

    harness.hover(first);
    assert!(harness.cursor_visible());
    assert_eq!(harness.cursor_icon().as_deref(), Some("loading"));

    harness.settle();
    assert_eq!(harness.cursor_icon().as_deref(), Some("field"));
    assert_eq!(page.find_all_by_class(ADD_INSTANCE_BUTTON_CLASS).len(), 2);
    assert_eq!(harness.editor.phase(), FocusPhase::Hovering);

    harness.hover(plain);
    assert!(!harness.cursor_visible());
    assert!(page.find_all_by_class(ADD_INSTANCE_BUTTON_CLASS).is_empty());
    assert_eq!(harness.editor.hovered_node(), None);
    assert_eq!(harness.editor.phase(), FocusPhase::Idle);
}

#[test]
fn leaving_a_field_mid_fetch_leaves_no_affordances() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let list = page.append_element(page.body(), "ul", &[(CSLP, "ct.entry.en-us.items")]);
    let first = harness.field(list, "li", "ct.entry.en-us.items.0", "First");
    harness.field(list, "li", "ct.entry.en-us.items.1", "Second");
    let plain = page.append_element(page.body(), "div", &[]);

    harness.hover(first);
    harness.hover(plain);
    harness.settle();

    assert!(!harness.cursor_visible());
    assert!(page.find_all_by_class(ADD_INSTANCE_BUTTON_CLASS).is_empty());
}

#[test]
fn pointer_moves_are_throttled_until_flushed() {
    let mut harness = Harness::new();
    let title = harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");
    let plain = harness.page.append_element(harness.page.body(), "div", &[]);

    harness
        .editor
        .pointer_move(PointerSample::new(0.0, 0.0, title), 1000.0);
    harness
        .editor
        .pointer_move(PointerSample::new(0.0, 0.0, plain), 1003.0);
    assert_eq!(harness.editor.hovered_node(), Some(title));

    harness.editor.flush_pointer(1010.0);
    assert_eq!(harness.editor.hovered_node(), None);
    harness.settle();
}

#[test]
fn add_instance_button_reports_insertion_index() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let list = page.append_element(page.body(), "ul", &[(CSLP, "ct.entry.en-us.items")]);
    harness.field(list, "li", "ct.entry.en-us.items.0", "First");
    let second = harness.field(list, "li", "ct.entry.en-us.items.1", "Second");
    page.set_rect(second, Rect::new(10.0, 50.0, 200.0, 30.0));

    harness.hover(second);
    harness.settle();
    let buttons = page.find_all_by_class(ADD_INSTANCE_BUTTON_CLASS);
    harness.hover(buttons[1]);
    assert_eq!(page.find_all_by_class(ADD_INSTANCE_BUTTON_CLASS).len(), 2);
    harness.click(buttons[1]);

    let added = harness.payloads(events::ADD_INSTANCE);
    assert_eq!(added.len(), 1);
    assert_eq!(added[0]["index"], 2);
    assert_eq!(added[0]["fieldMetadata"]["fieldPath"], "items");
    assert_eq!(harness.editor.selected_node(), None);
}

#[test]
fn disabled_field_gets_overlay_but_no_editing() {
    let mut harness = Harness::new();
    let locked = harness.field(harness.page.body(), "p", "ct.entry.en-us.locked", "Fixed");

    harness.click(locked);

    assert!(!harness.page.is_content_editable(locked));
    assert!(harness.overlay_visible());
    let toolbar = harness.page.find_by_class(TOOLBAR_CLASS).expect("toolbar mounted");
    assert_eq!(harness.page.attribute(toolbar, "data-disabled").as_deref(), Some("true"));
    let outline = harness
        .page
        .find_by_class(OVERLAY_OUTLINE_CLASS)
        .expect("outline mounted");
    assert_eq!(harness.page.style(outline, "outline-color").as_deref(), Some("#909090"));

    let focus = harness.payloads(events::FOCUS_FIELD);
    assert_eq!(focus[0]["disabled"], true);
    assert_eq!(focus[0]["reason"], "This field is not editable as it is restricted");
}

#[test]
fn non_inline_field_is_focused_without_editing() {
    let mut harness = Harness::new();
    let cover = harness.field(harness.page.body(), "div", "ct.entry.en-us.cover", "image");

    harness.click(cover);

    assert_eq!(harness.editor.selected_node(), Some(cover));
    assert!(!harness.page.is_content_editable(cover));
    assert!(harness.host.requests(events::GET_FIELD_DATA).is_empty());
}

#[test]
fn diverging_stored_value_edits_through_pseudo_element() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let summary = harness.field(page.body(), "p", "ct.entry.en-us.summary", "Full sum…");

    harness.click(summary);
    let pseudo = page.find_by_class(PSEUDO_CLASS).expect("pseudo-editable spawned");
    assert_eq!(page.text_content(pseudo), "Full summary text");
    assert!(page.is_content_editable(pseudo));
    assert!(!page.is_content_editable(summary));
    assert_eq!(page.style(summary, "visibility").as_deref(), Some("hidden"));

    harness.click(pseudo);
    assert_eq!(harness.payloads(events::MOUSE_CLICK).len(), 1);

    harness.type_text(pseudo, "Edited summary");
    harness.editor.escape();

    let updates = harness.payloads(events::UPDATE_FIELD);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["data"], "Edited summary");
    assert!(!page.is_connected(pseudo));
    assert_eq!(page.style(summary, "visibility"), None);
}

#[test]
fn multiline_commit_joins_blocks_with_newlines() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let body_field = harness.field(page.body(), "div", "ct.entry.en-us.body", "One");

    harness.click(body_field);
    let line = page.append_element(body_field, "div", &[]);
    page.append_text(line, "Two");
    harness.editor.input(line);
    harness.editor.escape();

    let updates = harness.payloads(events::UPDATE_FIELD);
    assert_eq!(updates[0]["data"], "One\nTwo");
}

#[test]
fn identity_change_re_evaluates_the_focused_node() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let title = harness.field(page.body(), "h1", "ct.entry.en-us.title", "Hello");

    harness.click(title);
    page.set_attribute(title, CSLP, "ct.entry2.en-us.title");
    harness.editor.mutations(&[MutationRecord::Attribute {
        target: title,
        name: CSLP.to_string(),
    }]);
    harness.settle();

    assert_eq!(harness.editor.selected_node(), Some(title));
    let clicks = harness.payloads(events::MOUSE_CLICK);
    assert_eq!(clicks.len(), 2);
    assert_eq!(clicks[1]["fieldMetadata"]["entryUid"], "entry2");
    assert!(page.is_observing_mutations());
    assert!(page.is_content_editable(title));
}

#[test]
fn removed_focus_target_falls_back_to_full_unfocus() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let title = harness.field(page.body(), "h1", "ct.entry.en-us.title", "Hello");

    harness.click(title);
    harness.hover(title);
    harness.type_text(title, "Bye");
    page.remove_node(title);
    harness.editor.mutations(&[MutationRecord::ChildList {
        target: page.body(),
        added: Vec::new(),
        removed: vec![title],
    }]);
    harness.settle();

    assert_eq!(harness.editor.phase(), FocusPhase::Idle);
    assert!(!harness.overlay_visible());
    assert!(!harness.cursor_visible());
    assert!(!page.is_observing_mutations());
    assert_eq!(harness.payloads(events::UPDATE_FIELD).len(), 1);
}

#[test]
fn viewport_change_repositions_the_outline() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let title = harness.field(page.body(), "h1", "ct.entry.en-us.title", "Hello");
    harness.click(title);

    let outline = page.find_by_class(OVERLAY_OUTLINE_CLASS).expect("outline mounted");
    assert_eq!(page.style(outline, "top").as_deref(), Some("10px"));

    page.set_rect(title, Rect::new(10.0, 40.0, 200.0, 30.0));
    harness.editor.viewport_changed();
    assert_eq!(page.style(outline, "top").as_deref(), Some("40px"));
    assert_eq!(harness.editor.selected_node(), Some(title));
}

#[test]
fn overlay_appears_once_a_collapsed_field_gains_layout() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let title = harness.field(page.body(), "h1", "ct.entry.en-us.title", "Hello");
    page.set_rect(title, Rect::new(10.0, 10.0, 0.0, 0.0));

    harness.click(title);
    assert_eq!(harness.editor.selected_node(), Some(title));
    assert!(!harness.overlay_visible());

    page.set_rect(title, Rect::new(10.0, 10.0, 200.0, 30.0));
    harness.editor.viewport_changed();
    assert!(harness.overlay_visible());
    let outline = page.find_by_class(OVERLAY_OUTLINE_CLASS).expect("outline mounted");
    assert_eq!(page.style(outline, "width").as_deref(), Some("200px"));
}

#[test]
fn hovered_instance_removed_during_lookup_leaves_no_affordances() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let list = page.append_element(page.body(), "ul", &[(CSLP, "ct.entry.en-us.items")]);
    let first = harness.field(list, "li", "ct.entry.en-us.items.0", "First");
    harness.field(list, "li", "ct.entry.en-us.items.1", "Second");

    harness.hover(first);
    page.remove_node(first);
    harness.settle();

    assert_eq!(harness.editor.hovered_node(), None);
    assert!(!harness.cursor_visible());
    assert!(page.find_all_by_class(ADD_INSTANCE_BUTTON_CLASS).is_empty());
}

#[test]
fn empty_repeating_field_gets_placeholder_that_adds_first_instance() {
    let mut harness = Harness::new();
    let page = Rc::clone(&harness.page);
    let list = page.append_element(page.body(), "ul", &[(CSLP, "ct.entry.en-us.items")]);
    harness.editor.mutations(&[MutationRecord::ChildList {
        target: page.body(),
        added: vec![list],
        removed: Vec::new(),
    }]);
    harness.settle();

    let placeholder = page.find_by_class(EMPTY_BLOCK_CLASS).expect("placeholder rendered");
    harness.click(placeholder);
    let added = harness.payloads(events::ADD_INSTANCE);
    assert_eq!(added.len(), 1);
    assert_eq!(added[0]["index"], 0);
    assert_eq!(harness.editor.selected_node(), None);

    let item = harness.field(list, "li", "ct.entry.en-us.items.0", "New");
    harness.editor.mutations(&[MutationRecord::ChildList {
        target: list,
        added: vec![item],
        removed: Vec::new(),
    }]);
    harness.settle();
    assert!(page.find_by_class(EMPTY_BLOCK_CLASS).is_none());
}

#[test]
fn missing_host_degrades_to_silent_no_ops() {
    let mut pool = LocalPool::new();
    let page = Rc::new(MemoryPage::new());
    let editor = VisualEditor::new(page.clone(), None, Rc::new(pool.spawner()), EditorConfig::default());
    let title = page.append_element(page.body(), "h1", &[(CSLP, "ct.entry.en-us.title")]);
    page.set_rect(title, Rect::new(0.0, 0.0, 100.0, 20.0));

    editor.click(PointerSample::new(0.0, 0.0, title));
    pool.run_until_stalled();

    assert_eq!(editor.selected_node(), None);
    assert!(!page.is_content_editable(title));
    let info = pool.run_until(editor.init()).expect("init without host is not an error");
    assert_eq!(info, None);
}

#[test]
fn bootstrap_stores_locale_for_host_queries() {
    let mut harness = Harness::new();
    let editor = harness.editor.clone();
    let outcome = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&outcome);
    harness
        .pool
        .spawner()
        .spawn_local(async move {
            *slot.borrow_mut() = Some(editor.init().await);
        })
        .expect("spawn init");
    harness.settle();

    let info = outcome
        .borrow_mut()
        .take()
        .expect("init settled")
        .expect("init succeeds")
        .expect("host present");
    assert_eq!(info.window_type.as_deref(), Some("iframe"));

    let reply = harness.dispatch(events::GET_LOCALE, Value::Null);
    assert_eq!(reply.payload, json!({ "locale": "en-us" }));
}

#[test]
fn revalidation_failure_reloads_the_page() {
    let mut harness = Harness::new();
    let title = harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");
    harness.click(title);

    harness.host.respond_with(|event_type, payload| {
        if event_type == events::GET_FIELD_SCHEMA {
            Some(Err(json!({ "message": "schema service unavailable" })))
        } else {
            host_responder(event_type, payload)
        }
    });
    let reply = harness.dispatch(events::REVALIDATE_FIELD_DATA, json!({}));

    assert!(!reply.is_error());
    assert_eq!(harness.page.reload_count(), 1);
}

#[test]
fn revalidation_refetches_schema_and_keeps_focus() {
    let mut harness = Harness::new();
    let title = harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");
    harness.click(title);
    let schema_requests = harness.host.requests(events::GET_FIELD_SCHEMA).len();

    harness.dispatch(events::REVALIDATE_FIELD_DATA, json!({}));

    assert_eq!(harness.page.reload_count(), 0);
    assert_eq!(harness.host.requests(events::GET_FIELD_SCHEMA).len(), schema_requests + 1);
    assert_eq!(harness.editor.selected_node(), Some(title));
}

#[test]
fn hide_focus_overlay_releases_selection() {
    let mut harness = Harness::new();
    let title = harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");
    harness.click(title);
    harness.type_text(title, "Hi");

    harness.dispatch(events::HIDE_FOCUS_OVERLAY, json!({}));

    assert_eq!(harness.editor.selected_node(), None);
    assert_eq!(harness.payloads(events::UPDATE_FIELD).len(), 1);
}

#[test]
fn audience_mode_disables_base_entry_fields() {
    let mut harness = Harness::new();
    let body = harness.page.body();
    let base = harness.field(body, "h1", "ct.entry.en-us.title", "Base");
    let variant = harness.field(body, "h2", "v2:ct.entry_v1.en-us.summary", "Full summary text");

    harness.dispatch(events::SET_AUDIENCE_MODE, json!({ "audienceMode": true }));
    assert!(harness.editor.mode().audience);

    harness.click(base);
    assert!(!harness.page.is_content_editable(base));
    harness.click(variant);
    assert!(harness.page.is_content_editable(variant));
}

#[test]
fn malformed_host_payload_is_rejected() {
    let mut harness = Harness::new();
    let reply = harness.dispatch(events::SET_AUDIENCE_MODE, json!({ "audienceMode": "yes" }));
    assert!(reply.is_error());
    assert!(!harness.editor.mode().audience);
}

#[test]
fn variant_fields_are_tagged_and_reported() {
    let mut harness = Harness::new();
    let body = harness.page.body();
    let base = harness.field(body, "h1", "ct.entry.en-us.title", "Base");
    let shown = harness.field(body, "h2", "v2:ct.entry_v1.en-us.title", "Variant");
    let other = harness.field(body, "h3", "v2:ct.entry_v2.en-us.title", "Other");

    harness.dispatch(events::SHOW_VARIANT_FIELDS, json!({ "variant": "v1" }));
    assert!(harness.page.has_class(base, BASE_FIELD_CLASS));
    assert!(harness.page.has_class(shown, VARIANT_FIELD_CLASS));
    assert!(!harness.page.has_class(other, VARIANT_FIELD_CLASS));
    assert!(!harness.page.has_class(other, BASE_FIELD_CLASS));

    let reply = harness.dispatch(events::GET_VARIANT_ID, Value::Null);
    assert_eq!(reply.payload, json!({ "variant": "v1" }));

    harness.dispatch(events::REMOVE_VARIANT_FIELDS, Value::Null);
    assert!(!harness.page.has_class(base, BASE_FIELD_CLASS));
    assert!(!harness.page.has_class(shown, VARIANT_FIELD_CLASS));
    assert_eq!(harness.editor.mode().variant, None);
}

#[test]
fn comment_highlights_follow_host_requests() {
    let mut harness = Harness::new();
    harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");

    harness.dispatch(
        events::HIGHLIGHT_ACTIVE_COMMENTS,
        json!({ "paths": ["ct.entry.en-us.title"] }),
    );
    assert_eq!(harness.page.find_all_by_class(COMMENT_ICON_CLASS).len(), 1);

    harness.dispatch(events::REMOVE_HIGHLIGHTED_COMMENTS, Value::Null);
    assert!(harness.page.find_by_class(COMMENT_ICON_CLASS).is_none());
}

#[test]
fn collaboration_mode_turns_clicks_into_threads() {
    let mut harness = Harness::new();
    let title = harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");

    harness.dispatch(events::TOGGLE_COLLAB, json!({ "enabled": true }));
    harness.click(title);

    assert_eq!(harness.editor.selected_node(), None);
    assert!(harness.payloads(events::MOUSE_CLICK).is_empty());
    let threads = harness.payloads(events::COLLAB_CREATE_THREAD);
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["fieldMetadata"]["fieldPath"], "title");
    assert_eq!(threads[0]["position"], json!({ "x": 15.0, "y": 15.0 }));

    harness.dispatch(events::TOGGLE_COLLAB, json!({ "enabled": false }));
    harness.click(title);
    assert_eq!(harness.editor.selected_node(), Some(title));
}

#[test]
fn url_change_commits_and_notifies_host() {
    let mut harness = Harness::new();
    let title = harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");
    harness.click(title);
    harness.type_text(title, "Changed");

    harness.editor.url_changed("/blog/next");

    assert_eq!(harness.payloads(events::UPDATE_FIELD).len(), 1);
    assert_eq!(
        harness.payloads(events::URL_CHANGE),
        vec![json!({ "url": "/blog/next" })]
    );
    assert_eq!(harness.editor.phase(), FocusPhase::Idle);
}

#[test]
fn destroy_removes_affordances_and_handlers() {
    let mut harness = Harness::new();
    let title = harness.field(harness.page.body(), "h1", "ct.entry.en-us.title", "Hello");
    harness.click(title);
    harness.hover(title);
    harness.type_text(title, "Last words");

    harness.editor.destroy();

    assert!(harness.editor.is_destroyed());
    assert_eq!(harness.payloads(events::UPDATE_FIELD).len(), 1);
    assert!(harness.page.find_by_class(OVERLAY_WRAPPER_CLASS).is_none());
    assert!(harness.page.find_by_class(CURSOR_CLASS).is_none());
    assert!(!harness.channel.has_handler(events::HIDE_FOCUS_OVERLAY));
    assert!(!harness.page.is_observing_mutations());

    harness.hover(title);
    harness.editor.click(PointerSample::new(0.0, 0.0, title));
    harness.settle();
    assert_eq!(harness.editor.phase(), FocusPhase::Idle);
}
