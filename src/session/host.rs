use std::future::Future;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::Inner;
use crate::channel::{events, Channel};
use crate::dom::descendants_with_attribute;
use crate::path::FieldLocator;

pub const VARIANT_FIELD_CLASS: &str = "visual-builder__variant-field";
pub const BASE_FIELD_CLASS: &str = "visual-builder__base-field";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudienceModePayload {
    audience_mode: bool,
}

#[derive(Debug, Deserialize)]
struct CollabPayload {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct VariantPayload {
    variant: String,
}

#[derive(Debug, Deserialize)]
struct CommentPathsPayload {
    #[serde(default)]
    paths: Vec<String>,
}

fn decode<T: DeserializeOwned>(event_type: &str, payload: Value) -> Result<T, Value> {
    serde_json::from_value(payload).map_err(|err| {
        tracing::debug!(event_type, %err, "malformed host payload");
        json!({ "error": true, "message": err.to_string() })
    })
}

/// Registers `handler` for `event_type`, holding the session weakly so the
/// channel never keeps a destroyed session alive.
fn on_event<F, Fut>(channel: &Channel, inner: &Rc<Inner>, event_type: &'static str, handler: F)
where
    F: Fn(Rc<Inner>, Value) -> Fut + 'static,
    Fut: Future<Output = Result<Value, Value>> + 'static,
{
    let session = Rc::downgrade(inner);
    channel.register_event(event_type, move |payload| {
        let pending = session
            .upgrade()
            .filter(|inner| !inner.destroyed.get())
            .map(|inner| handler(inner, payload));
        async move {
            match pending {
                Some(pending) => pending.await,
                None => Ok(Value::Null),
            }
        }
    });
}

pub(super) fn register(channel: &Channel, inner: &Rc<Inner>) {
    on_event(channel, inner, events::HIDE_FOCUS_OVERLAY, |inner, _| async move {
        inner.release_focus();
        Ok(Value::Null)
    });

    on_event(channel, inner, events::REVALIDATE_FIELD_DATA, |inner, _| async move {
        inner.revalidate().await;
        Ok(Value::Null)
    });

    on_event(channel, inner, events::SET_AUDIENCE_MODE, |inner, payload| async move {
        let AudienceModePayload { audience_mode } = decode(events::SET_AUDIENCE_MODE, payload)?;
        inner.mode.borrow_mut().audience = audience_mode;
        Ok(Value::Null)
    });

    on_event(channel, inner, events::TOGGLE_COLLAB, |inner, payload| async move {
        let CollabPayload { enabled } = decode(events::TOGGLE_COLLAB, payload)?;
        inner.mode.borrow_mut().collab = enabled;
        if enabled {
            inner.release_focus();
            inner.clear_hover();
        }
        Ok(Value::Null)
    });

    on_event(channel, inner, events::SHOW_VARIANT_FIELDS, |inner, payload| async move {
        let VariantPayload { variant } = decode(events::SHOW_VARIANT_FIELDS, payload)?;
        inner.show_variant_fields(&variant);
        inner.mode.borrow_mut().variant = Some(variant);
        Ok(Value::Null)
    });

    on_event(channel, inner, events::REMOVE_VARIANT_FIELDS, |inner, _| async move {
        inner.remove_variant_fields();
        Ok(Value::Null)
    });

    on_event(channel, inner, events::GET_VARIANT_ID, |inner, _| async move {
        Ok(json!({ "variant": inner.mode.borrow().variant }))
    });

    on_event(channel, inner, events::GET_LOCALE, |inner, _| async move {
        Ok(json!({ "locale": inner.mode.borrow().locale }))
    });

    on_event(channel, inner, events::HIGHLIGHT_ACTIVE_COMMENTS, |inner, payload| async move {
        let CommentPathsPayload { paths } = decode(events::HIGHLIGHT_ACTIVE_COMMENTS, payload)?;
        inner
            .comments
            .borrow_mut()
            .highlight(inner.page(), inner.identity_attribute(), &paths);
        Ok(Value::Null)
    });

    on_event(channel, inner, events::REMOVE_HIGHLIGHTED_COMMENTS, |inner, _| async move {
        inner.comments.borrow_mut().clear(inner.page());
        Ok(Value::Null)
    });
}

pub(super) fn unregister(channel: &Channel) {
    for event_type in events::INBOUND {
        channel.unregister_event(event_type);
    }
}

impl Inner {
    /// Drops every cached lookup and refetches what the focused field needs.
    /// When the host cannot answer, in-memory state is no longer trustworthy
    /// and the page is reloaded.
    async fn revalidate(self: &Rc<Self>) {
        self.store.clear();
        let selected = self
            .state
            .borrow()
            .selected()
            .map(|field| (field.node, field.locator.content_type_uid.clone()));

        if let Some((node, content_type_uid)) = selected {
            if let Err(err) = self.store.schema_map(&content_type_uid).await {
                tracing::warn!(%err, "revalidation failed; reloading page");
                self.page.reload();
                return;
            }
            if self.state.borrow().is_selected(node) {
                self.focus_node(node, true);
            }
        }
        if self.config.empty_block_placeholders {
            self.spawn(Rc::clone(self).refresh_empty_blocks());
        }
    }

    fn show_variant_fields(&self, variant: &str) {
        let page = self.page();
        for node in descendants_with_attribute(page, page.body(), self.identity_attribute()) {
            let Some(raw) = page.attribute(node, self.identity_attribute()) else {
                continue;
            };
            page.remove_class(node, VARIANT_FIELD_CLASS);
            page.remove_class(node, BASE_FIELD_CLASS);
            match FieldLocator::parse(&raw).variant.as_deref() {
                Some(owner) if owner == variant => page.add_class(node, VARIANT_FIELD_CLASS),
                None => page.add_class(node, BASE_FIELD_CLASS),
                Some(_) => {}
            }
        }
    }

    fn remove_variant_fields(&self) {
        let page = self.page();
        for node in descendants_with_attribute(page, page.body(), self.identity_attribute()) {
            page.remove_class(node, VARIANT_FIELD_CLASS);
            page.remove_class(node, BASE_FIELD_CLASS);
        }
        self.mode.borrow_mut().variant = None;
    }
}
