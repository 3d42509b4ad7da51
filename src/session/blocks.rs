use std::rc::Rc;

use super::Inner;
use crate::dom::descendants_with_attribute;
use crate::overlay::{empty_block_of, render_empty_block};
use crate::path::FieldLocator;

impl Inner {
    /// Adds a placeholder to every repeating field rendered without
    /// instances, and drops placeholders whose field has gained some.
    pub(super) async fn refresh_empty_blocks(self: Rc<Self>) {
        let attribute = self.identity_attribute().to_string();
        let fields = descendants_with_attribute(self.page(), self.page().body(), &attribute);

        for container in fields {
            if self.destroyed.get() {
                return;
            }
            let page = self.page();
            let Some(raw) = page.attribute(container, &attribute) else {
                continue;
            };
            let locator = FieldLocator::parse(&raw);
            if !locator.is_valid() || locator.is_instance() {
                continue;
            }

            let has_instances = descendants_with_attribute(page, container, &attribute)
                .into_iter()
                .filter_map(|child| page.attribute(child, &attribute))
                .map(|path| FieldLocator::parse(&path))
                .any(|child| {
                    child
                        .multiple_field_metadata
                        .parent_details
                        .is_some_and(|parent| parent.parent_cslp_value == locator.cslp_value)
                });
            let placeholder = empty_block_of(page, container);
            if has_instances {
                if let Some(placeholder) = placeholder {
                    page.remove_node(placeholder);
                }
                continue;
            }
            if placeholder.is_some() {
                continue;
            }

            let Some(schema) = self.store.field_schema(&locator).await else {
                continue;
            };
            let page = self.page();
            if self.destroyed.get() || !page.is_connected(container) || !schema.is_multi_instance() {
                continue;
            }
            if empty_block_of(page, container).is_none() {
                render_empty_block(page, container, &locator);
                tracing::debug!(path = %locator.cslp_value, "empty block placeholder added");
            }
        }
    }
}
