use crate::dom::{descendants_with_attribute, NodeId, Page};
use crate::geometry::px;

pub const COMMENT_ICON_CLASS: &str = "visual-builder__comment-icon";
const COMMENT_PATH_ATTRIBUTE: &str = "data-comment-path";
const ICON_SIZE: f64 = 24.0;

/// Icons flagging fields that carry open comment threads.
#[derive(Debug, Default)]
pub struct CommentHighlights {
    icons: Vec<(NodeId, NodeId)>,
}

impl CommentHighlights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    /// Replaces the current icons with one per rendered field matching
    /// `paths`; paths with no node on the page are skipped.
    pub fn highlight(&mut self, page: &dyn Page, identity_attribute: &str, paths: &[String]) {
        self.clear(page);
        for field in descendants_with_attribute(page, page.body(), identity_attribute) {
            let Some(path) = page.attribute(field, identity_attribute) else {
                continue;
            };
            if !paths.iter().any(|wanted| *wanted == path) {
                continue;
            }
            let icon = page.create_element("div");
            page.add_class(icon, COMMENT_ICON_CLASS);
            page.set_attribute(icon, COMMENT_PATH_ATTRIBUTE, &path);
            page.append_child(page.body(), icon);
            self.icons.push((field, icon));
        }
        tracing::debug!(requested = paths.len(), rendered = self.icons.len(), "comment highlights updated");
        self.reposition(page);
    }

    /// Pins every icon to the top-right corner of its field.
    pub fn reposition(&self, page: &dyn Page) {
        let viewport = page.viewport();
        for (field, icon) in &self.icons {
            let rect = page.bounding_rect(*field);
            page.set_style(*icon, "top", &px(rect.top + viewport.scroll_y - ICON_SIZE / 2.0));
            page.set_style(*icon, "left", &px(rect.right + viewport.scroll_x - ICON_SIZE / 2.0));
        }
    }

    pub fn clear(&mut self, page: &dyn Page) {
        for (_, icon) in self.icons.drain(..) {
            page.remove_node(icon);
        }
    }
}
