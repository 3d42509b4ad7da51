use crate::dom::{closest_with_class, NodeId, Page};
use crate::geometry::{px, Rect};
use crate::path::FieldLocator;

pub const ADD_INSTANCE_BUTTON_CLASS: &str = "visual-builder__add-button";
pub const INSTANCE_BUTTONS_CLASS: &str = "visual-builder__instance-buttons";
pub const EMPTY_BLOCK_CLASS: &str = "visual-builder__empty-block";
const INSTANCE_INDEX_ATTRIBUTE: &str = "data-instance-index";
const PARENT_PATH_ATTRIBUTE: &str = "data-parent-path";
const EMPTY_BLOCK_PATH_ATTRIBUTE: &str = "data-empty-block-path";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceDirection {
    /// Instances stack top to bottom; buttons sit on the top and bottom edges.
    Vertical,
    /// Instances flow left to right; buttons sit on the left and right edges.
    Horizontal,
}

/// Reads the list orientation from the nearest sibling instance. A sibling
/// whose vertical center falls inside the hovered box shares its row.
pub fn instance_direction(page: &dyn Page, instance: NodeId, identity_attribute: &str) -> InstanceDirection {
    let Some(parent) = page.parent(instance) else {
        return InstanceDirection::Vertical;
    };
    let rect = page.bounding_rect(instance);
    let sibling = page
        .children(parent)
        .into_iter()
        .filter(|child| *child != instance)
        .find(|child| page.attribute(*child, identity_attribute).is_some());

    match sibling.map(|node| page.bounding_rect(node)) {
        Some(other) if other.center_y() >= rect.top && other.center_y() <= rect.bottom => {
            InstanceDirection::Horizontal
        }
        _ => InstanceDirection::Vertical,
    }
}

/// The first two add-instance buttons under `container`. Anything fewer means
/// the insertion point cannot be bracketed and the affordance is suppressed.
pub fn find_instance_buttons(page: &dyn Page, container: NodeId) -> Option<(NodeId, NodeId)> {
    let mut buttons = page
        .children(container)
        .into_iter()
        .filter(|child| page.has_class(*child, ADD_INSTANCE_BUTTON_CLASS));
    let previous = buttons.next()?;
    let next = buttons.next()?;
    Some((previous, next))
}

/// "Add instance" buttons bracketing the hovered repeating instance.
#[derive(Debug, Default)]
pub struct InstanceButtons {
    container: Option<NodeId>,
}

impl InstanceButtons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_rendered(&self) -> bool {
        self.container.is_some()
    }

    pub fn contains(&self, page: &dyn Page, node: NodeId) -> bool {
        self.container
            .is_some_and(|container| crate::dom::is_descendant_of(page, node, container))
    }

    /// Renders the buttons around `instance`; returns `false` when the
    /// locator is not an instance or the pair could not be placed.
    pub fn render(
        &mut self,
        page: &dyn Page,
        instance: NodeId,
        locator: &FieldLocator,
        direction: InstanceDirection,
    ) -> bool {
        self.clear(page);
        let Some(parent) = locator.multiple_field_metadata.parent_details.as_ref() else {
            return false;
        };
        let Ok(index) = usize::try_from(locator.multiple_field_metadata.index) else {
            return false;
        };

        let container = page.create_element("div");
        page.add_class(container, INSTANCE_BUTTONS_CLASS);
        page.set_attribute(container, PARENT_PATH_ATTRIBUTE, &parent.parent_cslp_value);
        page.append_child(page.body(), container);

        let rect = page.bounding_rect(instance);
        let viewport = page.viewport();
        let (before, after) = anchors(rect, direction);
        for (insert_at, (top, left)) in [(index, before), (index + 1, after)] {
            let button = page.create_element("button");
            page.add_class(button, ADD_INSTANCE_BUTTON_CLASS);
            page.set_attribute(button, INSTANCE_INDEX_ATTRIBUTE, &insert_at.to_string());
            page.set_style(button, "top", &px(top + viewport.scroll_y));
            page.set_style(button, "left", &px(left + viewport.scroll_x));
            page.append_child(container, button);
        }

        self.container = Some(container);
        if find_instance_buttons(page, container).is_none() {
            self.clear(page);
            return false;
        }
        true
    }

    /// Resolves a click on one of the buttons to the repeating field and the
    /// index the new instance should take.
    pub fn target(&self, page: &dyn Page, node: NodeId) -> Option<(FieldLocator, usize)> {
        let container = self.container?;
        let button = closest_with_class(page, node, ADD_INSTANCE_BUTTON_CLASS)?;
        if page.parent(button) != Some(container) {
            return None;
        }
        let index = page.attribute(button, INSTANCE_INDEX_ATTRIBUTE)?.parse().ok()?;
        let parent = page.attribute(container, PARENT_PATH_ATTRIBUTE)?;
        Some((FieldLocator::parse(&parent), index))
    }

    pub fn clear(&mut self, page: &dyn Page) {
        if let Some(container) = self.container.take() {
            page.remove_node(container);
        }
    }
}

fn anchors(rect: Rect, direction: InstanceDirection) -> ((f64, f64), (f64, f64)) {
    match direction {
        InstanceDirection::Vertical => ((rect.top, rect.center_x()), (rect.bottom, rect.center_x())),
        InstanceDirection::Horizontal => ((rect.center_y(), rect.left), (rect.center_y(), rect.right)),
    }
}

/// Adds the placeholder shown inside a repeating field with no instances.
pub fn render_empty_block(page: &dyn Page, container: NodeId, locator: &FieldLocator) -> NodeId {
    let placeholder = page.create_element("div");
    page.add_class(placeholder, EMPTY_BLOCK_CLASS);
    page.set_attribute(placeholder, EMPTY_BLOCK_PATH_ATTRIBUTE, &locator.cslp_value);
    page.set_text_content(placeholder, "This page doesn't have any blocks. Add one to get started.");
    page.append_child(container, placeholder);
    placeholder
}

pub fn empty_block_of(page: &dyn Page, container: NodeId) -> Option<NodeId> {
    page.children(container)
        .into_iter()
        .find(|child| page.has_class(*child, EMPTY_BLOCK_CLASS))
}

/// The repeating field a click inside an empty-block placeholder belongs to.
pub fn empty_block_target(page: &dyn Page, node: NodeId) -> Option<FieldLocator> {
    let placeholder = closest_with_class(page, node, EMPTY_BLOCK_CLASS)?;
    let path = page.attribute(placeholder, EMPTY_BLOCK_PATH_ATTRIBUTE)?;
    Some(FieldLocator::parse(&path))
}
