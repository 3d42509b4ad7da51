use crate::dom::{NodeId, Page};
use crate::geometry::px;

pub(crate) const PSEUDO_EDITABLE_CLASS: &str = "visual-builder__pseudo-editable-element";
/// Inline `visibility` the original carried before it was hidden.
const SAVED_VISIBILITY_ATTRIBUTE: &str = "data-original-visibility";

/// Declarations that would fight the absolute placement of the stand-in.
const POSITION_PROPERTIES: &[&str] = &[
    "position",
    "top",
    "left",
    "right",
    "bottom",
    "inset",
    "transform",
    "translate",
    "margin",
    "margin-top",
    "margin-left",
    "margin-right",
    "margin-bottom",
    "float",
    "display",
    "visibility",
];

/// A stand-in is needed when the rendered text is not the stored value
/// (truncated, formatted, or decorated output would not round-trip).
pub fn needs_pseudo_editable(rendered: &str, stored: Option<&str>) -> bool {
    stored.is_some_and(|stored| stored != rendered)
}

/// Places an absolutely positioned, content-editable copy of `original`
/// holding `value`, and hides the original until the edit ends.
pub fn spawn_pseudo_editable(page: &dyn Page, original: NodeId, value: &str) -> NodeId {
    let tag = page.tag_name(original).unwrap_or_else(|| "div".to_string());
    let pseudo = page.create_element(&tag);

    for (property, declared) in page.computed_style(original) {
        if POSITION_PROPERTIES.contains(&property.as_str()) {
            continue;
        }
        page.set_style(pseudo, &property, &declared);
    }

    let rect = page.bounding_rect(original);
    let viewport = page.viewport();
    page.set_style(pseudo, "position", "absolute");
    page.set_style(pseudo, "top", &px(rect.top + viewport.scroll_y));
    page.set_style(pseudo, "left", &px(rect.left + viewport.scroll_x));
    page.set_style(pseudo, "min-width", &px(rect.width));
    page.set_style(pseudo, "min-height", &px(rect.height));
    page.add_class(pseudo, PSEUDO_EDITABLE_CLASS);
    page.set_attribute(pseudo, "contenteditable", "true");
    page.set_text_content(pseudo, value);
    page.append_child(page.body(), pseudo);

    if let Some(visibility) = page.style(original, "visibility") {
        page.set_attribute(pseudo, SAVED_VISIBILITY_ATTRIBUTE, &visibility);
    }
    page.set_style(original, "visibility", "hidden");
    tracing::debug!(?original, ?pseudo, "pseudo-editable element spawned");
    pseudo
}

pub fn discard_pseudo_editable(page: &dyn Page, original: NodeId, pseudo: NodeId) {
    match page.attribute(pseudo, SAVED_VISIBILITY_ATTRIBUTE) {
        Some(visibility) => page.set_style(original, "visibility", &visibility),
        None => page.remove_style(original, "visibility"),
    }
    page.remove_node(pseudo);
}
