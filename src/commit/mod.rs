//! Reading edited values back out of the page and packaging the update.

mod pseudo;

pub use pseudo::{discard_pseudo_editable, needs_pseudo_editable, spawn_pseudo_editable};

use serde::Serialize;

use crate::dom::{NodeId, NodeKind, Page};
use crate::path::FieldLocator;
use crate::state::EditTarget;

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "blockquote",
    "div",
    "dl",
    "dt",
    "dd",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "tr",
    "ul",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldPayload {
    pub data: String,
    pub field_metadata: FieldLocator,
}

/// Plain text of an editable node. Multiline fields turn block boundaries and
/// `<br>` into newlines so markup never leaks into plain-text values.
pub fn extract_text(page: &dyn Page, node: NodeId, multiline: bool) -> String {
    if !multiline {
        return page.text_content(node);
    }
    let mut text = String::new();
    collect_lines(page, node, &mut text);
    text
}

fn collect_lines(page: &dyn Page, node: NodeId, out: &mut String) {
    for child in page.children(node) {
        match page.node_kind(child) {
            Some(NodeKind::Text) => out.push_str(&page.text_content(child)),
            Some(NodeKind::Element { tag }) if tag == "br" => out.push('\n'),
            Some(NodeKind::Element { tag }) if BLOCK_TAGS.contains(&tag.as_str()) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                collect_lines(page, child, out);
            }
            Some(NodeKind::Element { .. }) => collect_lines(page, child, out),
            None => {}
        }
    }
}

/// Turns inline editing on for `node`.
pub fn make_editable(page: &dyn Page, node: NodeId) {
    page.set_attribute(node, "contenteditable", "true");
}

/// Ends the edit session on `original`: reads the value when the user typed
/// something, removes any pseudo-editable stand-in and restores the original.
///
/// Returns the payload to send, or `None` when nothing was typed.
pub fn finish_edit(
    page: &dyn Page,
    original: NodeId,
    edit: &EditTarget,
    locator: &FieldLocator,
) -> Option<UpdateFieldPayload> {
    let payload = (edit.received_input && page.is_content_editable(edit.editable)).then(|| {
        UpdateFieldPayload {
            data: extract_text(page, edit.editable, edit.multiline),
            field_metadata: locator.clone(),
        }
    });

    match edit.pseudo {
        Some(pseudo) => discard_pseudo_editable(page, original, pseudo),
        None => page.remove_attribute(original, "contenteditable"),
    }
    payload
}
