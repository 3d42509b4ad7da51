//! Field locator codec.
//!
//! Every editable node carries a dotted location string of the form
//! `content_type.entry.locale.field.path`, optionally prefixed with `v2:` when
//! the entry segment names a variant (`entry_variant`). Parsing is total: a
//! malformed string yields a locator with empty identity segments, which
//! callers detect through [`FieldLocator::is_valid`].

use serde::{Deserialize, Serialize};

const VARIANT_PREFIX: &str = "v2:";
const SEGMENT_SEPARATOR: char = '.';
const VARIANT_SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentDetails {
    pub parent_path: String,
    pub parent_cslp_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleFieldMetadata {
    pub parent_details: Option<ParentDetails>,
    /// `-1` when the field is not an instance of a repeating field.
    pub index: i64,
}

impl Default for MultipleFieldMetadata {
    fn default() -> Self {
        Self {
            parent_details: None,
            index: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLocator {
    pub content_type_uid: String,
    pub entry_uid: String,
    pub locale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub field_path: String,
    pub field_path_with_index: String,
    pub multiple_field_metadata: MultipleFieldMetadata,
    pub cslp_value: String,
}

impl FieldLocator {
    pub fn parse(raw: &str) -> Self {
        let (versioned, body) = match raw.strip_prefix(VARIANT_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let segments: Vec<&str> = body
            .split(SEGMENT_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();

        let segment = |index: usize| segments.get(index).copied().unwrap_or_default().to_string();
        let content_type_uid = segment(0);
        let (entry_uid, variant) = split_variant(&segment(1), versioned);
        let locale = segment(2);

        let field_segments = segments.get(3..).unwrap_or_default();
        let field_path_with_index = field_segments.join(".");
        let field_path = field_segments
            .iter()
            .filter(|segment| !is_index_segment(segment))
            .copied()
            .collect::<Vec<_>>()
            .join(".");

        let cslp_value = segments.join(".");
        let multiple_field_metadata = multiple_field_metadata(field_segments, &cslp_value, versioned);

        Self {
            content_type_uid,
            entry_uid,
            locale,
            variant,
            field_path,
            field_path_with_index,
            multiple_field_metadata,
            cslp_value: if versioned {
                format!("{VARIANT_PREFIX}{cslp_value}")
            } else {
                cslp_value
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.content_type_uid.is_empty() && !self.entry_uid.is_empty()
    }

    pub fn is_instance(&self) -> bool {
        self.multiple_field_metadata.index >= 0
    }

    /// Rebuilds the location string, indices included.
    pub fn to_path(&self) -> String {
        let entry = match &self.variant {
            Some(variant) => format!("{}{VARIANT_SEPARATOR}{variant}", self.entry_uid),
            None => self.entry_uid.clone(),
        };
        let mut segments = vec![self.content_type_uid.as_str(), entry.as_str(), self.locale.as_str()];
        if !self.field_path_with_index.is_empty() {
            segments.push(self.field_path_with_index.as_str());
        }
        let body = segments.join(".");
        if self.cslp_value.starts_with(VARIANT_PREFIX) {
            format!("{VARIANT_PREFIX}{body}")
        } else {
            body
        }
    }

    /// The locator of the repeating instance `index` under this field.
    pub fn instance(&self, index: usize) -> Self {
        let mut path = self.to_path();
        path.push(SEGMENT_SEPARATOR);
        path.push_str(&index.to_string());
        Self::parse(&path)
    }
}

fn split_variant(entry_segment: &str, versioned: bool) -> (String, Option<String>) {
    if !versioned {
        return (entry_segment.to_string(), None);
    }
    match entry_segment.split_once(VARIANT_SEPARATOR) {
        Some((entry, variant)) if !variant.is_empty() => (entry.to_string(), Some(variant.to_string())),
        _ => (entry_segment.to_string(), None),
    }
}

pub(crate) fn is_index_segment(segment: &str) -> bool {
    segment
        .parse::<f64>()
        .is_ok_and(|value| value.is_finite())
}

fn multiple_field_metadata(
    field_segments: &[&str],
    cslp_value: &str,
    versioned: bool,
) -> MultipleFieldMetadata {
    let Some(last) = field_segments.last() else {
        return MultipleFieldMetadata::default();
    };
    let Ok(index) = last.parse::<i64>() else {
        return MultipleFieldMetadata::default();
    };
    if field_segments.len() < 2 || index < 0 {
        return MultipleFieldMetadata::default();
    }

    let parent_path = field_segments[..field_segments.len() - 1].join(".");
    let parent_cslp = cslp_value
        .rsplit_once(SEGMENT_SEPARATOR)
        .map(|(parent, _)| parent)
        .unwrap_or_default();
    MultipleFieldMetadata {
        parent_details: Some(ParentDetails {
            parent_path,
            parent_cslp_value: if versioned {
                format!("{VARIANT_PREFIX}{parent_cslp}")
            } else {
                parent_cslp.to_string()
            },
        }),
        index,
    }
}
