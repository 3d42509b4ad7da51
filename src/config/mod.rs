use serde::Deserialize;

const DEFAULT_IDENTITY_ATTRIBUTE: &str = "data-cslp";
const DEFAULT_CHANNEL_ID: &str = "visual-builder";
const DEFAULT_POINTER_THROTTLE_MS: u64 = 10;

/// Start-up options the host page passes as a JSON blob.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Attribute carrying the field location string on editable nodes.
    pub identity_attribute: String,
    pub channel_id: String,
    pub pointer_throttle_ms: u64,
    pub empty_block_placeholders: bool,
    pub collab_enabled: bool,
    /// When off, every field is edited host-side and only the overlay shows.
    pub inline_editing: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            identity_attribute: DEFAULT_IDENTITY_ATTRIBUTE.to_string(),
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            pointer_throttle_ms: DEFAULT_POINTER_THROTTLE_MS,
            empty_block_placeholders: true,
            collab_enabled: false,
            inline_editing: true,
        }
    }
}

impl EditorConfig {
    pub fn from_json(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(raw).unwrap_or_else(|err| {
            tracing::warn!(?err, "failed to parse editor options; using defaults");
            Self::default()
        })
    }

    pub fn with_identity_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.identity_attribute = attribute.into();
        self
    }
}
