use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::CachedFetch;
use crate::channel::{events, has_error, Channel, ChannelError, ChannelResult};
use crate::path::FieldLocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    SingleLine,
    MultiLine,
    HtmlRte,
    JsonRte,
    MarkdownRte,
    Number,
    Boolean,
    Date,
    File,
    Link,
    Select,
    Reference,
    Group,
    ModularBlock,
    GlobalField,
    Taxonomy,
    Custom,
}

impl FieldType {
    /// Types edited directly in the page rather than in a host-side widget.
    pub const fn is_inline_editable(self) -> bool {
        matches!(
            self,
            Self::SingleLine | Self::MultiLine | Self::Number | Self::MarkdownRte
        )
    }

    pub const fn is_multiline(self) -> bool {
        matches!(self, Self::MultiLine | Self::MarkdownRte)
    }

    pub const fn cursor_label(self) -> &'static str {
        match self {
            Self::SingleLine => "Single Line Textbox",
            Self::MultiLine => "Multi Line Textbox",
            Self::HtmlRte => "Rich Text Editor",
            Self::JsonRte => "JSON Rich Text Editor",
            Self::MarkdownRte => "Markdown",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::File => "File",
            Self::Link => "Link",
            Self::Select => "Select",
            Self::Reference => "Reference",
            Self::Group => "Group",
            Self::ModularBlock => "Modular Blocks",
            Self::GlobalField => "Global",
            Self::Taxonomy => "Taxonomy",
            Self::Custom => "Custom Field",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadataFlags {
    #[serde(default)]
    pub multiline: bool,
    #[serde(default)]
    pub markdown: bool,
    #[serde(default)]
    pub allow_rich_text: bool,
    #[serde(default)]
    pub allow_json_rte: bool,
    #[serde(default)]
    pub update_restrict: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub display_name: String,
    pub data_type: String,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub field_metadata: FieldMetadataFlags,
}

impl FieldSchema {
    pub fn field_type(&self) -> FieldType {
        let flags = &self.field_metadata;
        match self.data_type.as_str() {
            "text" if flags.markdown => FieldType::MarkdownRte,
            "text" if flags.allow_rich_text => FieldType::HtmlRte,
            "text" if flags.multiline => FieldType::MultiLine,
            "text" => FieldType::SingleLine,
            "json" if flags.allow_json_rte => FieldType::JsonRte,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "isodate" => FieldType::Date,
            "file" => FieldType::File,
            "link" => FieldType::Link,
            "select" => FieldType::Select,
            "reference" => FieldType::Reference,
            "group" => FieldType::Group,
            "blocks" => FieldType::ModularBlock,
            "global_field" => FieldType::GlobalField,
            "taxonomy" => FieldType::Taxonomy,
            _ => FieldType::Custom,
        }
    }

    /// Fields whose value is a list of instances.
    pub fn is_multi_instance(&self) -> bool {
        self.multiple || self.field_type() == FieldType::ModularBlock
    }
}

pub type FieldSchemaMap = HashMap<String, FieldSchema>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldSchemaReply {
    #[serde(default)]
    field_schema_map: FieldSchemaMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPermissions {
    pub update: bool,
}

impl Default for FieldPermissions {
    fn default() -> Self {
        Self { update: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "allowed")]
    pub update_allowed: bool,
}

impl Default for WorkflowStage {
    fn default() -> Self {
        Self {
            name: None,
            update_allowed: true,
        }
    }
}

fn allowed() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDisabledReason {
    UpdateRestricted,
    NoPermission,
    WorkflowStage,
    AudienceMode,
}

impl FieldDisabledReason {
    pub const fn message(self) -> &'static str {
        match self {
            Self::UpdateRestricted => "This field is not editable as it is restricted",
            Self::NoPermission => "You do not have permission to edit this field",
            Self::WorkflowStage => "This entry's workflow stage does not allow editing",
            Self::AudienceMode => "Open an audience variant to edit this field",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldDisabledState {
    pub reason: Option<FieldDisabledReason>,
}

impl FieldDisabledState {
    pub fn evaluate(
        schema: &FieldSchema,
        locator: &FieldLocator,
        permissions: FieldPermissions,
        stage: &WorkflowStage,
        audience_mode: bool,
    ) -> Self {
        let reason = if schema.field_metadata.update_restrict {
            Some(FieldDisabledReason::UpdateRestricted)
        } else if !permissions.update {
            Some(FieldDisabledReason::NoPermission)
        } else if !stage.update_allowed {
            Some(FieldDisabledReason::WorkflowStage)
        } else if audience_mode && locator.variant.is_none() {
            Some(FieldDisabledReason::AudienceMode)
        } else {
            None
        };
        Self { reason }
    }

    pub fn is_disabled(&self) -> bool {
        self.reason.is_some()
    }
}

/// Entry-level key for the advisory lookups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryKey {
    content_type_uid: String,
    entry_uid: String,
    locale: String,
}

impl EntryKey {
    fn of(locator: &FieldLocator) -> Self {
        Self {
            content_type_uid: locator.content_type_uid.clone(),
            entry_uid: locator.entry_uid.clone(),
            locale: locator.locale.clone(),
        }
    }
}

/// Host-backed lookups for schema, field data, permissions and workflow
/// stage. Schema and advisory results are cached per session.
#[derive(Clone)]
pub struct SchemaStore {
    channel: Option<Rc<Channel>>,
    schemas: CachedFetch<String, Rc<FieldSchemaMap>, ChannelError>,
    permissions: CachedFetch<EntryKey, FieldPermissions, ChannelError>,
    workflow: CachedFetch<EntryKey, WorkflowStage, ChannelError>,
}

impl SchemaStore {
    pub fn new(channel: Option<Rc<Channel>>) -> Self {
        let schema_channel = channel.clone();
        let permission_channel = channel.clone();
        let workflow_channel = channel.clone();
        Self {
            schemas: CachedFetch::new(move |content_type_uid: String| {
                let request = host_request::<FieldSchemaReply>(
                    schema_channel.as_ref(),
                    events::GET_FIELD_SCHEMA,
                    json!({ "contentTypeUid": content_type_uid }),
                );
                async move {
                    let reply = request.await?;
                    Ok::<_, ChannelError>(Rc::new(reply.field_schema_map))
                }
            }),
            permissions: CachedFetch::new(move |key: EntryKey| {
                host_request::<FieldPermissions>(
                    permission_channel.as_ref(),
                    events::GET_PERMISSIONS,
                    json!(key),
                )
            }),
            workflow: CachedFetch::new(move |key: EntryKey| {
                host_request::<WorkflowStage>(
                    workflow_channel.as_ref(),
                    events::GET_WORKFLOW_STAGE,
                    json!(key),
                )
            }),
            channel,
        }
    }

    pub async fn schema_map(&self, content_type_uid: &str) -> ChannelResult<Rc<FieldSchemaMap>> {
        self.schemas.call(content_type_uid.to_string()).await
    }

    /// `None` means "field unknown": no reachable host, a failed fetch, or a
    /// path the content type does not define.
    pub async fn field_schema(&self, locator: &FieldLocator) -> Option<FieldSchema> {
        match self.schema_map(&locator.content_type_uid).await {
            Ok(map) => map.get(&locator.field_path).cloned(),
            Err(err) => {
                tracing::debug!(content_type = %locator.content_type_uid, %err, "field schema unavailable");
                None
            }
        }
    }

    pub async fn permissions(&self, locator: &FieldLocator) -> FieldPermissions {
        self.permissions
            .call(EntryKey::of(locator))
            .await
            .unwrap_or_else(|err| {
                tracing::debug!(entry = %locator.entry_uid, %err, "permission lookup failed; allowing edit");
                FieldPermissions::default()
            })
    }

    pub async fn workflow_stage(&self, locator: &FieldLocator) -> WorkflowStage {
        self.workflow
            .call(EntryKey::of(locator))
            .await
            .unwrap_or_else(|err| {
                tracing::debug!(entry = %locator.entry_uid, %err, "workflow stage lookup failed; allowing edit");
                WorkflowStage::default()
            })
    }

    pub async fn disabled_state(
        &self,
        schema: &FieldSchema,
        locator: &FieldLocator,
        audience_mode: bool,
    ) -> FieldDisabledState {
        let permissions = self.permissions(locator).await;
        let stage = self.workflow_stage(locator).await;
        FieldDisabledState::evaluate(schema, locator, permissions, &stage, audience_mode)
    }

    /// Current stored value of the field; never cached since edits change it.
    pub async fn field_data(&self, locator: &FieldLocator) -> Option<Value> {
        let channel = self.channel.as_ref()?;
        let reply = channel
            .send(
                events::GET_FIELD_DATA,
                json!({
                    "fieldMetadata": locator,
                    "entryPath": locator.field_path_with_index,
                }),
            )
            .await;
        match reply {
            Ok(reply) if has_error(&reply) => {
                tracing::debug!(path = %locator.cslp_value, "host reported field data error");
                None
            }
            Ok(mut reply) => reply.get_mut("fieldData").map(Value::take),
            Err(err) => {
                tracing::debug!(path = %locator.cslp_value, %err, "field data unavailable");
                None
            }
        }
    }

    pub fn clear(&self) {
        self.schemas.clear_cache();
        self.permissions.clear_cache();
        self.workflow.clear_cache();
    }
}

fn host_request<T>(
    channel: Option<&Rc<Channel>>,
    event_type: &'static str,
    payload: Value,
) -> futures::future::LocalBoxFuture<'static, ChannelResult<T>>
where
    T: serde::de::DeserializeOwned + 'static,
{
    use futures::FutureExt;

    match channel {
        Some(channel) => channel.send_as::<T>(event_type, payload),
        None => futures::future::ready(Err(ChannelError::NoTarget {
            channel_id: String::new(),
        }))
        .boxed_local(),
    }
}
