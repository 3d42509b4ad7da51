//! Event type names understood by the host editor.

pub const INIT: &str = "init";
pub const FOCUS_FIELD: &str = "FOCUS_FIELD";
pub const UPDATE_FIELD: &str = "UPDATE_FIELD";
pub const GET_FIELD_DATA: &str = "GET_FIELD_DATA";
pub const GET_FIELD_SCHEMA: &str = "GET_FIELD_SCHEMA";
pub const GET_PERMISSIONS: &str = "GET_PERMISSIONS";
pub const GET_WORKFLOW_STAGE: &str = "GET_WORKFLOW_STAGE";
pub const MOUSE_CLICK: &str = "MOUSE_CLICK";
pub const ADD_INSTANCE: &str = "ADD_INSTANCE";
pub const COLLAB_CREATE_THREAD: &str = "COLLAB_CREATE_THREAD";
pub const URL_CHANGE: &str = "URL_CHANGE";

pub const HIDE_FOCUS_OVERLAY: &str = "HIDE_FOCUS_OVERLAY";
pub const REVALIDATE_FIELD_DATA: &str = "REVALIDATE_FIELD_DATA";
pub const SET_AUDIENCE_MODE: &str = "SET_AUDIENCE_MODE";
pub const TOGGLE_COLLAB: &str = "TOGGLE_COLLAB";
pub const SHOW_VARIANT_FIELDS: &str = "SHOW_VARIANT_FIELDS";
pub const REMOVE_VARIANT_FIELDS: &str = "REMOVE_VARIANT_FIELDS";
pub const GET_VARIANT_ID: &str = "GET_VARIANT_ID";
pub const GET_LOCALE: &str = "GET_LOCALE";
pub const HIGHLIGHT_ACTIVE_COMMENTS: &str = "HIGHLIGHT_ACTIVE_COMMENTS";
pub const REMOVE_HIGHLIGHTED_COMMENTS: &str = "REMOVE_HIGHLIGHTED_COMMENTS";

/// Everything the host may push into the page.
pub const INBOUND: &[&str] = &[
    HIDE_FOCUS_OVERLAY,
    REVALIDATE_FIELD_DATA,
    SET_AUDIENCE_MODE,
    TOGGLE_COLLAB,
    SHOW_VARIANT_FIELDS,
    REMOVE_VARIANT_FIELDS,
    GET_VARIANT_ID,
    GET_LOCALE,
    HIGHLIGHT_ACTIVE_COMMENTS,
    REMOVE_HIGHLIGHTED_COMMENTS,
];
