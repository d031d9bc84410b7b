//! Wire protocol: tagged JSON messages
//!
//! Every message on the stream is one JSON object with exactly one
//! top-level tag key, e.g. `{"DrawRectCommand":{...}}` - which is exactly
//! serde's external enum representation, so the enum below *is* the wire
//! format. Inbound JSON whose tag this client does not recognize decodes to
//! [`Message::Unknown`] instead of failing: the server may speak message
//! kinds newer than this client, and those still resolve a pending request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::buffer::PixelBuffer;
use crate::geom::{Color, Size, WireRect};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    // outbound: handshake, windows, drawing
    AppConnect(AppConnect),
    OpenWindowCommand(OpenWindowCommand),
    WindowCloseRequest(WindowCloseRequest),
    DrawRectCommand(DrawRectCommand),
    DrawImageCommand(DrawImageCommand),

    // outbound: database
    DBQueryRequest(DbQueryRequest),
    DBAddRequest(DbObjectRequest),
    DBUpdateRequest(DbObjectRequest),
    DBDeleteRequest(DbObjectRequest),

    // inbound: replies
    AppConnectResponse(AppConnectResponse),
    OpenWindowResponse(OpenWindowResponse),
    CloseWindowResponse(CloseWindowResponse),
    DBQueryResponse(DbQueryResponse),
    DBAddResponse(DbObjectResponse),
    DBUpdateResponse(DbObjectResponse),
    DBDeleteResponse(DbObjectResponse),

    // inbound: window-scoped push events
    MouseDown(MouseEvent),
    MouseUp(MouseEvent),
    MouseMove(MouseEvent),
    KeyDown(KeyDownEvent),
    WindowResized(WindowResized),

    // catch-all: must stay last so tagged variants are tried first
    #[serde(untagged)]
    Unknown(Value),
}

impl Message {
    /// Shorthand for the connect handshake message.
    pub fn app_connect() -> Self {
        Message::AppConnect(AppConnect::default())
    }

    /// Id of the window a push event is scoped to. `None` for everything
    /// that is not a window-scoped event.
    pub fn window_id(&self) -> Option<&str> {
        match self {
            Message::MouseDown(e) => Some(&e.window_id),
            Message::MouseUp(e) => Some(&e.window_id),
            Message::MouseMove(e) => Some(&e.window_id),
            Message::KeyDown(e) => Some(&e.window_id),
            Message::WindowResized(e) => Some(&e.window_id),
            _ => None,
        }
    }
}

/// The hello payload nests its own tag per the wire format:
/// `{"AppConnect":{"HelloApp":{}}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConnect {
    #[serde(rename = "HelloApp")]
    pub hello: HelloApp,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HelloApp {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConnectResponse {
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenWindowCommand {
    pub window_type: String,
    pub window_title: String,
    pub bounds: WireRect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenWindowResponse {
    pub app_id: String,
    pub window_id: String,
    pub window_type: String,
    pub bounds: WireRect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowCloseRequest {
    pub app_id: String,
    pub window_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CloseWindowResponse {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRectCommand {
    pub app_id: String,
    pub window_id: String,
    pub rect: WireRect,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawImageCommand {
    pub app_id: String,
    pub window_id: String,
    pub rect: WireRect,
    pub buffer: PixelBuffer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    pub window_id: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDownEvent {
    pub window_id: String,
    pub key: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResized {
    pub window_id: String,
    pub size: Size,
}

/// A stored database object. `data` stays schemaless - the database is a
/// document store and each app defines its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbObj {
    pub id: String,
    pub deleted: bool,
    pub data: Value,
}

impl DbObj {
    pub fn new(data: Value) -> Self {
        Self {
            id: String::new(),
            deleted: false,
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbClauseKind {
    Equals,
    EqualsI,
    Substring,
    SubstringI,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbClause {
    pub kind: DbClauseKind,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbQueryRequest {
    pub app_id: String,
    pub query: Vec<DbClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbQueryResponse {
    pub app_id: String,
    pub success: bool,
    pub results: Vec<DbObj>,
}

/// Shared request shape for add/update/delete - all three carry one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbObjectRequest {
    pub app_id: String,
    pub object: DbObj,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbObjectResponse {
    pub app_id: String,
    pub success: bool,
    pub object: DbObj,
}
