//! Live chat bot records and request parameters.
//!
//! These mirror the JSON returned by the `/live-chat/*` endpoints. Identity
//! fields are opaque strings assigned by SendPulse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::null_default;

/// Open-ended JSON object (contact variables, message data, flow input).
pub type JsonMap = Map<String, Value>;

/// Live chat account: plan limits and usage counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub tariff: Tariff,
    pub statistics: Statistics,
}

/// Plan limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tariff {
    #[serde(deserialize_with = "null_default")]
    pub code: String,
    pub max_bots: i64,
    pub max_contacts: i64,
    pub max_messages: i64,
    pub max_tags: i64,
    pub max_variables: i64,
    pub branding: bool,
    pub is_exceeded: bool,
    pub is_expired: bool,
    pub expired_at: Option<DateTime<Utc>>,
}

/// Usage counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub messages: i64,
    pub bots: i64,
    pub contacts: i64,
    pub variables: i64,
}

/// A connected live chat bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bot {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    pub channel_data: BotChannelData,
    #[serde(alias = "ig_user")]
    pub live_chat_user: LiveChatUser,
    pub inbox: Inbox,
    pub status: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Channel profile of a bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotChannelData {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub name_format: String,
    #[serde(deserialize_with = "null_default")]
    pub short_name: String,
    pub picture: Picture,
}

/// Profile picture of a bot channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Picture {
    pub data: PictureData,
}

/// Picture dimensions and URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PictureData {
    pub height: i32,
    pub is_silhouette: bool,
    #[serde(deserialize_with = "null_default")]
    pub url: String,
    pub width: i32,
}

/// Platform user behind a bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveChatUser {
    pub id: i64,
    pub lc_id: i64,
    #[serde(deserialize_with = "null_default")]
    pub profile_picture_url: String,
    #[serde(deserialize_with = "null_default")]
    pub username: String,
    #[serde(deserialize_with = "null_default")]
    pub website: String,
}

/// Inbox counters of a bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inbox {
    pub total: i64,
    pub unread: i64,
}

/// A bot subscriber.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub bot_id: String,
    pub status: i32,
    pub channel_data: ContactChannelData,
    #[serde(deserialize_with = "null_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub variables: JsonMap,
    pub is_chat_opened: bool,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub automation_paused_until: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Channel profile of a contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactChannelData {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub user_name: String,
    #[serde(deserialize_with = "null_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub profile_pic: String,
}

/// A message in a contact's history.
///
/// `direction` and `status` are the small integer codes used by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub contact_id: String,
    #[serde(deserialize_with = "null_default")]
    pub bot_id: String,
    #[serde(deserialize_with = "null_default")]
    pub campaign_id: String,
    #[serde(deserialize_with = "null_default")]
    pub data: JsonMap,
    pub direction: i32,
    pub status: i32,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "type", deserialize_with = "null_default")]
    pub kind: String,
}

/// Chat summary for a contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chat {
    pub contact: Option<Contact>,
    pub inbox_last_message: Option<Message>,
    pub inbox_unread: i64,
}

/// Bot variable definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variable {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub bot_id: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub value_type: i32,
    pub status: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Automation flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flow {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub bot_id: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    pub status: FlowStatus,
    #[serde(deserialize_with = "null_default")]
    pub triggers: Vec<FlowTrigger>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Status counters reported for a flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowStatus {
    #[serde(rename = "ACTIVE")]
    pub active: i32,
    #[serde(rename = "INACTIVE")]
    pub inactive: i32,
    #[serde(rename = "DRAFT")]
    pub draft: i32,
}

/// Trigger embedded in a [`Flow`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTrigger {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: i32,
}

/// Bot trigger definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub bot_id: String,
    #[serde(deserialize_with = "null_default")]
    pub flow_id: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// Outbound message part, serialized as `{"type": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MessagePart {
    #[serde(rename = "text")]
    Text(TextMessage),
    #[serde(rename = "image")]
    ImageAttachment(AttachmentMessage),
}

impl MessagePart {
    /// Plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextMessage { text: text.into() })
    }

    /// Image sent by URL.
    pub fn image(payload: AttachmentPayload) -> Self {
        Self::ImageAttachment(AttachmentMessage {
            attachment: Attachment {
                kind: "image".to_string(),
                payload,
            },
        })
    }
}

/// Body of a text part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    pub text: String,
}

/// Body of an attachment part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentMessage {
    pub attachment: Attachment,
}

/// Typed attachment; `kind` is `image` for image parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: AttachmentPayload,
}

/// Location of an attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPayload {
    pub is_external_attachment: bool,
    pub url: String,
}

impl AttachmentPayload {
    /// Attachment hosted outside SendPulse.
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            is_external_attachment: true,
            url: url.into(),
        }
    }
}

/// Filter for `getByVariable`. Only `variable_value` is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactsByVariableParams {
    pub variable_value: String,
    pub variable_id: Option<String>,
    pub variable_name: Option<String>,
    pub bot_id: Option<String>,
}

impl ContactsByVariableParams {
    /// Creates a filter matching `variable_value`.
    pub fn new(variable_value: impl Into<String>) -> Self {
        Self {
            variable_value: variable_value.into(),
            ..Self::default()
        }
    }

    /// Restricts the lookup to one variable by ID.
    pub fn variable_id(mut self, id: impl Into<String>) -> Self {
        self.variable_id = Some(id.into());
        self
    }

    /// Restricts the lookup to one variable by name.
    pub fn variable_name(mut self, name: impl Into<String>) -> Self {
        self.variable_name = Some(name.into());
        self
    }

    /// Restricts the lookup to one bot.
    pub fn bot_id(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = Some(bot_id.into());
        self
    }

    /// Form-encoded query with keys in sorted order; empty optionals are skipped.
    pub fn query_string(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        let optional = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        if let Some(bot_id) = optional(&self.bot_id) {
            query.append_pair("bot_id", &bot_id);
        }
        if let Some(variable_id) = optional(&self.variable_id) {
            query.append_pair("variable_id", &variable_id);
        }
        if let Some(variable_name) = optional(&self.variable_name) {
            query.append_pair("variable_name", &variable_name);
        }
        query.append_pair("variable_value", &self.variable_value);
        escape_unreserved(query.finish())
    }
}

/// Brings form encoding in line with the RFC 3986 unreserved set: `~` stays
/// literal and `*` is percent-encoded.
///
/// Every `%` in form-encoded output starts its own escape, so `%7E` can only
/// be an encoded `~`.
fn escape_unreserved(encoded: String) -> String {
    encoded.replace('*', "%2A").replace("%7E", "~")
}

/// Sort order for message history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl MessageOrder {
    /// Returns the query parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::fmt::Display for MessageOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduled broadcast to all contacts of a bot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendCampaignParams {
    pub title: String,
    pub bot_id: String,
    /// Serialized as RFC 3339.
    pub send_at: DateTime<Utc>,
    pub messages: Vec<MessagePart>,
}
