//! Transfer records for the SendPulse API.
//!
//! All records are plain values decoded from (or encoded into) the API's JSON.
//! They carry no behavior beyond building query strings for their own
//! filter parameters.

mod live_chat;
mod smtp;
mod types;

pub use live_chat::{
    Account, Attachment, AttachmentMessage, AttachmentPayload, Bot, BotChannelData, Chat,
    Contact, ContactChannelData, ContactsByVariableParams, Flow, FlowStatus, FlowTrigger, Inbox,
    JsonMap, LiveChatUser, Message, MessageOrder, MessagePart, Picture, PictureData,
    SendCampaignParams, Statistics, Tariff, TextMessage, Trigger, Variable,
};
pub use smtp::{
    Bounce, BouncesList, ClientInfo, EmailAddress, EmailTemplate, LinkClick, SendEmailParams,
    SmtpListParams, SmtpMessage, Tracking, UnsubscribeEmail, Unsubscribed,
    UnsubscribedListParams,
};
pub use types::{api_datetime, format_date, Envelope};
