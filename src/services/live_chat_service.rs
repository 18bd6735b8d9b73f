//! Live chat bot service.
//!
//! One method per `/live-chat/*` endpoint. Each call builds its path or
//! body, goes through the [`Transport`] exactly once and unwraps the
//! `{success, data}` envelope. Transport errors are returned unchanged.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::{
    Account, AttachmentPayload, Bot, Chat, Contact, ContactsByVariableParams, Envelope, Flow,
    JsonMap, Message, MessageOrder, MessagePart, SendCampaignParams, Trigger, Variable,
};
use crate::transport::{decode, encode, ApiError, Method, Result, Transport};

const DEFAULT_MESSAGES_SIZE: u32 = 20;
const DEFAULT_MESSAGES_SKIP: u32 = 0;

#[derive(Serialize)]
struct ContactBody<'a> {
    contact_id: &'a str,
}

#[derive(Serialize)]
struct SendMessagesBody<'a> {
    contact_id: &'a str,
    messages: &'a [MessagePart],
}

#[derive(Serialize)]
struct SetVariableBody<'a> {
    contact_id: &'a str,
    variable_id: &'a str,
    variable_name: &'a str,
    variable_value: &'a Value,
}

#[derive(Serialize)]
struct SetTagsBody<'a> {
    contact_id: &'a str,
    tags: &'a [String],
}

#[derive(Serialize)]
struct DeleteTagBody<'a> {
    contact_id: &'a str,
    tag: &'a str,
}

#[derive(Serialize)]
struct PauseAutomationBody<'a> {
    contact_id: &'a str,
    minutes: u32,
}

#[derive(Serialize)]
struct RunFlowBody<'a> {
    contact_id: &'a str,
    flow_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_data: Option<&'a JsonMap>,
}

#[derive(Serialize)]
struct RunFlowByTriggerBody<'a> {
    contact_id: &'a str,
    trigger_keyword: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_data: Option<&'a JsonMap>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct PauseAutomation {
    minutes: i64,
}

/// Client for the live chat bot endpoints.
#[derive(Clone)]
pub struct LiveChatService {
    transport: Arc<dyn Transport>,
}

impl LiveChatService {
    /// Creates a live chat service over a shared transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// GETs an enveloped payload.
    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let value = self.transport.request(Method::GET, path, None, true).await?;
        let envelope: Envelope<T> = decode(value)?;
        Ok(envelope.into_data(path))
    }

    /// GETs an enveloped list; absent data is an empty list.
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        Ok(self.get_data::<Vec<T>>(path).await?.unwrap_or_default())
    }

    /// POSTs a body whose response carries only the `success` flag.
    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let value = self
            .transport
            .request(Method::POST, path, Some(encode(body)?), true)
            .await?;
        if !value.is_null() {
            let envelope: Envelope<Value> = decode(value)?;
            envelope.into_data(path);
        }
        Ok(())
    }

    /// Returns the account's plan limits and usage.
    pub async fn get_account(&self) -> Result<Option<Account>> {
        self.get_data("/live-chat/account").await
    }

    /// Lists the connected bots.
    pub async fn get_bots(&self) -> Result<Vec<Bot>> {
        self.get_list("/live-chat/bots").await
    }

    /// Fetches a single contact.
    ///
    /// Returns [`ApiError::NotFound`] when the API answers without contact data.
    pub async fn get_contact(&self, contact_id: &str) -> Result<Contact> {
        let path = format!("/live-chat/contacts/get?id={}", contact_id);
        self.get_data(&path)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("contact {}", contact_id)))
    }

    /// Lists a bot's contacts carrying `tag`.
    pub async fn get_contacts_by_tag(&self, tag: &str, bot_id: &str) -> Result<Vec<Contact>> {
        let path = format!("/live-chat/contacts/getByTag?tag={}&bot_id={}", tag, bot_id);
        self.get_list(&path).await
    }

    /// Lists contacts whose variable matches the filter.
    pub async fn get_contacts_by_variable(
        &self,
        params: &ContactsByVariableParams,
    ) -> Result<Vec<Contact>> {
        let path = format!("/live-chat/contacts/getByVariable?{}", params.query_string());
        self.get_list(&path).await
    }

    /// Sends an ordered mix of message parts to a contact.
    pub async fn send_by_contact(&self, contact_id: &str, messages: &[MessagePart]) -> Result<()> {
        let body = SendMessagesBody {
            contact_id,
            messages,
        };
        self.post("/live-chat/contacts/send", &body).await
    }

    /// Sends text messages to a contact, one part per entry.
    pub async fn send_text_by_contact(&self, contact_id: &str, texts: &[String]) -> Result<()> {
        let messages: Vec<MessagePart> = texts.iter().map(MessagePart::text).collect();
        self.send_by_contact(contact_id, &messages).await
    }

    /// Sends images to a contact, one part per attachment.
    pub async fn send_image_by_contact(
        &self,
        contact_id: &str,
        images: &[AttachmentPayload],
    ) -> Result<()> {
        let messages: Vec<MessagePart> = images.iter().cloned().map(MessagePart::image).collect();
        self.send_by_contact(contact_id, &messages).await
    }

    /// Sets a contact variable, addressed by id or name.
    pub async fn set_variable_to_contact(
        &self,
        contact_id: &str,
        variable_id: &str,
        variable_name: &str,
        variable_value: &Value,
    ) -> Result<()> {
        let body = SetVariableBody {
            contact_id,
            variable_id,
            variable_name,
            variable_value,
        };
        self.post("/live-chat/contacts/setVariable", &body).await
    }

    /// Adds tags to a contact.
    pub async fn set_tags_to_contact(&self, contact_id: &str, tags: &[String]) -> Result<()> {
        let body = SetTagsBody { contact_id, tags };
        self.post("/live-chat/contacts/setTag", &body).await
    }

    /// Removes a tag from a contact.
    pub async fn delete_tag_from_contact(&self, contact_id: &str, tag: &str) -> Result<()> {
        let body = DeleteTagBody { contact_id, tag };
        self.post("/live-chat/contacts/deleteTag", &body).await
    }

    /// Stops the bot from messaging a contact.
    pub async fn disable_contact(&self, contact_id: &str) -> Result<()> {
        self.post("/live-chat/contacts/disable", &ContactBody { contact_id })
            .await
    }

    /// Re-enables a disabled contact.
    pub async fn enable_contact(&self, contact_id: &str) -> Result<()> {
        self.post("/live-chat/contacts/enable", &ContactBody { contact_id })
            .await
    }

    /// Deletes a contact.
    pub async fn delete_contact(&self, contact_id: &str) -> Result<()> {
        self.post("/live-chat/contacts/delete", &ContactBody { contact_id })
            .await
    }

    /// Returns the remaining automation pause in minutes (0 when not paused).
    pub async fn get_pause_automation(&self, contact_id: &str) -> Result<i64> {
        let path = format!(
            "/live-chat/contacts/getPauseAutomation?contact_id={}",
            contact_id
        );
        let pause: Option<PauseAutomation> = self.get_data(&path).await?;
        Ok(pause.unwrap_or_default().minutes)
    }

    /// Pauses automation for a contact for `minutes`.
    pub async fn set_pause_automation(&self, contact_id: &str, minutes: u32) -> Result<()> {
        let body = PauseAutomationBody {
            contact_id,
            minutes,
        };
        self.post("/live-chat/contacts/setPauseAutomation", &body)
            .await
    }

    /// Resumes automation for a contact.
    pub async fn delete_pause_automation(&self, contact_id: &str) -> Result<()> {
        self.post(
            "/live-chat/contacts/deletePauseAutomation",
            &ContactBody { contact_id },
        )
        .await
    }

    /// Lists a bot's variables.
    pub async fn get_bot_variables(&self, bot_id: &str) -> Result<Vec<Variable>> {
        self.get_list(&format!("/live-chat/variables?bot_id={}", bot_id))
            .await
    }

    /// Lists a bot's flows.
    pub async fn get_flows(&self, bot_id: &str) -> Result<Vec<Flow>> {
        self.get_list(&format!("/live-chat/flows?bot_id={}", bot_id))
            .await
    }

    /// Starts a flow for a contact. `external_data` is omitted from the body when `None`.
    pub async fn run_flow(
        &self,
        contact_id: &str,
        flow_id: &str,
        external_data: Option<&JsonMap>,
    ) -> Result<()> {
        let body = RunFlowBody {
            contact_id,
            flow_id,
            external_data,
        };
        self.post("/live-chat/flows/run", &body).await
    }

    /// Starts the flow bound to a trigger keyword.
    pub async fn run_flow_by_trigger(
        &self,
        contact_id: &str,
        trigger_keyword: &str,
        external_data: Option<&JsonMap>,
    ) -> Result<()> {
        let body = RunFlowByTriggerBody {
            contact_id,
            trigger_keyword,
            external_data,
        };
        self.post("/live-chat/flows/runByTrigger", &body).await
    }

    /// Lists a bot's triggers.
    pub async fn get_bot_triggers(&self, bot_id: &str) -> Result<Vec<Trigger>> {
        self.get_list(&format!("/live-chat/triggers?bot_id={}", bot_id))
            .await
    }

    /// Lists a bot's chats with their last message.
    pub async fn get_bot_chats(&self, bot_id: &str) -> Result<Vec<Chat>> {
        self.get_list(&format!("/live-chat/chats?bot_id={}", bot_id))
            .await
    }

    /// Message history for a contact.
    ///
    /// Defaults: `size` 20, `skip` 0, `order` [`MessageOrder::Desc`].
    pub async fn get_contact_messages(
        &self,
        contact_id: &str,
        size: Option<u32>,
        skip: Option<u32>,
        order: Option<MessageOrder>,
    ) -> Result<Vec<Message>> {
        let path = format!(
            "/live-chat/chats/messages?contact_id={}&size={}&skip={}&order={}",
            contact_id,
            size.unwrap_or(DEFAULT_MESSAGES_SIZE),
            skip.unwrap_or(DEFAULT_MESSAGES_SKIP),
            order.unwrap_or_default()
        );
        self.get_list(&path).await
    }

    /// Schedules a broadcast campaign.
    pub async fn send_campaign(&self, params: &SendCampaignParams) -> Result<()> {
        self.post("/live-chat/campaigns/send", params).await
    }
}
