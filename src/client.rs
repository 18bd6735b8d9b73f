//! Top-level API client.

use std::sync::Arc;

use crate::config::Settings;
use crate::services::{LiveChatService, SmtpService};
use crate::transport::{HttpTransport, Result, Transport};

/// SendPulse API client.
///
/// Both services share one transport, so a single access token is used for
/// every call made through this client.
///
/// # Example
///
/// ```ignore
/// use sendpulse::{Client, Settings};
///
/// let mut settings = Settings::default();
/// settings.apply_env();
/// let client = Client::from_settings(&settings)?;
///
/// let bots = client.live_chat().get_bots().await?;
/// let sent = client.smtp().total().await?;
/// ```
#[derive(Clone)]
pub struct Client {
    live_chat: LiveChatService,
    smtp: SmtpService,
}

impl Client {
    /// Creates a client over any transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            live_chat: LiveChatService::new(Arc::clone(&transport)),
            smtp: SmtpService::new(transport),
        }
    }

    /// Creates a client using [`HttpTransport`] configured from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let transport = HttpTransport::from_settings(settings)?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Live chat bot endpoints.
    pub fn live_chat(&self) -> &LiveChatService {
        &self.live_chat
    }

    /// Transactional email endpoints.
    pub fn smtp(&self) -> &SmtpService {
        &self.smtp
    }
}
