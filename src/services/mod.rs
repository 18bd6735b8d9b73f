//! API service facades.
//!
//! Each service maps its methods one-to-one onto REST endpoints and depends
//! only on the shared [`Transport`](crate::transport::Transport):
//!
//! ```text
//!   LiveChatService   SmtpService
//!          \             /
//!           v           v
//!        Arc<dyn Transport>
//! ```
//!
//! - [`LiveChatService`]: bots, contacts, flows, message history, campaigns
//! - [`SmtpService`]: transactional email, bounces, unsubscribes, sender domains

mod live_chat_service;
mod smtp_service;

pub use live_chat_service::LiveChatService;
pub use smtp_service::SmtpService;
