//! sendpulse - typed async client for the SendPulse REST API
//!
//! This crate covers the live chat bot endpoints and transactional SMTP
//! email sending. Requests go through a shared [`Transport`], which handles
//! OAuth tokens; the services only build paths and bodies and decode the
//! responses into typed records.

pub mod client;
pub mod config;
pub mod domain;
pub mod services;
pub mod transport;

pub use client::Client;
pub use config::Settings;
pub use transport::{ApiError, HttpTransport, Result, Transport};
