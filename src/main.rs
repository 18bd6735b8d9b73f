//! sendpulse - prints the live chat account and SMTP totals for the configured credentials
//!
//! Usage: `sendpulse [settings.json]`. Without an argument the platform
//! settings file is used; `SENDPULSE_*` environment variables override it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use sendpulse::{Client, Settings};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("sendpulse error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(Settings::default_path);

    let mut settings = match &path {
        Some(path) => Settings::load_or_default(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    settings.apply_env();

    tracing::info!(base_url = %settings.api.base_url, "Starting sendpulse");

    let client = Client::from_settings(&settings).context("building API client")?;

    match client.live_chat().get_account().await? {
        Some(account) => println!(
            "live chat: tariff {} ({} bots, {} contacts, {} messages)",
            account.tariff.code,
            account.statistics.bots,
            account.statistics.contacts,
            account.statistics.messages
        ),
        None => println!("live chat: no account data"),
    }

    let total = client.smtp().total().await?;
    let bounces = client.smtp().total_bounces().await?;
    println!("smtp: {} emails sent, {} bounced today", total, bounces);

    Ok(())
}
