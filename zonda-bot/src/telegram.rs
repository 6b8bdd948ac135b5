//! Minimal Telegram Bot API channel: long polling in, Markdown messages out.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, info, warn};
use zonda_core::{
    Action, Dispatcher, Reply,
    dispatch::MENU,
};

const API_BASE: &str = "https://api.telegram.org";
const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    from: Option<User>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    first_name: String,
}

#[derive(Debug)]
pub struct TelegramChannel {
    http: Client,
    base_url: String,
}

impl TelegramChannel {
    pub fn new(token: &str) -> Self {
        Self { http: Client::new(), base_url: format!("{API_BASE}/bot{token}") }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let res = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send Telegram `{method}` request"))?;

        let status = res.status();
        let parsed: ApiResponse<T> = res
            .json()
            .await
            .with_context(|| format!("Failed to parse Telegram `{method}` response ({status})"))?;

        if !parsed.ok {
            return Err(anyhow!(
                "Telegram `{method}` failed with status {status}: {}",
                parsed.description.unwrap_or_default()
            ));
        }

        parsed.result.ok_or_else(|| anyhow!("Telegram `{method}` returned no result"))
    }

    /// Polling and webhooks are mutually exclusive; clear any leftover webhook.
    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", json!({ "drop_pending_updates": true })).await?;
        Ok(())
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send(&self, chat_id: i64, reply: &Reply) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": reply.text,
            "parse_mode": "Markdown",
        });
        if reply.show_menu {
            body["reply_markup"] = menu_markup();
        }

        let _: serde_json::Value = self.call("sendMessage", body).await?;
        Ok(())
    }
}

fn menu_markup() -> serde_json::Value {
    let keyboard: Vec<Vec<serde_json::Value>> = MENU
        .iter()
        .map(|row| row.iter().map(|label| json!({ "text": label })).collect())
        .collect();

    json!({ "keyboard": keyboard, "resize_keyboard": true })
}

/// Answer incoming messages one at a time until the task is cancelled.
///
/// A failed poll or send is logged and skipped; it never ends the loop.
pub async fn run(channel: &TelegramChannel, dispatcher: &Dispatcher) -> Result<()> {
    channel.delete_webhook().await.context("Failed to clear Telegram webhook")?;
    info!("Polling Telegram for updates");

    let mut offset = 0;
    loop {
        let updates = match channel.get_updates(offset).await {
            Ok(updates) => updates,
            Err(err) => {
                warn!(error = %err, "Polling failed, retrying shortly");
                tokio::time::sleep(POLL_ERROR_PAUSE).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else { continue };
            let Some(text) = message.text.as_deref() else {
                debug!(update_id = update.update_id, "Ignoring non-text message");
                continue;
            };

            let action = Action::parse(text);
            let name = message.from.as_ref().map(|u| u.first_name.as_str());
            let reply = dispatcher.handle(&action, name).await;

            if let Err(err) = channel.send(message.chat.id, &reply).await {
                warn!(error = %err, chat_id = message.chat.id, "Failed to deliver reply");
            }
        }
    }
}
