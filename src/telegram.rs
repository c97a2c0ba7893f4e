//! Telegram Bot API: inbound update payload types and the outbound push.

use anyhow::{bail, Context as _, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

pub async fn send_telegram_message(
    client: &Client,
    config: &Config,
    chat_id: i64,
    text: &str,
) -> Result<()> {
    let Some(token) = config.telegram_token.as_deref() else {
        bail!("TELEGRAM_TOKEN is not set; cannot deliver reply");
    };
    let url = format!(
        "{}/bot{token}/sendMessage",
        config.telegram_api_url.trim_end_matches('/')
    );
    let response = client
        .post(url)
        .json(&json!({ "chat_id": chat_id, "text": text }))
        .send()
        .await
        .context("send telegram message")?;
    let status = response.status();
    let body = response
        .text()
        .await
        .context("read telegram send response")?;
    if !status.is_success() {
        bail!("telegram sendMessage error: {} {}", status, body);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_payload_parses_chat_and_text() {
        let raw = r#"{
            "update_id": 10000,
            "message": {
                "message_id": 1365,
                "chat": {"id": 1111111, "type": "private"},
                "date": 1441645532,
                "text": "what is the evidence for X?"
            }
        }"#;
        let update: TelegramUpdate = serde_json::from_str(raw).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 1111111);
        assert_eq!(message.text.as_deref(), Some("what is the evidence for X?"));
    }

    #[test]
    fn non_message_updates_parse_with_no_message() {
        let raw = r#"{"update_id": 10001, "edited_message": {"message_id": 2}}"#;
        let update: TelegramUpdate = serde_json::from_str(raw).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn message_without_text_parses() {
        let raw = r#"{"update_id": 10002, "message": {"message_id": 3, "chat": {"id": 7}}}"#;
        let update: TelegramUpdate = serde_json::from_str(raw).unwrap();
        assert!(update.message.unwrap().text.is_none());
    }
}
