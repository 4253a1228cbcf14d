// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel sender for dealflow.
//!
//! Delivers notifications via the Bot API `sendMessage` method over plain
//! HTTP. Recipients are chat ids; pattern payloads are flattened to text
//! since Telegram has no template concept.

use async_trait::async_trait;
use dealflow_config::model::TelegramConfig;
use dealflow_core::traits::ChannelSender;
use dealflow_core::types::{Channel, Payload, SendOutcome};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// Telegram sender backed by the Bot API.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramSender {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> SendOutcome {
        let token = match self.config.bot_token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => return SendOutcome::misconfigured("telegram.bot_token is not set"),
        };

        let url = format!(
            "{}/bot{token}/sendMessage",
            self.config.api_base.trim_end_matches('/')
        );
        let body = json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "telegram api unreachable");
                return SendOutcome::failed(format!("telegram api unreachable: {e}"));
            }
        };

        let status = response.status();
        match response.json::<TelegramApiResponse>().await {
            Ok(api) if api.ok => {
                let message_id = api
                    .result
                    .map(|r| r.message_id.to_string())
                    .unwrap_or_default();
                debug!(chat_id, message_id, "telegram message delivered");
                SendOutcome::sent(message_id)
            }
            Ok(api) => {
                let description = api
                    .description
                    .unwrap_or_else(|| format!("http {status}"));
                SendOutcome::failed(format!("telegram api error: {description}"))
            }
            Err(e) => SendOutcome::failed(format!(
                "telegram api returned malformed response (http {status}): {e}"
            )),
        }
    }
}

#[async_trait]
impl ChannelSender for TelegramSender {
    fn channel(&self) -> Channel {
        Channel::Telegram
    }

    async fn send(&self, recipient: &str, payload: &Payload) -> SendOutcome {
        if recipient.trim().is_empty() {
            return SendOutcome::failed("empty recipient");
        }
        let text = match payload {
            Payload::Text { body } => body.clone(),
            // Telegram has no server-side templates; render the pattern
            // params as readable lines.
            Payload::Pattern { pattern, params } => {
                let mut text = pattern.replace(['-', '_'], " ");
                for param in params {
                    text.push('\n');
                    text.push_str(param);
                }
                text
            }
            Payload::InApp { title, message, .. } => format!("{title}\n{message}"),
            Payload::Email { .. } => {
                return SendOutcome::failed(
                    "unsupported payload type `email` for telegram channel",
                );
            }
        };
        self.send_message(recipient, &text).await
    }
}

/// Bot API envelope: every method returns `ok` plus either `result` or
/// `description`.
#[derive(Debug, Deserialize)]
struct TelegramApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<TelegramMessage>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: String) -> TelegramConfig {
        TelegramConfig {
            bot_token: Some("123456:testtoken".into()),
            api_base,
        }
    }

    #[tokio::test]
    async fn send_message_hits_bot_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123456:testtoken/sendMessage"))
            .and(body_partial_json(json!({
                "chat_id": "987654",
                "text": "hello",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"message_id": 321}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = TelegramSender::new(config(server.uri()));
        let outcome = sender.send("987654", &Payload::text("hello")).await;

        assert!(outcome.success);
        assert_eq!(outcome.message_id.as_deref(), Some("321"));
    }

    #[tokio::test]
    async fn api_error_description_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let sender = TelegramSender::new(config(server.uri()));
        let outcome = sender.send("987654", &Payload::text("hello")).await;

        assert!(!outcome.success);
        assert!(
            outcome
                .error
                .unwrap()
                .contains("Bad Request: chat not found")
        );
    }

    #[tokio::test]
    async fn missing_token_is_misconfigured() {
        let sender = TelegramSender::new(TelegramConfig {
            bot_token: None,
            api_base: "http://unused.invalid".into(),
        });
        let outcome = sender.send("987654", &Payload::text("hello")).await;
        assert!(!outcome.success);
        assert!(
            outcome
                .error
                .as_deref()
                .unwrap()
                .starts_with("configuration error: ")
        );
    }

    #[tokio::test]
    async fn pattern_payload_is_rendered_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "text": "inquiry approved\nSara\nAtlas GX",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"message_id": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = TelegramSender::new(config(server.uri()));
        let outcome = sender
            .send(
                "987654",
                &Payload::pattern("inquiry-approved", vec!["Sara".into(), "Atlas GX".into()]),
            )
            .await;
        assert!(outcome.success);
    }
}
