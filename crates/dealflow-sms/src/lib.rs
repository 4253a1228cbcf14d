// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS channel sender for dealflow.
//!
//! Sends pattern (template) messages and plain text through an
//! IPPanel-compatible HTTP gateway. Provider rejections are mapped to
//! stable error strings so the notification log stays greppable.

use async_trait::async_trait;
use dealflow_config::model::SmsConfig;
use dealflow_core::traits::ChannelSender;
use dealflow_core::types::{Channel, Payload, SendOutcome};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

/// SMS sender backed by an IPPanel-compatible pattern API.
///
/// Construction never fails; missing credentials surface as a
/// misconfigured [`SendOutcome`] at send time so the dispatcher can log
/// the attempt instead of skipping it silently.
pub struct SmsSender {
    config: SmsConfig,
    client: reqwest::Client,
}

impl SmsSender {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), SendOutcome> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => return Err(SendOutcome::misconfigured("sms.api_key is not set")),
        };
        let line_number = match self.config.line_number.as_deref() {
            Some(line) if !line.is_empty() => line,
            _ => return Err(SendOutcome::misconfigured("sms.line_number is not set")),
        };
        Ok((api_key, line_number))
    }

    async fn send_pattern(
        &self,
        recipient: &str,
        pattern: &str,
        params: &[String],
    ) -> SendOutcome {
        let (api_key, line_number) = match self.credentials() {
            Ok(creds) => creds,
            Err(outcome) => return outcome,
        };
        if pattern.is_empty() {
            return SendOutcome::failed("empty pattern code");
        }

        // Positional params map to p1..pN template variables.
        let variables: serde_json::Map<String, serde_json::Value> = params
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("p{}", i + 1), json!(v)))
            .collect();

        let url = format!(
            "{}/sms/pattern/normal/send",
            self.config.api_base.trim_end_matches('/')
        );
        let body = json!({
            "code": pattern,
            "sender": line_number,
            "recipient": recipient,
            "variable": variables,
        });

        self.post(api_key, &url, body).await
    }

    async fn send_text(&self, recipient: &str, text: &str) -> SendOutcome {
        let (api_key, line_number) = match self.credentials() {
            Ok(creds) => creds,
            Err(outcome) => return outcome,
        };

        let url = format!(
            "{}/sms/send/webservice/single",
            self.config.api_base.trim_end_matches('/')
        );
        let body = json!({
            "sender": line_number,
            "recipient": [recipient],
            "message": text,
        });

        self.post(api_key, &url, body).await
    }

    async fn post(&self, api_key: &str, url: &str, body: serde_json::Value) -> SendOutcome {
        let response = match self
            .client
            .post(url)
            .header("apikey", api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "sms gateway unreachable");
                return SendOutcome::failed(format!("sms gateway unreachable: {e}"));
            }
        };

        let status = response.status();
        let parsed = response.json::<ProviderResponse>().await.ok();

        if status.is_success() {
            let message_id = parsed
                .as_ref()
                .and_then(|p| p.data.as_ref())
                .and_then(|d| d.message_id)
                .map(|id| id.to_string());
            debug!(message_id = ?message_id, "sms accepted by gateway");
            return match message_id {
                Some(id) => SendOutcome::sent(id),
                None => SendOutcome {
                    success: true,
                    message_id: None,
                    error: None,
                },
            };
        }

        let detail = parsed
            .as_ref()
            .and_then(|p| p.error_message.as_deref())
            .unwrap_or("");
        SendOutcome::failed(classify_rejection(status.as_u16(), detail))
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(&self, recipient: &str, payload: &Payload) -> SendOutcome {
        if recipient.trim().is_empty() {
            return SendOutcome::failed("empty recipient");
        }
        match payload {
            Payload::Pattern { pattern, params } => {
                self.send_pattern(recipient, pattern, params).await
            }
            Payload::Text { body } => self.send_text(recipient, body).await,
            other => SendOutcome::failed(format!(
                "unsupported payload type `{}` for sms channel",
                payload_kind(other)
            )),
        }
    }
}

/// Maps gateway rejections to stable, human-readable error strings.
fn classify_rejection(status: u16, detail: &str) -> String {
    let class = match status {
        401 | 403 => "invalid credentials",
        402 => "insufficient credit",
        404 => "invalid pattern code",
        422 => "invalid recipient number",
        429 => "rate limited",
        _ => "gateway rejection",
    };
    if detail.is_empty() {
        format!("{class} (http {status})")
    } else {
        format!("{class} (http {status}): {detail}")
    }
}

fn payload_kind(payload: &Payload) -> &'static str {
    match payload {
        Payload::Text { .. } => "text",
        Payload::Pattern { .. } => "pattern",
        Payload::Email { .. } => "email",
        Payload::InApp { .. } => "in_app",
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    data: Option<ProviderData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProviderData {
    #[serde(default)]
    message_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: String) -> SmsConfig {
        SmsConfig {
            api_key: Some("test-key".into()),
            line_number: Some("3000505".into()),
            api_base,
        }
    }

    #[tokio::test]
    async fn pattern_send_reports_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sms/pattern/normal/send"))
            .and(header("apikey", "test-key"))
            .and(body_partial_json(json!({
                "code": "inquiry-approved",
                "sender": "3000505",
                "recipient": "09121234567",
                "variable": {"p1": "Sara", "p2": "Atlas GX"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "data": {"message_id": 5511}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = SmsSender::new(config(server.uri()));
        let outcome = sender
            .send(
                "09121234567",
                &Payload::pattern("inquiry-approved", vec!["Sara".into(), "Atlas GX".into()]),
            )
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.message_id.as_deref(), Some("5511"));
    }

    #[tokio::test]
    async fn text_send_uses_webservice_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sms/send/webservice/single"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "data": {"message_id": 12}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = SmsSender::new(config(server.uri()));
        let outcome = sender
            .send("09121234567", &Payload::text("hello"))
            .await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn missing_api_key_is_misconfigured() {
        let sender = SmsSender::new(SmsConfig {
            api_key: None,
            line_number: Some("3000505".into()),
            api_base: "http://unused.invalid".into(),
        });
        let outcome = sender
            .send("09121234567", &Payload::text("hello"))
            .await;
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
    async fn provider_rejections_are_classified() {
        for (status, expected) in [
            (401u16, "invalid credentials"),
            (402, "insufficient credit"),
            (404, "invalid pattern code"),
            (422, "invalid recipient number"),
            (429, "rate limited"),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                    "status": "error",
                    "error_message": "rejected"
                })))
                .mount(&server)
                .await;

            let sender = SmsSender::new(config(server.uri()));
            let outcome = sender
                .send("09121234567", &Payload::pattern("p", vec![]))
                .await;

            assert!(!outcome.success);
            let error = outcome.error.unwrap();
            assert!(error.starts_with(expected), "{status}: {error}");
        }
    }

    #[tokio::test]
    async fn empty_recipient_fails_without_network() {
        let sender = SmsSender::new(config("http://unused.invalid".into()));
        let outcome = sender.send("  ", &Payload::text("hello")).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("empty recipient"));
    }

    #[tokio::test]
    async fn email_payload_is_rejected() {
        let sender = SmsSender::new(config("http://unused.invalid".into()));
        let outcome = sender
            .send(
                "09121234567",
                &Payload::Email {
                    subject: "s".into(),
                    html_body: "<p>b</p>".into(),
                },
            )
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("unsupported payload"));
    }
}
