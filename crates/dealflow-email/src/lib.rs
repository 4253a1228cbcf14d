// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email channel sender for dealflow.
//!
//! Sends HTML mail over SMTP via lettre. Two transports are supported:
//! `localhost` (unencrypted port 25, for a local MTA) and `relay`
//! (STARTTLS with credentials).

use async_trait::async_trait;
use dealflow_config::model::EmailConfig;
use dealflow_core::traits::ChannelSender;
use dealflow_core::types::{Channel, Payload, SendOutcome};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

/// Email sender backed by an SMTP transport.
///
/// Construction never fails; a broken transport configuration is held as
/// an error string and reported as a misconfigured outcome at send time.
pub struct EmailSender {
    transport: Result<AsyncSmtpTransport<Tokio1Executor>, String>,
    from: Result<Mailbox, String>,
}

impl EmailSender {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            transport: build_transport(config),
            from: config
                .from_address
                .parse::<Mailbox>()
                .map_err(|e| format!("email.from_address is invalid: {e}")),
        }
    }
}

fn build_transport(config: &EmailConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, String> {
    match config.transport.as_str() {
        "localhost" => Ok(AsyncSmtpTransport::<Tokio1Executor>::unencrypted_localhost()),
        "relay" => {
            let host = config
                .smtp_host
                .as_deref()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| "email.smtp_host is required for the relay transport".to_string())?;
            let username = config
                .username
                .clone()
                .ok_or_else(|| "email.username is required for the relay transport".to_string())?;
            let password = config
                .password
                .clone()
                .ok_or_else(|| "email.password is required for the relay transport".to_string())?;
            let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| format!("email relay setup failed: {e}"))?;
            Ok(builder
                .port(config.smtp_port)
                .credentials(Credentials::new(username, password))
                .build())
        }
        other => Err(format!("unknown email transport `{other}`")),
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, recipient: &str, payload: &Payload) -> SendOutcome {
        let transport = match &self.transport {
            Ok(transport) => transport,
            Err(detail) => return SendOutcome::misconfigured(detail),
        };
        let from = match &self.from {
            Ok(from) => from.clone(),
            Err(detail) => return SendOutcome::misconfigured(detail),
        };

        let to = match recipient.parse::<Mailbox>() {
            Ok(to) => to,
            Err(e) => return SendOutcome::failed(format!("invalid recipient address: {e}")),
        };

        let (subject, html_body) = match payload {
            Payload::Email { subject, html_body } => (subject.clone(), html_body.clone()),
            Payload::Text { body } => ("Notification".to_string(), body.clone()),
            other => {
                return SendOutcome::failed(format!(
                    "unsupported payload type for email channel: {other:?}"
                ));
            }
        };

        let message = match Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
        {
            Ok(message) => message,
            Err(e) => return SendOutcome::failed(format!("message build failed: {e}")),
        };

        match transport.send(message).await {
            Ok(response) => {
                debug!(recipient, code = %response.code(), "email accepted by smtp server");
                SendOutcome {
                    success: true,
                    message_id: None,
                    error: None,
                }
            }
            Err(e) => {
                warn!(recipient, error = %e, "smtp delivery failed");
                SendOutcome::failed(format!("smtp delivery failed: {e}"))
            }
        }
    }
}
