// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP email provider.
//!
//! Builds a lettre transport per send from the channel's config bag; alerts
//! are low-volume so a pooled connection buys nothing here.

use async_trait::async_trait;
use lettre::{
	message::{header::ContentType, Mailbox, MultiPart, SinglePart},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Deserialize;

use vigil_core::{Heartbeat, Monitor};

use crate::{Notifier, NotifyError, Result};

/// Per-channel options for the SMTP provider.
#[derive(Debug, Clone, Deserialize)]
struct SmtpChannelConfig {
	host: String,

	#[serde(default = "default_port")]
	port: u16,

	#[serde(default)]
	username: Option<String>,

	#[serde(default)]
	password: Option<String>,

	from_address: String,

	#[serde(default = "default_from_name")]
	from_name: String,

	to_address: String,

	/// STARTTLS; plain connection when disabled.
	#[serde(default = "default_use_tls")]
	use_tls: bool,
}

fn default_port() -> u16 {
	587
}

fn default_from_name() -> String {
	"Vigil".to_string()
}

fn default_use_tls() -> bool {
	true
}

/// Email alerts over SMTP.
pub struct SmtpNotifier;

impl SmtpNotifier {
	pub fn new() -> Self {
		Self
	}

	fn parse_config(config: &serde_json::Value) -> Result<SmtpChannelConfig> {
		let config: SmtpChannelConfig = serde_json::from_value(config.clone())
			.map_err(|e| NotifyError::InvalidConfig(e.to_string()))?;

		if config.host.is_empty() {
			return Err(NotifyError::InvalidConfig("host must not be empty".to_string()));
		}

		config
			.from_mailbox()
			.map_err(|e| NotifyError::InvalidConfig(format!("from address: {e}")))?;
		config
			.to_address
			.parse::<Mailbox>()
			.map_err(|e| NotifyError::InvalidConfig(format!("to address: {e}")))?;

		Ok(config)
	}
}

impl SmtpChannelConfig {
	fn from_mailbox(&self) -> std::result::Result<Mailbox, lettre::address::AddressError> {
		format!("{} <{}>", self.from_name, self.from_address).parse()
	}

	fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
		let builder = if self.use_tls {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
				.map_err(|e| NotifyError::Send(format!("smtp transport: {e}")))?
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
		};

		let mut builder = builder.port(self.port);

		if let (Some(username), Some(password)) = (&self.username, &self.password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
		}

		Ok(builder.build())
	}
}

impl Default for SmtpNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Notifier for SmtpNotifier {
	fn kind(&self) -> &'static str {
		"smtp"
	}

	fn validate(&self, config: &serde_json::Value) -> Result<()> {
		Self::parse_config(config).map(|_| ())
	}

	#[tracing::instrument(skip(self, config, message, heartbeat), fields(monitor = %monitor.name))]
	async fn send(
		&self,
		config: &serde_json::Value,
		message: &str,
		monitor: &Monitor,
		heartbeat: &Heartbeat,
	) -> Result<()> {
		let config = Self::parse_config(config)?;

		let from = config
			.from_mailbox()
			.map_err(|e| NotifyError::InvalidConfig(format!("from address: {e}")))?;
		let to: Mailbox = config
			.to_address
			.parse()
			.map_err(|e| NotifyError::InvalidConfig(format!("to address: {e}")))?;

		let subject = format!("Vigil: {} is {}", monitor.name, heartbeat.status);
		let body_html = format!(
			"<p>{message}</p><p>ping: {} ms<br>time: {}</p>",
			heartbeat.ping_ms, heartbeat.time
		);

		let email = Message::builder()
			.from(from)
			.to(to)
			.subject(subject)
			.multipart(
				MultiPart::alternative()
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_PLAIN)
							.body(message.to_string()),
					)
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_HTML)
							.body(body_html),
					),
			)
			.map_err(|e| NotifyError::Send(format!("failed to build message: {e}")))?;

		config
			.transport()?
			.send(email)
			.await
			.map_err(|e| NotifyError::Send(e.to_string()))?;

		tracing::info!(monitor = %monitor.name, "alert email sent");
		Ok(())
	}
}
