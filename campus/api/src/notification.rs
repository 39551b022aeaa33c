use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::SmsConfig;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
	#[error("sms request failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("failed to parse token response: {0}")]
	InvalidTokenResponse(#[source] reqwest::Error),
	#[error("token not received from sms api")]
	MissingToken,
	#[error("invalid recipient number: {0}")]
	InvalidRecipient(String),
	#[error("sms api returned {status}: {body}")]
	Status { status: reqwest::StatusCode, body: String },
}

/// Delivers a text message to a set of phone numbers.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
	async fn send(&self, message: &str, recipients: &[String]) -> Result<(), NotificationError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
	#[serde(default)]
	data: TokenData,
}

#[derive(Debug, Default, Deserialize)]
struct TokenData {
	#[serde(default)]
	token: String,
}

#[derive(Debug, Serialize)]
struct SmsRecipient {
	number: i64,
}

#[derive(Debug, Serialize)]
struct SmsRequest<'a> {
	sender_id: i64,
	sms: &'a str,
	schedule: &'static str,
	recipients: Vec<SmsRecipient>,
}

/// Sends sms through the provider's token then send flow.
pub struct SmsDispatcher {
	client: reqwest::Client,
	config: SmsConfig,
}

impl SmsDispatcher {
	pub fn new(config: SmsConfig) -> Result<Self, NotificationError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_secs))
			.build()?;

		Ok(Self { client, config })
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
	}

	async fn token(&self) -> Result<String, NotificationError> {
		let res = self
			.client
			.post(self.url("/api/create-token"))
			.json(&json!({
				"user_id": self.config.user_id,
				"password": self.config.password,
			}))
			.send()
			.await?;

		let res = check_status(res).await?;
		let body = res
			.json::<TokenResponse>()
			.await
			.map_err(NotificationError::InvalidTokenResponse)?;

		if body.data.token.is_empty() {
			return Err(NotificationError::MissingToken);
		}

		Ok(body.data.token)
	}
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, NotificationError> {
	let status = res.status();
	if status.is_success() {
		return Ok(res);
	}

	let body = res.text().await.unwrap_or_default();
	Err(NotificationError::Status { status, body })
}

#[async_trait::async_trait]
impl Notifier for SmsDispatcher {
	async fn send(&self, message: &str, recipients: &[String]) -> Result<(), NotificationError> {
		let recipients = recipients
			.iter()
			.map(|number| {
				number
					.trim()
					.trim_start_matches('+')
					.parse()
					.map(|number| SmsRecipient { number })
					.map_err(|_| NotificationError::InvalidRecipient(number.clone()))
			})
			.collect::<Result<Vec<_>, _>>()?;

		let count = recipients.len();
		let token = self.token().await?;

		let res = self
			.client
			.post(self.url("/api/send-sms"))
			.header(reqwest::header::ACCEPT, "application/json")
			.bearer_auth(token)
			.json(&SmsRequest {
				sender_id: self.config.sender_id,
				sms: message,
				schedule: "None",
				recipients,
			})
			.send()
			.await?;

		check_status(res).await?;

		tracing::info!(recipients = count, "sent sms");

		Ok(())
	}
}
