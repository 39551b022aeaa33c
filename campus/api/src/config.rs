use std::net::SocketAddr;

use common::config::{lenient_string, LoggingConfig};

use crate::lifecycle::ImageFailurePolicy;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
/// The API is the backend for the Campus Connect app
pub struct AppConfig {
	/// The path to the config file
	pub config_file: Option<String>,

	/// Name of this instance
	#[serde(deserialize_with = "lenient_string")]
	pub name: String,

	/// The logging config
	pub logging: LoggingConfig,

	/// API Config
	pub api: ApiConfig,

	/// Database Config
	pub database: DatabaseConfig,

	/// Image storage config
	pub images: ImageConfig,

	/// Record lifecycle config
	pub lifecycle: LifecycleConfig,

	/// SMS notification config
	pub sms: SmsConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ApiConfig {
	/// Bind address for the API
	pub bind_address: SocketAddr,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			bind_address: "[::]:8080".parse().expect("failed to parse bind address"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
	/// The database URL to use
	#[serde(deserialize_with = "lenient_string")]
	pub uri: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			uri: "postgres://postgres@localhost:5432/campus_connect".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ImageConfig {
	/// The directory uploaded images are written to and served from
	#[serde(deserialize_with = "lenient_string")]
	pub directory: String,
}

impl Default for ImageConfig {
	fn default() -> Self {
		Self {
			directory: "./Images".to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
	/// What happens to a record when deleting its image fails
	pub on_image_delete_failure: ImageFailurePolicy,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct SmsConfig {
	/// Send a welcome sms to newly registered users with a phone number
	pub enabled: bool,

	/// The sms provider url
	#[serde(deserialize_with = "lenient_string")]
	pub base_url: String,

	/// The account id used to request a token
	pub user_id: i64,

	/// The account password used to request a token. An all digit value from
	/// the environment stays a string.
	#[serde(deserialize_with = "lenient_string")]
	pub password: String,

	/// The sender id messages go out with
	pub sender_id: i64,

	/// The welcome message, `{name}` is replaced with the user's name
	#[serde(deserialize_with = "lenient_string")]
	pub registration_message: String,

	/// Request timeout in seconds
	pub timeout_secs: u64,
}

impl Default for SmsConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			base_url: "https://dev.hudumasms.com".to_string(),
			user_id: 0,
			password: String::new(),
			sender_id: 20,
			registration_message: "Welcome to Campus Connect, {name}!".to_string(),
			timeout_secs: 10,
		}
	}
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			config_file: Some("config.toml".to_string()),
			name: "campus-api".to_string(),
			logging: LoggingConfig::default(),
			api: ApiConfig::default(),
			database: DatabaseConfig::default(),
			images: ImageConfig::default(),
			lifecycle: LifecycleConfig::default(),
			sms: SmsConfig::default(),
		}
	}
}

impl AppConfig {
	pub fn parse() -> Result<Self, common::config::ConfigError> {
		let (mut config, config_file) =
			common::config::parse::<Self>("CAMPUS", Self::default().config_file)?;

		config.config_file = config_file;

		Ok(config)
	}
}
