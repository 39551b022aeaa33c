use std::path::Path;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::logging;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// The log level to use, this is a tracing env filter
	pub level: String,

	/// What logging mode we should use
	pub mode: logging::Mode,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			mode: logging::Mode::Default,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	Io { path: String, source: std::io::Error },
	#[error("failed to parse config file: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("invalid config: {0}")]
	Deserialize(toml::de::Error),
	#[error("config key {0} is both a value and a table")]
	Conflict(String),
}

/// Loads `C` from an optional TOML file overlaid with environment variables.
///
/// The file path is `<PREFIX>_CONFIG_FILE` when set, otherwise
/// `default_file`. A missing default file is skipped, a missing explicit one
/// is an error. Afterwards every `<PREFIX>_A__B` variable sets the key `a.b`,
/// its value read as a TOML literal when possible and as a string otherwise.
/// Quote a value (`'"123"'`) to force a string, or mark the target field
/// with [`lenient_string`].
///
/// Returns the parsed config and the file it was read from, if any.
pub fn parse<C: DeserializeOwned>(prefix: &str, default_file: Option<String>) -> Result<(C, Option<String>), ConfigError> {
	let env_prefix = format!("{}_", prefix.to_uppercase());
	let file_var = format!("{env_prefix}CONFIG_FILE");

	let (path, explicit) = match std::env::var(&file_var) {
		Ok(path) => (Some(path), true),
		Err(_) => (default_file, false),
	};

	let mut table = Table::new();
	let mut loaded = None;

	if let Some(path) = path {
		match std::fs::read_to_string(Path::new(&path)) {
			Ok(contents) => {
				table = toml::from_str::<Table>(&contents)?;
				loaded = Some(path);
			}
			Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
				tracing::debug!(path = %path, "config file not found, skipping");
			}
			Err(source) => return Err(ConfigError::Io { path, source }),
		}
	}

	let mut vars = std::env::vars()
		.filter(|(key, _)| key != &file_var)
		.filter_map(|(key, value)| key.strip_prefix(&env_prefix).map(|key| (key.to_lowercase(), value)))
		.collect::<Vec<_>>();
	vars.sort();

	for (key, raw) in vars {
		let path = key.split("__").filter(|p| !p.is_empty()).collect::<Vec<_>>();
		if path.is_empty() {
			continue;
		}

		insert(&mut table, &path, parse_env_value(&raw), &key)?;
	}

	let config = Value::Table(table).try_into::<C>().map_err(ConfigError::Deserialize)?;

	Ok((config, loaded))
}

fn parse_env_value(raw: &str) -> Value {
	let value = toml::from_str::<Table>(&format!("value = {raw}"))
		.ok()
		.and_then(|mut t| t.remove("value"));

	match value {
		// A scalar is only typed when it reads back as the same text, so
		// `1_000` or `1e3` stay strings and [`lenient_string`] recovers the
		// exact input.
		Some(v @ (Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_)))
			if v.to_string() != raw.trim() =>
		{
			Value::String(raw.to_string())
		}
		Some(v) => v,
		None => Value::String(raw.to_string()),
	}
}

/// `deserialize_with` for free-form string fields. Accepts any scalar, so
/// `<PREFIX>_SMS__PASSWORD=12345` reaches a `String` as `"12345"` instead of
/// failing as an integer.
pub fn lenient_string<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	struct Lenient;

	impl<'de> serde::de::Visitor<'de> for Lenient {
		type Value = String;

		fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
			f.write_str("a string or a scalar")
		}

		fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<String, E> {
			Ok(v.to_string())
		}

		fn visit_string<E: serde::de::Error>(self, v: String) -> Result<String, E> {
			Ok(v)
		}

		fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<String, E> {
			Ok(v.to_string())
		}

		fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<String, E> {
			Ok(v.to_string())
		}

		fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<String, E> {
			Ok(v.to_string())
		}

		fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<String, E> {
			Ok(Value::Float(v).to_string())
		}
	}

	deserializer.deserialize_any(Lenient)
}

fn insert(table: &mut Table, path: &[&str], value: Value, key: &str) -> Result<(), ConfigError> {
	let (last, parents) = path.split_last().ok_or_else(|| ConfigError::Conflict(key.to_string()))?;

	let mut current = table;
	for part in parents {
		let entry = current
			.entry(part.to_string())
			.or_insert_with(|| Value::Table(Table::new()));

		current = match entry {
			Value::Table(t) => t,
			_ => return Err(ConfigError::Conflict(key.to_string())),
		};
	}

	current.insert(last.to_string(), value);

	Ok(())
}
