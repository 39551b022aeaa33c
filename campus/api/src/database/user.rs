use serde::Serialize;

use super::{Binds, Record, RecordMeta};

pub const USERS_EMAIL_UNIQUE: &str = "users_email_active_idx";
pub const USERS_PHONE_UNIQUE: &str = "users_phone_active_idx";

#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
	#[sqlx(flatten)]
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub name: String,
	/// Path of the stored profile picture.
	pub profile_image: Option<String>,
	pub role: String,
	pub course: String,
	/// Unique among active users when set.
	pub phone: Option<String>,
	pub year: String,
	/// The hashed password of the user. (argon2)
	#[serde(rename = "Password")]
	pub password_hash: String,
	/// Unique among active users.
	pub email: String,
}

impl Record for User {
	const COLUMNS: &'static [&'static str] = &[
		"name",
		"profile_image",
		"role",
		"course",
		"phone",
		"year",
		"password_hash",
		"email",
	];
	const ENTITY: &'static str = "User";
	const TABLE: &'static str = "users";

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn bind_columns<'q>(&self, query: Binds<'q, Self>) -> Binds<'q, Self> {
		query
			.bind(self.name.clone())
			.bind(self.profile_image.clone())
			.bind(self.role.clone())
			.bind(self.course.clone())
			.bind(self.phone.clone())
			.bind(self.year.clone())
			.bind(self.password_hash.clone())
			.bind(self.email.clone())
	}
}
