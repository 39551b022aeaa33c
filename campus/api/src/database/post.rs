use serde::Serialize;

use super::{Binds, Record, RecordMeta};

#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Post {
	#[sqlx(flatten)]
	#[serde(flatten)]
	pub meta: RecordMeta,
	/// Path of the stored post image.
	pub image: Option<String>,
	pub title: String,
	pub description: String,
	/// The user who owns the post.
	#[serde(rename = "UserID")]
	pub user_id: i64,
}

impl Record for Post {
	const COLUMNS: &'static [&'static str] = &["image", "title", "description", "user_id"];
	const ENTITY: &'static str = "Post";
	const TABLE: &'static str = "posts";

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn bind_columns<'q>(&self, query: Binds<'q, Self>) -> Binds<'q, Self> {
		query
			.bind(self.image.clone())
			.bind(self.title.clone())
			.bind(self.description.clone())
			.bind(self.user_id)
	}
}
