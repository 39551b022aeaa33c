use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Binds, Record, RecordMeta};

#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
	#[sqlx(flatten)]
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub quarter: String,
	pub month: String,
	pub date: DateTime<Utc>,
	pub title: String,
	pub participants: Option<String>,
}

impl Record for Event {
	const COLUMNS: &'static [&'static str] = &["quarter", "month", "date", "title", "participants"];
	const ENTITY: &'static str = "Event";
	const TABLE: &'static str = "events";

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn bind_columns<'q>(&self, query: Binds<'q, Self>) -> Binds<'q, Self> {
		query
			.bind(self.quarter.clone())
			.bind(self.month.clone())
			.bind(self.date)
			.bind(self.title.clone())
			.bind(self.participants.clone())
	}
}
