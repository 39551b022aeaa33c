use serde::Serialize;

use super::{Binds, Record, RecordMeta};

#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
	#[sqlx(flatten)]
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub title: String,
	pub description: String,
	pub company: String,
	pub link: String,
}

impl Record for Job {
	const COLUMNS: &'static [&'static str] = &["title", "description", "company", "link"];
	const ENTITY: &'static str = "Job";
	const TABLE: &'static str = "jobs";

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn bind_columns<'q>(&self, query: Binds<'q, Self>) -> Binds<'q, Self> {
		query
			.bind(self.title.clone())
			.bind(self.description.clone())
			.bind(self.company.clone())
			.bind(self.link.clone())
	}
}
