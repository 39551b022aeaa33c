use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Binds, Record, RecordMeta};

#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timetable {
	#[sqlx(flatten)]
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub day: String,
	pub subject: String,
	pub subject_code: String,
	pub faculty: String,
	pub room: String,
	pub time: DateTime<Utc>,
	pub instructor: String,
}

impl Record for Timetable {
	const COLUMNS: &'static [&'static str] = &[
		"day",
		"subject",
		"subject_code",
		"faculty",
		"room",
		"time",
		"instructor",
	];
	const ENTITY: &'static str = "Timetable";
	const TABLE: &'static str = "timetables";

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn bind_columns<'q>(&self, query: Binds<'q, Self>) -> Binds<'q, Self> {
		query
			.bind(self.day.clone())
			.bind(self.subject.clone())
			.bind(self.subject_code.clone())
			.bind(self.faculty.clone())
			.bind(self.room.clone())
			.bind(self.time)
			.bind(self.instructor.clone())
	}
}
