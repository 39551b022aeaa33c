use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::{require, DeleteResponse, EventInput, JobInput, LifecycleError, TimetableInput};
use crate::database::{Event, Job, Record, Repository, RepositoryError, Timetable};

/// A record that is created and replaced wholesale from a request body.
pub trait Replaceable: Record {
	type Input: DeserializeOwned + Send + 'static;

	/// Validates the input and builds the record's columns. The meta is left
	/// default.
	fn from_input(input: Self::Input) -> Result<Self, LifecycleError>;
}

impl Replaceable for Job {
	type Input = JobInput;

	fn from_input(input: JobInput) -> Result<Self, LifecycleError> {
		require("title", &input.title)?;
		require("description", &input.description)?;
		require("company", &input.company)?;
		require("link", &input.link)?;

		Ok(Self {
			title: input.title,
			description: input.description,
			company: input.company,
			link: input.link,
			..Default::default()
		})
	}
}

impl Replaceable for Event {
	type Input = EventInput;

	fn from_input(input: EventInput) -> Result<Self, LifecycleError> {
		require("quarter", &input.quarter)?;
		require("month", &input.month)?;
		require("title", &input.title)?;
		let date = input
			.date
			.ok_or_else(|| LifecycleError::Validation("date is required".to_string()))?;

		Ok(Self {
			quarter: input.quarter,
			month: input.month,
			date,
			title: input.title,
			participants: input.participants,
			..Default::default()
		})
	}
}

impl Replaceable for Timetable {
	type Input = TimetableInput;

	fn from_input(input: TimetableInput) -> Result<Self, LifecycleError> {
		require("day", &input.day)?;
		require("subject", &input.subject)?;
		require("subjectCode", &input.subject_code)?;
		require("faculty", &input.faculty)?;
		require("room", &input.room)?;
		require("instructor", &input.instructor)?;
		let time = input
			.time
			.ok_or_else(|| LifecycleError::Validation("time is required".to_string()))?;

		Ok(Self {
			day: input.day,
			subject: input.subject,
			subject_code: input.subject_code,
			faculty: input.faculty,
			room: input.room,
			time,
			instructor: input.instructor,
			..Default::default()
		})
	}
}

/// Plain CRUD over a record type without assets or references.
pub struct RecordLifecycle<R: Record> {
	records: Arc<dyn Repository<R>>,
}

impl<R: Replaceable> RecordLifecycle<R> {
	pub fn new(records: Arc<dyn Repository<R>>) -> Self {
		Self { records }
	}

	fn write_error(action: &str) -> impl FnOnce(RepositoryError) -> LifecycleError {
		let context = format!("Failed to {action} {}", R::ENTITY.to_lowercase());
		move |err| match err {
			RepositoryError::NotFound => LifecycleError::NotFound(R::ENTITY),
			source => LifecycleError::Dependency { context, source },
		}
	}

	pub async fn list(&self) -> Result<Vec<R>, LifecycleError> {
		self.records
			.list()
			.await
			.map_err(LifecycleError::dependency(format!("Failed to fetch {}", R::TABLE)))
	}

	pub async fn get(&self, id: i64) -> Result<R, LifecycleError> {
		self.records
			.find_by_id(id)
			.await
			.map_err(Self::write_error("fetch"))?
			.ok_or(LifecycleError::NotFound(R::ENTITY))
	}

	pub async fn create(&self, input: R::Input) -> Result<R, LifecycleError> {
		let record = R::from_input(input)?;

		let record = self.records.create(record).await.map_err(Self::write_error("create"))?;

		tracing::info!(entity = R::ENTITY, id = record.meta().id, "record created");

		Ok(record)
	}

	/// Replaces every column of the record.
	pub async fn update(&self, id: i64, input: R::Input) -> Result<R, LifecycleError> {
		let current = self.get(id).await?;

		let mut record = R::from_input(input)?;
		*record.meta_mut() = current.meta().clone();

		self.records.save(record).await.map_err(Self::write_error("update"))
	}

	pub async fn delete(&self, id: i64) -> Result<DeleteResponse, LifecycleError> {
		self.get(id).await?;

		self.records.delete(id).await.map_err(Self::write_error("delete"))?;

		Ok(DeleteResponse::new(R::ENTITY, None))
	}
}
