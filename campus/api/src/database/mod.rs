use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};

mod event;
mod job;
mod post;
mod postgres;
mod timetable;
mod user;

pub use event::Event;
pub use job::Job;
pub use post::Post;
pub use postgres::PgRepository;
pub use timetable::Timetable;
pub use user::{User, USERS_EMAIL_UNIQUE, USERS_PHONE_UNIQUE};

/// Columns every table shares. Rows with `deleted_at` set are invisible to
/// every query.
#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize)]
pub struct RecordMeta {
	#[serde(rename = "ID")]
	pub id: i64,
	#[serde(rename = "CreatedAt")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "UpdatedAt")]
	pub updated_at: DateTime<Utc>,
	#[serde(rename = "DeletedAt")]
	pub deleted_at: Option<DateTime<Utc>>,
}

pub type Binds<'q, R> = QueryAs<'q, Postgres, R, PgArguments>;

/// A soft deletable row type.
pub trait Record: for<'r> FromRow<'r, PgRow> + Serialize + Clone + Send + Sync + Unpin + Sized + 'static {
	const TABLE: &'static str;
	/// Human readable name used in messages, e.g. `User`.
	const ENTITY: &'static str;
	/// Every column besides the shared ones, in the order `bind_columns` binds
	/// them.
	const COLUMNS: &'static [&'static str];

	fn meta(&self) -> &RecordMeta;
	fn meta_mut(&mut self) -> &mut RecordMeta;

	fn bind_columns<'q>(&self, query: Binds<'q, Self>) -> Binds<'q, Self>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
	#[error("unique constraint {0} violated")]
	Conflict(String),
	#[error("record not found")]
	NotFound,
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait Repository<R: Record>: Send + Sync {
	async fn list(&self) -> Result<Vec<R>, RepositoryError>;

	async fn find_by_id(&self, id: i64) -> Result<Option<R>, RepositoryError>;

	/// Missing ids are skipped.
	async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<R>, RepositoryError>;

	/// Inserts `record`, ignoring its meta, and returns the stored row.
	async fn create(&self, record: R) -> Result<R, RepositoryError>;

	/// Overwrites every column of an active row.
	async fn save(&self, record: R) -> Result<R, RepositoryError>;

	/// Soft deletes an active row.
	async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}

#[async_trait::async_trait]
pub trait UserRepository: Repository<User> {
	/// Exact, case sensitive match among active users.
	async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}

/// One repository per record type.
#[derive(Clone)]
pub struct Repositories {
	pub users: Arc<dyn UserRepository>,
	pub posts: Arc<dyn Repository<Post>>,
	pub jobs: Arc<dyn Repository<Job>>,
	pub events: Arc<dyn Repository<Event>>,
	pub timetables: Arc<dyn Repository<Timetable>>,
}

impl Repositories {
	pub fn postgres(db: sqlx::PgPool) -> Self {
		Self {
			users: Arc::new(PgRepository::<User>::new(db.clone())),
			posts: Arc::new(PgRepository::<Post>::new(db.clone())),
			jobs: Arc::new(PgRepository::<Job>::new(db.clone())),
			events: Arc::new(PgRepository::<Event>::new(db.clone())),
			timetables: Arc::new(PgRepository::<Timetable>::new(db)),
		}
	}
}
