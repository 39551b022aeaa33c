use std::marker::PhantomData;

use super::{Record, Repository, RepositoryError, User, UserRepository};


pub struct PgRepository<R> {
	db: sqlx::PgPool,
	_record: PhantomData<fn() -> R>,
}

impl<R> PgRepository<R> {
	pub fn new(db: sqlx::PgPool) -> Self {
		Self {
			db,
			_record: PhantomData,
		}
	}
}

fn map_err(err: sqlx::Error) -> RepositoryError {
	match &err {
		sqlx::Error::Database(db) if db.is_unique_violation() => {
			RepositoryError::Conflict(db.constraint().unwrap_or_default().to_string())
		}
		_ => RepositoryError::Database(err),
	}
}

fn insert_sql<R: Record>() -> String {
	let placeholders = (1..=R::COLUMNS.len()).map(|i| format!("${i}")).collect::<Vec<_>>();

	format!(
		"INSERT INTO {} (created_at, updated_at, {}) VALUES (NOW(), NOW(), {}) RETURNING *",
		R::TABLE,
		R::COLUMNS.join(", "),
		placeholders.join(", "),
	)
}

fn update_sql<R: Record>() -> String {
	let assignments = R::COLUMNS
		.iter()
		.enumerate()
		.map(|(i, column)| format!("{column} = ${}", i + 1))
		.collect::<Vec<_>>();

	format!(
		"UPDATE {} SET updated_at = NOW(), {} WHERE id = ${} AND deleted_at IS NULL RETURNING *",
		R::TABLE,
		assignments.join(", "),
		R::COLUMNS.len() + 1,
	)
}

#[async_trait::async_trait]
impl<R: Record> Repository<R> for PgRepository<R> {
	async fn list(&self) -> Result<Vec<R>, RepositoryError> {
		let sql = format!("SELECT * FROM {} WHERE deleted_at IS NULL ORDER BY id", R::TABLE);

		sqlx::query_as(&sql).fetch_all(&self.db).await.map_err(map_err)
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<R>, RepositoryError> {
		let sql = format!("SELECT * FROM {} WHERE id = $1 AND deleted_at IS NULL", R::TABLE);

		sqlx::query_as(&sql).bind(id).fetch_optional(&self.db).await.map_err(map_err)
	}

	async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<R>, RepositoryError> {
		let sql = format!("SELECT * FROM {} WHERE id = ANY($1) AND deleted_at IS NULL", R::TABLE);

		sqlx::query_as(&sql).bind(ids).fetch_all(&self.db).await.map_err(map_err)
	}

	async fn create(&self, record: R) -> Result<R, RepositoryError> {
		let sql = insert_sql::<R>();

		record
			.bind_columns(sqlx::query_as(&sql))
			.fetch_one(&self.db)
			.await
			.map_err(map_err)
	}

	async fn save(&self, record: R) -> Result<R, RepositoryError> {
		let sql = update_sql::<R>();

		record
			.bind_columns(sqlx::query_as(&sql))
			.bind(record.meta().id)
			.fetch_optional(&self.db)
			.await
			.map_err(map_err)?
			.ok_or(RepositoryError::NotFound)
	}

	async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
		let sql = format!(
			"UPDATE {} SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
			R::TABLE
		);

		let result = sqlx::query(&sql).bind(id).execute(&self.db).await.map_err(map_err)?;
		if result.rows_affected() == 0 {
			return Err(RepositoryError::NotFound);
		}

		Ok(())
	}
}

#[async_trait::async_trait]
impl UserRepository for PgRepository<User> {
	async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
		sqlx::query_as("SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL ORDER BY id LIMIT 1")
			.bind(email)
			.fetch_optional(&self.db)
			.await
			.map_err(map_err)
	}
}
