use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialError;
use crate::database::{Post, RecordMeta, RepositoryError, User};
use crate::image_store::ImageError;

mod post;
mod record;
mod user;

pub use post::PostLifecycle;
pub use record::{RecordLifecycle, Replaceable};
pub use user::{UserLifecycle, Welcome};

/// Everything a lifecycle operation can fail with. The display text is what
/// clients get to see.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
	#[error("Invalid input: {0}")]
	Validation(String),
	#[error("{0} not found")]
	NotFound(&'static str),
	#[error("Invalid {field}: {entity} not found")]
	MissingReference { field: &'static str, entity: &'static str },
	#[error("{0}")]
	Conflict(&'static str),
	#[error("Invalid credentials")]
	Unauthorized,
	#[error("{context}: {source}")]
	Asset {
		context: &'static str,
		#[source]
		source: ImageError,
	},
	#[error("Failed to process password")]
	Credential(#[from] CredentialError),
	#[error("{context}")]
	Dependency {
		context: String,
		#[source]
		source: RepositoryError,
	},
}

impl LifecycleError {
	pub(crate) fn dependency(context: impl Into<String>) -> impl FnOnce(RepositoryError) -> Self {
		let context = context.into();
		move |source| Self::Dependency { context, source }
	}
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), LifecycleError> {
	if value.trim().is_empty() {
		return Err(LifecycleError::Validation(format!("{field} is required")));
	}

	Ok(())
}

/// What happens to a record when erasing its image fails during delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFailurePolicy {
	/// Report success with a warning and leave the record in place.
	#[default]
	KeepRecord,
	/// Report the warning and delete the record anyway.
	DeleteRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPublicView {
	pub id: i64,
	pub name: String,
	pub email: String,
	pub role: String,
	#[serde(rename = "profileImage")]
	pub profile_image: Option<String>,
}

impl From<&User> for UserPublicView {
	fn from(user: &User) -> Self {
		Self {
			id: user.meta.id,
			name: user.name.clone(),
			email: user.email.clone(),
			role: user.role.clone(),
			profile_image: user.profile_image.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginUser {
	pub id: i64,
	pub name: String,
	pub email: String,
	pub role: String,
	pub course: String,
	pub year: String,
	#[serde(rename = "profileImage")]
	pub profile_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginView {
	pub message: &'static str,
	pub user: LoginUser,
}

impl From<User> for LoginView {
	fn from(user: User) -> Self {
		Self {
			message: "Login successful",
			user: LoginUser {
				id: user.meta.id,
				name: user.name,
				email: user.email,
				role: user.role,
				course: user.course,
				year: user.year,
				profile_image: user.profile_image,
			},
		}
	}
}

/// The owner fields embedded in a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserSummary {
	pub id: i64,
	pub name: String,
	#[serde(rename = "profileImage")]
	pub profile_image: Option<String>,
	pub role: String,
	pub course: String,
	pub year: String,
}

impl From<&User> for UserSummary {
	fn from(user: &User) -> Self {
		Self {
			id: user.meta.id,
			name: user.name.clone(),
			profile_image: user.profile_image.clone(),
			role: user.role.clone(),
			course: user.course.clone(),
			year: user.year.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub image: Option<String>,
	pub title: String,
	pub description: String,
	#[serde(rename = "userID")]
	pub user_id: i64,
	pub user: UserSummary,
}

impl PostView {
	/// An owner that does not resolve yields an empty summary.
	pub fn new(post: Post, owner: Option<&User>) -> Self {
		Self {
			meta: post.meta,
			image: post.image,
			title: post.title,
			description: post.description,
			user_id: post.user_id,
			user: owner.map(UserSummary::from).unwrap_or_default(),
		}
	}
}

/// A user that was created but whose profile image could not be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialCreate {
	pub error: String,
	pub id: i64,
	pub name: String,
	pub email: String,
	pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
	Created(UserPublicView),
	Partial(PartialCreate),
}

/// A successful response that may carry a non fatal warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warned<T> {
	#[serde(flatten)]
	pub inner: T,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteResponse {
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub warning: Option<String>,
}

impl DeleteResponse {
	pub fn new(entity: &str, warning: Option<String>) -> Self {
		Self {
			message: format!("{entity} deleted successfully"),
			warning,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserInput {
	#[serde(alias = "Name")]
	pub name: String,
	#[serde(alias = "Email")]
	pub email: String,
	#[serde(alias = "Password")]
	pub password: String,
	/// An encoded image, see [`ImageStore::save`](crate::image_store::ImageStore::save).
	#[serde(alias = "ProfileImage")]
	pub profile_image: String,
	#[serde(alias = "Role")]
	pub role: String,
	#[serde(alias = "Course")]
	pub course: String,
	#[serde(alias = "Year")]
	pub year: String,
	#[serde(alias = "Phone")]
	pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginInput {
	#[serde(alias = "Email")]
	pub email: String,
	#[serde(alias = "Password")]
	pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostInput {
	#[serde(alias = "Image")]
	pub image: String,
	#[serde(alias = "Title")]
	pub title: String,
	#[serde(alias = "Description")]
	pub description: String,
	#[serde(rename = "userID", alias = "UserID", alias = "userId")]
	pub user_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobInput {
	#[serde(alias = "Title")]
	pub title: String,
	#[serde(alias = "Description")]
	pub description: String,
	#[serde(alias = "Company")]
	pub company: String,
	#[serde(alias = "Link")]
	pub link: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventInput {
	#[serde(alias = "Quarter")]
	pub quarter: String,
	#[serde(alias = "Month")]
	pub month: String,
	#[serde(alias = "Date")]
	pub date: Option<DateTime<Utc>>,
	#[serde(alias = "Title")]
	pub title: String,
	#[serde(alias = "Participants")]
	pub participants: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimetableInput {
	#[serde(alias = "Day")]
	pub day: String,
	#[serde(alias = "Subject")]
	pub subject: String,
	#[serde(alias = "SubjectCode")]
	pub subject_code: String,
	#[serde(alias = "Faculty")]
	pub faculty: String,
	#[serde(alias = "Room")]
	pub room: String,
	#[serde(alias = "Time")]
	pub time: Option<DateTime<Utc>>,
	#[serde(alias = "Instructor")]
	pub instructor: String,
}
