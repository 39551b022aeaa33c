use std::sync::Arc;

use super::{
	require, DeleteResponse, ImageFailurePolicy, LifecycleError, LoginInput, LoginView, PartialCreate, Registration,
	UserInput, UserPublicView, Warned,
};
use crate::credentials::CredentialManager;
use crate::database::{RepositoryError, User, UserRepository, USERS_EMAIL_UNIQUE, USERS_PHONE_UNIQUE};
use crate::image_store::ImageStore;
use crate::notification::Notifier;
use crate::sanitize::sanitize_user_id_filename;

const PROFILE_PREFIX: &str = "profile-picture-UID";
const EMAIL_TAKEN: &str = "Email already registered";
const PHONE_TAKEN: &str = "Phone already registered";

/// The sms sent to a user after they register.
pub struct Welcome {
	pub notifier: Arc<dyn Notifier>,
	/// `{name}` is replaced with the user's name.
	pub message: String,
}

pub struct UserLifecycle {
	users: Arc<dyn UserRepository>,
	images: ImageStore,
	credentials: CredentialManager,
	welcome: Option<Welcome>,
	policy: ImageFailurePolicy,
}

fn write_error(context: &'static str) -> impl FnOnce(RepositoryError) -> LifecycleError {
	move |err| match err {
		RepositoryError::Conflict(constraint) if constraint == USERS_EMAIL_UNIQUE => LifecycleError::Conflict(EMAIL_TAKEN),
		RepositoryError::Conflict(constraint) if constraint == USERS_PHONE_UNIQUE => LifecycleError::Conflict(PHONE_TAKEN),
		RepositoryError::NotFound => LifecycleError::NotFound("User"),
		source => LifecycleError::Dependency {
			context: context.to_string(),
			source,
		},
	}
}

fn phone(input: Option<String>) -> Option<String> {
	input.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

impl UserLifecycle {
	pub fn new(users: Arc<dyn UserRepository>, images: ImageStore, policy: ImageFailurePolicy) -> Self {
		Self {
			users,
			images,
			credentials: CredentialManager,
			welcome: None,
			policy,
		}
	}

	pub fn with_welcome(mut self, welcome: Welcome) -> Self {
		self.welcome = Some(welcome);
		self
	}

	pub async fn list(&self) -> Result<Vec<User>, LifecycleError> {
		self.users.list().await.map_err(LifecycleError::dependency("Failed to fetch users"))
	}

	pub async fn get(&self, id: i64) -> Result<User, LifecycleError> {
		self.users
			.find_by_id(id)
			.await
			.map_err(LifecycleError::dependency("Failed to fetch user"))?
			.ok_or(LifecycleError::NotFound("User"))
	}

	async fn ensure_email_free(&self, email: &str, owner: Option<i64>) -> Result<(), LifecycleError> {
		let existing = self
			.users
			.find_by_email(email)
			.await
			.map_err(LifecycleError::dependency("Failed to check email"))?;

		match existing {
			Some(user) if Some(user.meta.id) != owner => Err(LifecycleError::Conflict(EMAIL_TAKEN)),
			_ => Ok(()),
		}
	}

	/// Registers a user. The profile image is stored after the record exists
	/// so its file name can carry the id; failing that step still leaves the
	/// user registered.
	#[tracing::instrument(skip_all, fields(email = %input.email))]
	pub async fn create(&self, input: UserInput) -> Result<Registration, LifecycleError> {
		require("name", &input.name)?;
		require("email", &input.email)?;
		require("password", &input.password)?;

		self.ensure_email_free(&input.email, None).await?;

		let password_hash = self.credentials.hash(&input.password)?;

		let user = self
			.users
			.create(User {
				name: input.name,
				profile_image: None,
				role: input.role,
				course: input.course,
				phone: phone(input.phone),
				year: input.year,
				password_hash,
				email: input.email,
				..Default::default()
			})
			.await
			.map_err(write_error("Failed to create user"))?;

		tracing::info!(id = user.meta.id, "user created");

		let partial = |error: String, user: &User| {
			Registration::Partial(PartialCreate {
				error,
				id: user.meta.id,
				name: user.name.clone(),
				email: user.email.clone(),
				role: user.role.clone(),
			})
		};

		let user = if input.profile_image.is_empty() {
			user
		} else {
			let name = sanitize_user_id_filename(PROFILE_PREFIX, user.meta.id);
			let path = match self.images.save(&input.profile_image, &name).await {
				Ok(path) => path,
				Err(err) => {
					tracing::warn!(id = user.meta.id, error = %err, "failed to save profile image");
					return Ok(partial(format!("User created but failed to save profile image: {err}"), &user));
				}
			};

			let mut with_image = user.clone();
			with_image.profile_image = Some(path);

			match self.users.save(with_image).await {
				Ok(user) => user,
				Err(err) => {
					tracing::warn!(id = user.meta.id, error = %err, "failed to store profile image path");
					return Ok(partial(
						format!("User created but failed to update profile image path: {err}"),
						&user,
					));
				}
			}
		};

		self.welcome(&user).await;

		Ok(Registration::Created(UserPublicView::from(&user)))
	}

	async fn welcome(&self, user: &User) {
		let (Some(welcome), Some(phone)) = (&self.welcome, &user.phone) else {
			return;
		};

		let message = welcome.message.replace("{name}", &user.name);
		if let Err(err) = welcome.notifier.send(&message, std::slice::from_ref(phone)).await {
			tracing::warn!(id = user.meta.id, error = %err, "failed to send registration sms");
		}
	}

	/// Replaces the user's fields. A non empty password is re-hashed, a new
	/// image replaces the stored one.
	#[tracing::instrument(skip(self, input))]
	pub async fn update(&self, id: i64, input: UserInput) -> Result<Warned<User>, LifecycleError> {
		let mut user = self.get(id).await?;

		require("name", &input.name)?;
		require("email", &input.email)?;

		if input.email != user.email {
			self.ensure_email_free(&input.email, Some(id)).await?;
		}

		if !input.password.is_empty() {
			user.password_hash = self.credentials.hash(&input.password)?;
		}

		let mut warning = None;

		if !input.profile_image.is_empty() && user.profile_image.as_deref() != Some(input.profile_image.as_str()) {
			if let Some(old) = &user.profile_image {
				if let Err(err) = self.images.delete(old).await {
					tracing::warn!(id, error = %err, "failed to delete old profile image");
					warning = Some(format!("Failed to delete old profile image: {err}"));
				}
			}

			let name = sanitize_user_id_filename(PROFILE_PREFIX, id);
			let path = self
				.images
				.save(&input.profile_image, &name)
				.await
				.map_err(|source| LifecycleError::Asset {
					context: "Failed to save profile image",
					source,
				})?;

			user.profile_image = Some(path);
		}

		user.name = input.name;
		user.role = input.role;
		user.course = input.course;
		user.year = input.year;
		user.email = input.email;
		if let Some(p) = input.phone {
			user.phone = phone(Some(p));
		}

		let user = self.users.save(user).await.map_err(write_error("Failed to update user"))?;

		Ok(Warned { inner: user, warning })
	}

	/// Soft deletes the user after erasing their profile image.
	#[tracing::instrument(skip(self))]
	pub async fn delete(&self, id: i64) -> Result<DeleteResponse, LifecycleError> {
		let user = self.get(id).await?;

		let mut warning = None;
		if let Some(image) = &user.profile_image {
			if let Err(err) = self.images.delete(image).await {
				tracing::warn!(id, error = %err, "failed to delete profile image");
				warning = Some(format!("Failed to delete profile image: {err}"));

				if self.policy == ImageFailurePolicy::KeepRecord {
					return Ok(DeleteResponse::new("User", warning));
				}
			}
		}

		self.users.delete(id).await.map_err(write_error("Failed to delete user"))?;

		Ok(DeleteResponse::new("User", warning))
	}

	/// Unknown emails and wrong passwords are indistinguishable.
	pub async fn login(&self, input: LoginInput) -> Result<LoginView, LifecycleError> {
		require("email", &input.email)?;
		require("password", &input.password)?;

		let user = self
			.users
			.find_by_email(&input.email)
			.await
			.map_err(LifecycleError::dependency("Failed to log in"))?
			.ok_or(LifecycleError::Unauthorized)?;

		if !self.credentials.verify(&user.password_hash, &input.password) {
			return Err(LifecycleError::Unauthorized);
		}

		Ok(LoginView::from(user))
	}
}
