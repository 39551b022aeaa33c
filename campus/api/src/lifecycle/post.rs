use std::collections::HashMap;
use std::sync::Arc;

use super::{require, DeleteResponse, ImageFailurePolicy, LifecycleError, PostInput, PostView, Warned};
use crate::database::{Post, Repository, RepositoryError, User, UserRepository};
use crate::image_store::ImageStore;
use crate::sanitize::sanitize_title;

pub struct PostLifecycle {
	posts: Arc<dyn Repository<Post>>,
	users: Arc<dyn UserRepository>,
	images: ImageStore,
	policy: ImageFailurePolicy,
}

fn image_name(title: &str) -> String {
	format!("post-{}", sanitize_title(title))
}

fn write_error(context: &'static str) -> impl FnOnce(RepositoryError) -> LifecycleError {
	move |err| match err {
		RepositoryError::NotFound => LifecycleError::NotFound("Post"),
		source => LifecycleError::Dependency {
			context: context.to_string(),
			source,
		},
	}
}

impl PostLifecycle {
	pub fn new(
		posts: Arc<dyn Repository<Post>>,
		users: Arc<dyn UserRepository>,
		images: ImageStore,
		policy: ImageFailurePolicy,
	) -> Self {
		Self {
			posts,
			users,
			images,
			policy,
		}
	}

	async fn owner(&self, user_id: i64) -> Result<User, LifecycleError> {
		self.users
			.find_by_id(user_id)
			.await
			.map_err(LifecycleError::dependency("Failed to fetch user"))?
			.ok_or(LifecycleError::MissingReference {
				field: "UserID",
				entity: "User",
			})
	}

	async fn find(&self, id: i64) -> Result<Post, LifecycleError> {
		self.posts
			.find_by_id(id)
			.await
			.map_err(LifecycleError::dependency("Failed to fetch post"))?
			.ok_or(LifecycleError::NotFound("Post"))
	}

	pub async fn list(&self) -> Result<Vec<PostView>, LifecycleError> {
		let posts = self
			.posts
			.list()
			.await
			.map_err(LifecycleError::dependency("Failed to fetch posts"))?;

		let mut ids = posts.iter().map(|p| p.user_id).collect::<Vec<_>>();
		ids.sort_unstable();
		ids.dedup();

		let owners = self
			.users
			.find_by_ids(&ids)
			.await
			.map_err(LifecycleError::dependency("Failed to fetch posts"))?
			.into_iter()
			.map(|u| (u.meta.id, u))
			.collect::<HashMap<_, _>>();

		Ok(posts
			.into_iter()
			.map(|post| {
				let owner = owners.get(&post.user_id);
				PostView::new(post, owner)
			})
			.collect())
	}

	pub async fn get(&self, id: i64) -> Result<PostView, LifecycleError> {
		let post = self.find(id).await?;
		let owner = self
			.users
			.find_by_id(post.user_id)
			.await
			.map_err(LifecycleError::dependency("Failed to fetch post"))?;

		Ok(PostView::new(post, owner.as_ref()))
	}

	/// The owner is resolved before anything touches the disk.
	#[tracing::instrument(skip_all, fields(user_id = input.user_id))]
	pub async fn create(&self, input: PostInput) -> Result<PostView, LifecycleError> {
		require("title", &input.title)?;

		let owner = self.owner(input.user_id).await?;

		let image = match input.image.is_empty() {
			true => None,
			false => Some(
				self.images
					.save(&input.image, &image_name(&input.title))
					.await
					.map_err(|source| LifecycleError::Asset {
						context: "Failed to save image",
						source,
					})?,
			),
		};

		let post = self
			.posts
			.create(Post {
				image,
				title: input.title,
				description: input.description,
				user_id: owner.meta.id,
				..Default::default()
			})
			.await
			.map_err(write_error("Failed to create post"))?;

		tracing::info!(id = post.meta.id, "post created");

		Ok(PostView::new(post, Some(&owner)))
	}

	/// A zero `user_id` keeps the current owner. A new image is stored under
	/// the new title.
	#[tracing::instrument(skip(self, input))]
	pub async fn update(&self, id: i64, input: PostInput) -> Result<Warned<PostView>, LifecycleError> {
		let mut post = self.find(id).await?;

		require("title", &input.title)?;

		if input.user_id != 0 {
			post.user_id = self.owner(input.user_id).await?.meta.id;
		}

		let mut warning = None;

		if !input.image.is_empty() && post.image.as_deref() != Some(input.image.as_str()) {
			if let Some(old) = &post.image {
				if let Err(err) = self.images.delete(old).await {
					tracing::warn!(id, error = %err, "failed to delete old post image");
					warning = Some(format!("Failed to delete old image: {err}"));
				}
			}

			let path = self
				.images
				.save(&input.image, &image_name(&input.title))
				.await
				.map_err(|source| LifecycleError::Asset {
					context: "Failed to save image",
					source,
				})?;

			post.image = Some(path);
		}

		post.title = input.title;
		post.description = input.description;

		let post = self.posts.save(post).await.map_err(write_error("Failed to update post"))?;

		let owner = match self.users.find_by_id(post.user_id).await {
			Ok(owner) => owner,
			Err(err) => {
				tracing::warn!(id, error = %err, "failed to fetch post owner");
				None
			}
		};

		Ok(Warned {
			inner: PostView::new(post, owner.as_ref()),
			warning,
		})
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete(&self, id: i64) -> Result<DeleteResponse, LifecycleError> {
		let post = self.find(id).await?;

		let mut warning = None;
		if let Some(image) = &post.image {
			if let Err(err) = self.images.delete(image).await {
				tracing::warn!(id, error = %err, "failed to delete post image");
				warning = Some(format!("Failed to delete associated image: {err}"));

				if self.policy == ImageFailurePolicy::KeepRecord {
					return Ok(DeleteResponse::new("Post", warning));
				}
			}
		}

		self.posts.delete(id).await.map_err(write_error("Failed to delete post"))?;

		Ok(DeleteResponse::new("Post", warning))
	}
}
