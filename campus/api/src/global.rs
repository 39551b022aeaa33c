use std::sync::Arc;

use common::context::Context;

use crate::config::AppConfig;
use crate::database::{Event, Job, Repositories, Timetable};
use crate::image_store::ImageStore;
use crate::lifecycle::{PostLifecycle, RecordLifecycle, UserLifecycle, Welcome};
use crate::notification::{NotificationError, SmsDispatcher};

pub struct GlobalState {
	pub config: AppConfig,
	pub ctx: Context,
	pub images: ImageStore,
	pub users: UserLifecycle,
	pub posts: PostLifecycle,
	pub jobs: RecordLifecycle<Job>,
	pub events: RecordLifecycle<Event>,
	pub timetables: RecordLifecycle<Timetable>,
}

impl GlobalState {
	pub fn new(config: AppConfig, ctx: Context, repositories: Repositories) -> Result<Self, NotificationError> {
		let images = ImageStore::new(&config.images.directory);
		let policy = config.lifecycle.on_image_delete_failure;

		let mut users = UserLifecycle::new(repositories.users.clone(), images.clone(), policy);
		if config.sms.enabled {
			users = users.with_welcome(Welcome {
				notifier: Arc::new(SmsDispatcher::new(config.sms.clone())?),
				message: config.sms.registration_message.clone(),
			});
		}

		Ok(Self {
			posts: PostLifecycle::new(repositories.posts, repositories.users, images.clone(), policy),
			jobs: RecordLifecycle::new(repositories.jobs),
			events: RecordLifecycle::new(repositories.events),
			timetables: RecordLifecycle::new(repositories.timetables),
			users,
			images,
			config,
			ctx,
		})
	}
}
