use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{jpeg, png};
use crate::credentials::CredentialManager;
use crate::database::{Repository, RepositoryError, User, UserRepository};
use crate::lifecycle::{
	ImageFailurePolicy, LifecycleError, LoginInput, Registration, UserInput, UserLifecycle, Welcome,
};
use crate::notification::{NotificationError, Notifier};
use crate::tests::global::Mocks;
use crate::tests::memory::MemoryRepository;

fn lifecycle(mocks: &Mocks, policy: ImageFailurePolicy) -> UserLifecycle {
	UserLifecycle::new(mocks.users.clone(), mocks.image_store(), policy)
}

fn input(name: &str, email: &str) -> UserInput {
	UserInput {
		name: name.to_string(),
		email: email.to_string(),
		password: "correct horse".to_string(),
		role: "student".to_string(),
		course: "CS".to_string(),
		year: "2".to_string(),
		..Default::default()
	}
}

async fn register(users: &UserLifecycle, input: UserInput) -> i64 {
	match users.create(input).await.expect("failed to create user") {
		Registration::Created(view) => view.id,
		Registration::Partial(partial) => panic!("unexpected partial create: {partial:?}"),
	}
}

#[tokio::test]
async fn test_create_hashes_password() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let view = match users.create(input("Ada", "ada@campus.edu")).await.expect("failed to create") {
		Registration::Created(view) => view,
		other => panic!("unexpected result: {other:?}"),
	};

	assert_eq!(view.name, "Ada");
	assert_eq!(view.email, "ada@campus.edu");
	assert_eq!(view.role, "student");
	assert_eq!(view.profile_image, None);

	let stored = mocks.users.find_by_id(view.id).await.unwrap().expect("user stored");
	assert_ne!(stored.password_hash, "correct horse");
	assert!(CredentialManager.verify(&stored.password_hash, "correct horse"));
	assert_eq!(mocks.users.writes(), 1);
}

#[tokio::test]
async fn test_create_requires_fields() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let mut missing_password = input("Ada", "ada@campus.edu");
	missing_password.password.clear();

	for bad in [input("", "ada@campus.edu"), input("Ada", ""), missing_password] {
		let err = users.create(bad).await.expect_err("input is incomplete");
		assert!(matches!(err, LifecycleError::Validation(_)), "{err:?}");
	}

	assert_eq!(mocks.users.writes(), 0);
}

#[tokio::test]
async fn test_duplicate_email_writes_nothing() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	register(&users, input("Ada", "ada@campus.edu")).await;
	let writes = mocks.users.writes();

	let mut duplicate = input("Other Ada", "ada@campus.edu");
	duplicate.profile_image = png(b"face");

	let err = users.create(duplicate).await.expect_err("email is taken");
	assert!(matches!(err, LifecycleError::Conflict("Email already registered")), "{err:?}");
	assert_eq!(err.to_string(), "Email already registered");

	assert_eq!(mocks.users.writes(), writes);
	assert!(mocks.stored_images().is_empty());
}

/// Misses every email lookup, as a concurrent create that lands between the
/// lookup and the insert would.
struct StaleEmailLookup(Arc<MemoryRepository<User>>);

#[async_trait::async_trait]
impl Repository<User> for StaleEmailLookup {
	async fn list(&self) -> Result<Vec<User>, RepositoryError> {
		self.0.list().await
	}

	async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
		self.0.find_by_id(id).await
	}

	async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, RepositoryError> {
		self.0.find_by_ids(ids).await
	}

	async fn create(&self, record: User) -> Result<User, RepositoryError> {
		self.0.create(record).await
	}

	async fn save(&self, record: User) -> Result<User, RepositoryError> {
		self.0.save(record).await
	}

	async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
		self.0.delete(id).await
	}
}

#[async_trait::async_trait]
impl UserRepository for StaleEmailLookup {
	async fn find_by_email(&self, _: &str) -> Result<Option<User>, RepositoryError> {
		Ok(None)
	}
}

#[tokio::test]
async fn test_duplicate_email_from_unique_index() {
	let mocks = Mocks::new();
	let users = UserLifecycle::new(
		Arc::new(StaleEmailLookup(mocks.users.clone())),
		mocks.image_store(),
		ImageFailurePolicy::default(),
	);

	register(&users, input("Ada", "ada@campus.edu")).await;
	let writes = mocks.users.writes();

	let mut duplicate = input("Other Ada", "ada@campus.edu");
	duplicate.profile_image = png(b"face");

	let err = users.create(duplicate).await.expect_err("email is taken");
	assert!(matches!(err, LifecycleError::Conflict("Email already registered")), "{err:?}");

	assert_eq!(mocks.users.writes(), writes);
	assert!(mocks.stored_images().is_empty());
	assert_eq!(mocks.users.rows().len(), 1);
}

#[tokio::test]
async fn test_duplicate_phone_is_a_conflict() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let mut first = input("Ada", "ada@campus.edu");
	first.phone = Some("255712345678".to_string());
	register(&users, first).await;

	let mut second = input("Grace", "grace@campus.edu");
	second.phone = Some("255712345678".to_string());

	let err = users.create(second).await.expect_err("phone is taken");
	assert!(matches!(err, LifecycleError::Conflict("Phone already registered")), "{err:?}");
}

#[tokio::test]
async fn test_create_with_profile_image() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let mut with_image = input("Ada", "ada@campus.edu");
	with_image.profile_image = png(b"face");

	let view = match users.create(with_image).await.expect("failed to create") {
		Registration::Created(view) => view,
		other => panic!("unexpected result: {other:?}"),
	};

	let path = view.profile_image.expect("image path stored");
	assert!(path.ends_with(&format!("profile-picture-UID{}.png", view.id)), "{path}");
	assert_eq!(std::fs::read(&path).unwrap(), b"face");

	let stored = mocks.users.find_by_id(view.id).await.unwrap().unwrap();
	assert_eq!(stored.profile_image.as_deref(), Some(path.as_str()));
}

#[tokio::test]
async fn test_create_with_broken_image_is_partial() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let mut broken = input("Ada", "ada@campus.edu");
	broken.profile_image = "data:image/png;base64,%%%".to_string();

	let partial = match users.create(broken).await.expect("user is still created") {
		Registration::Partial(partial) => partial,
		other => panic!("unexpected result: {other:?}"),
	};

	assert!(
		partial.error.starts_with("User created but failed to save profile image:"),
		"{}",
		partial.error
	);
	assert_eq!(partial.email, "ada@campus.edu");

	let stored = mocks.users.find_by_id(partial.id).await.unwrap().expect("user exists");
	assert_eq!(stored.profile_image, None);
}

#[tokio::test]
async fn test_update_replaces_image() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let mut with_image = input("Ada", "ada@campus.edu");
	with_image.profile_image = png(b"old face");
	let id = register(&users, with_image).await;
	let old_path = mocks.users.find_by_id(id).await.unwrap().unwrap().profile_image.unwrap();

	let mut change = input("Ada Lovelace", "ada@campus.edu");
	change.password.clear();
	change.profile_image = jpeg(b"new face");

	let updated = users.update(id, change).await.expect("failed to update");

	assert_eq!(updated.warning, None);
	assert_eq!(updated.inner.name, "Ada Lovelace");

	let new_path = updated.inner.profile_image.expect("image path stored");
	assert!(!Path::new(&old_path).exists(), "old image is reclaimed");
	assert_eq!(std::fs::read(&new_path).unwrap(), b"new face");
	assert_eq!(mocks.stored_images(), vec![format!("profile-picture-UID{id}.jpeg")]);

	// An empty password keeps the current one.
	let login = users
		.login(LoginInput {
			email: "ada@campus.edu".to_string(),
			password: "correct horse".to_string(),
		})
		.await
		.expect("password unchanged");
	assert_eq!(login.user.name, "Ada Lovelace");
}

#[tokio::test]
async fn test_update_warns_when_old_image_is_gone() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let mut with_image = input("Ada", "ada@campus.edu");
	with_image.profile_image = png(b"old face");
	let id = register(&users, with_image).await;

	let old_path = mocks.users.find_by_id(id).await.unwrap().unwrap().profile_image.unwrap();
	std::fs::remove_file(&old_path).unwrap();

	let mut change = input("Ada", "ada@campus.edu");
	change.profile_image = jpeg(b"new face");

	let updated = users.update(id, change).await.expect("update still succeeds");

	let warning = updated.warning.expect("warning reported");
	assert!(warning.starts_with("Failed to delete old profile image:"), "{warning}");
	assert!(updated.inner.profile_image.unwrap().ends_with(".jpeg"));
}

#[tokio::test]
async fn test_update_rehashes_password() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let id = register(&users, input("Ada", "ada@campus.edu")).await;

	let mut change = input("Ada", "ada@campus.edu");
	change.password = "battery staple".to_string();
	users.update(id, change).await.expect("failed to update");

	let login = |password: &str| LoginInput {
		email: "ada@campus.edu".to_string(),
		password: password.to_string(),
	};

	assert!(matches!(
		users.login(login("correct horse")).await,
		Err(LifecycleError::Unauthorized)
	));
	users.login(login("battery staple")).await.expect("new password works");
}

#[tokio::test]
async fn test_update_rejects_taken_email() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	register(&users, input("Ada", "ada@campus.edu")).await;
	let id = register(&users, input("Grace", "grace@campus.edu")).await;
	let writes = mocks.users.writes();

	let err = users
		.update(id, input("Grace", "ada@campus.edu"))
		.await
		.expect_err("email belongs to someone else");

	assert!(matches!(err, LifecycleError::Conflict(_)), "{err:?}");
	assert_eq!(mocks.users.writes(), writes);
}

#[tokio::test]
async fn test_update_unknown_user() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let err = users.update(404, input("Ada", "ada@campus.edu")).await.expect_err("no such user");
	assert!(matches!(err, LifecycleError::NotFound("User")), "{err:?}");
	assert_eq!(err.to_string(), "User not found");
}

#[tokio::test]
async fn test_delete_reclaims_image() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let mut with_image = input("Ada", "ada@campus.edu");
	with_image.profile_image = png(b"face");
	let id = register(&users, with_image).await;

	let res = users.delete(id).await.expect("failed to delete");
	assert_eq!(res.message, "User deleted successfully");
	assert_eq!(res.warning, None);

	assert!(mocks.stored_images().is_empty());
	assert!(matches!(users.get(id).await, Err(LifecycleError::NotFound(_))));

	// Soft deleted, the row is retained.
	assert!(mocks.users.rows().iter().any(|u| u.meta.id == id && u.meta.deleted_at.is_some()));
}

async fn delete_with_missing_image(policy: ImageFailurePolicy) -> (Mocks, UserLifecycle, i64) {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, policy);

	let mut with_image = input("Ada", "ada@campus.edu");
	with_image.profile_image = png(b"face");
	let id = register(&users, with_image).await;

	for name in mocks.stored_images() {
		std::fs::remove_file(mocks.images.path().join(name)).unwrap();
	}

	let res = users.delete(id).await.expect("delete reports success");
	assert_eq!(res.message, "User deleted successfully");
	let warning = res.warning.expect("warning reported");
	assert!(warning.starts_with("Failed to delete profile image:"), "{warning}");

	(mocks, users, id)
}

#[tokio::test]
async fn test_delete_keeps_record_when_image_delete_fails() {
	let (_mocks, users, id) = delete_with_missing_image(ImageFailurePolicy::KeepRecord).await;

	users.get(id).await.expect("record is kept");
}

#[tokio::test]
async fn test_delete_record_policy_proceeds() {
	let (_mocks, users, id) = delete_with_missing_image(ImageFailurePolicy::DeleteRecord).await;

	assert!(matches!(users.get(id).await, Err(LifecycleError::NotFound(_))));
}

#[tokio::test]
async fn test_login() {
	let mocks = Mocks::new();
	let users = lifecycle(&mocks, ImageFailurePolicy::default());

	let id = register(&users, input("Ada", "ada@campus.edu")).await;

	let view = users
		.login(LoginInput {
			email: "ada@campus.edu".to_string(),
			password: "correct horse".to_string(),
		})
		.await
		.expect("valid credentials");

	assert_eq!(view.message, "Login successful");
	assert_eq!(view.user.id, id);
	assert_eq!(view.user.course, "CS");
	assert_eq!(view.user.year, "2");

	for (email, password) in [("ada@campus.edu", "wrong"), ("nobody@campus.edu", "correct horse")] {
		let err = users
			.login(LoginInput {
				email: email.to_string(),
				password: password.to_string(),
			})
			.await
			.expect_err("invalid credentials");
		assert!(matches!(err, LifecycleError::Unauthorized), "{err:?}");
	}

	let err = users.login(LoginInput::default()).await.expect_err("nothing supplied");
	assert!(matches!(err, LifecycleError::Validation(_)), "{err:?}");
}

#[derive(Default)]
struct RecordingNotifier {
	sent: Mutex<Vec<(String, Vec<String>)>>,
	fail: bool,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
	async fn send(&self, message: &str, recipients: &[String]) -> Result<(), NotificationError> {
		self.sent
			.lock()
			.unwrap()
			.push((message.to_string(), recipients.to_vec()));

		match self.fail {
			true => Err(NotificationError::MissingToken),
			false => Ok(()),
		}
	}
}

#[tokio::test]
async fn test_registration_sms() {
	let mocks = Mocks::new();
	let notifier = Arc::new(RecordingNotifier::default());
	let users = lifecycle(&mocks, ImageFailurePolicy::default()).with_welcome(Welcome {
		notifier: notifier.clone(),
		message: "Karibu {name}!".to_string(),
	});

	let mut with_phone = input("Ada", "ada@campus.edu");
	with_phone.phone = Some("255712345678".to_string());
	register(&users, with_phone).await;

	// No phone, no message.
	register(&users, input("Grace", "grace@campus.edu")).await;

	let sent = notifier.sent.lock().unwrap().clone();
	assert_eq!(sent, vec![("Karibu Ada!".to_string(), vec!["255712345678".to_string()])]);
}

#[tokio::test]
async fn test_registration_sms_failure_is_ignored() {
	let mocks = Mocks::new();
	let notifier = Arc::new(RecordingNotifier {
		fail: true,
		..Default::default()
	});
	let users = lifecycle(&mocks, ImageFailurePolicy::default()).with_welcome(Welcome {
		notifier: notifier.clone(),
		message: "Karibu {name}!".to_string(),
	});

	let mut with_phone = input("Ada", "ada@campus.edu");
	with_phone.phone = Some("255712345678".to_string());
	register(&users, with_phone).await;

	assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}
