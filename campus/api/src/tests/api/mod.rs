use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use serial_test::serial;

use super::global::{mock_global_state, Mocks};
use super::lifecycle::png;
use crate::api;
use crate::config::{ApiConfig, AppConfig};
use crate::global::GlobalState;

struct Server {
	global: Arc<GlobalState>,
	handler: common::context::Handler,
	mocks: Mocks,
	handle: tokio::task::JoinHandle<anyhow::Result<()>>,
	url: String,
}

impl Server {
	async fn start() -> Self {
		let port = portpicker::pick_unused_port().expect("failed to pick port");
		let (global, handler, mocks) = mock_global_state(AppConfig {
			api: ApiConfig {
				bind_address: format!("127.0.0.1:{port}").parse().unwrap(),
			},
			..Default::default()
		})
		.await;

		let handle = tokio::spawn(api::run(global.clone()));

		// We need to wait for the server to start
		tokio::time::sleep(Duration::from_millis(300)).await;

		Self {
			global,
			handler,
			mocks,
			handle,
			url: format!("http://127.0.0.1:{port}"),
		}
	}

	async fn shutdown(self) {
		drop(self.global);

		tokio::time::timeout(Duration::from_secs(5), self.handler.cancel())
			.await
			.expect("failed to cancel context");

		tokio::time::timeout(Duration::from_secs(5), self.handle)
			.await
			.expect("failed to stop server")
			.expect("server panicked")
			.expect("server failed");
	}
}

async fn json(resp: reqwest::Response) -> Value {
	resp.json().await.expect("failed to read body")
}

#[serial]
#[tokio::test]
async fn test_serial_users() {
	let server = Server::start().await;
	let client = reqwest::Client::new();

	let resp = client
		.post(format!("{}/api/user/register", server.url))
		.json(&json!({
			"name": "Ada",
			"email": "ada@campus.edu",
			"password": "hunter2",
			"role": "student",
			"course": "CS",
			"year": "2",
		}))
		.send()
		.await
		.expect("failed to register");

	assert_eq!(resp.status(), StatusCode::CREATED);
	assert_eq!(
		resp.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
		Some("*")
	);
	let body = json(resp).await;
	assert_eq!(
		body,
		json!({"id": 1, "name": "Ada", "email": "ada@campus.edu", "role": "student", "profileImage": null})
	);

	let resp = client
		.post(format!("{}/api/user/login", server.url))
		.json(&json!({"email": "ada@campus.edu", "password": "wrong"}))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(json(resp).await, json!({"error": "Invalid credentials"}));

	let resp = client
		.post(format!("{}/api/user/login", server.url))
		.json(&json!({"Email": "ada@campus.edu", "Password": "hunter2"}))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	let body = json(resp).await;
	assert_eq!(body["message"], "Login successful");
	assert_eq!(body["user"]["course"], "CS");
	assert!(body["user"].get("Password").is_none());

	let resp = client.get(format!("{}/api/users", server.url)).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	let body = json(resp).await;
	assert_eq!(body[0]["Name"], "Ada");
	// Listings expose the stored record, hash included.
	let hash = body[0]["Password"].as_str().expect("stored hash");
	assert!(hash.starts_with("$argon2"), "{hash}");

	let resp = client.get(format!("{}/api/users/abc", server.url)).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json(resp).await, json!({"error": "Invalid user ID"}));

	let resp = client.get(format!("{}/api/users/42", server.url)).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);
	assert_eq!(json(resp).await, json!({"error": "User not found"}));

	let resp = client
		.post(format!("{}/api/user/register", server.url))
		.body("{not json")
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_posts_and_images() {
	let server = Server::start().await;
	let client = reqwest::Client::new();

	let resp = client
		.post(format!("{}/api/posts", server.url))
		.json(&json!({"title": "Orphan", "description": "", "userID": 9}))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json(resp).await, json!({"error": "Invalid UserID: User not found"}));

	let resp = client
		.post(format!("{}/api/user/register", server.url))
		.json(&json!({
			"name": "Grace",
			"email": "grace@campus.edu",
			"password": "hunter2",
			"profileImage": png(b"face"),
		}))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::CREATED);
	let user = json(resp).await;

	let resp = client
		.post(format!("{}/api/posts", server.url))
		.json(&json!({"title": "Welcome week", "description": "Join us", "userID": user["id"]}))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::CREATED);
	let post = json(resp).await;
	assert_eq!(post["title"], "Welcome week");
	assert_eq!(post["userID"], user["id"]);
	assert_eq!(post["user"]["name"], "Grace");
	assert_eq!(post["image"], Value::Null);

	let mut keys = post.as_object().expect("post is an object").keys().cloned().collect::<Vec<_>>();
	keys.sort();
	assert_eq!(
		keys,
		vec!["CreatedAt", "DeletedAt", "ID", "UpdatedAt", "description", "image", "title", "user", "userID"]
	);

	let file = server.mocks.stored_images().pop().expect("profile image stored");
	let resp = client.get(format!("{}/Images/{file}", server.url)).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(
		resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
		Some("image/png")
	);
	assert_eq!(resp.bytes().await.unwrap().as_ref(), b"face");

	let resp = client.get(format!("{}/Images/missing.png", server.url)).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_records() {
	let server = Server::start().await;
	let client = reqwest::Client::new();

	let resp = client
		.post(format!("{}/api/jobs", server.url))
		.json(&json!({
			"Title": "Lab assistant",
			"Description": "Help with labs",
			"Company": "Campus IT",
			"Link": "https://jobs.campus.edu/1",
		}))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::CREATED);
	let job = json(resp).await;
	let id = job["ID"].as_i64().expect("job id");

	let resp = client.get(format!("{}/api/jobs", server.url)).send().await.unwrap();
	assert_eq!(json(resp).await, json!([job]));

	let resp = client
		.post(format!("{}/api/events", server.url))
		.json(&json!({"Quarter": "Q1", "Month": "March", "Title": "Open day"}))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json(resp).await, json!({"error": "Invalid input: date is required"}));

	let resp = client
		.delete(format!("{}/api/jobs/{id}/delete", server.url))
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(json(resp).await, json!({"message": "Job deleted successfully"}));

	let resp = client.get(format!("{}/api/nothing", server.url)).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);
	assert_eq!(json(resp).await, json!({"error": "Not found"}));

	server.shutdown().await;
}
