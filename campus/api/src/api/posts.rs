use std::sync::Arc;

use common::http::RouteError;
use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;

use super::error::{ApiError, Result};
use super::ext::{global_state, id_param, json_body, json_response};
use crate::global::GlobalState;
use crate::lifecycle::PostInput;

async fn list(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;

	json_response(StatusCode::OK, &global.posts.list().await?)
}

async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let input: PostInput = json_body(&mut req).await?;

	json_response(StatusCode::CREATED, &global.posts.create(input).await?)
}

async fn get(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let id = id_param(&req, "post")?;

	json_response(StatusCode::OK, &global.posts.get(id).await?)
}

async fn update(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let id = id_param(&req, "post")?;
	let input: PostInput = json_body(&mut req).await?;

	json_response(StatusCode::OK, &global.posts.update(id, input).await?)
}

async fn delete(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let id = id_param(&req, "post")?;

	json_response(StatusCode::OK, &global.posts.delete(id).await?)
}

pub fn routes(_: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
	Router::builder()
		.get("/api/posts", list)
		.post("/api/posts", create)
		.get("/api/posts/:id", get)
		.put("/api/posts/:id/update", update)
		.delete("/api/posts/:id/delete", delete)
		.build()
		.expect("failed to build router")
}
