use std::sync::Arc;

use common::http::RouteError;
use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;

use super::error::{ApiError, Result};
use super::ext::{global_state, id_param, json_body, json_response};
use crate::global::GlobalState;
use crate::lifecycle::{LoginInput, Registration, UserInput};

async fn register(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let input: UserInput = json_body(&mut req).await?;

	match global.users.create(input).await? {
		Registration::Created(view) => json_response(StatusCode::CREATED, &view),
		Registration::Partial(partial) => json_response(StatusCode::INTERNAL_SERVER_ERROR, &partial),
	}
}

async fn login(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let input: LoginInput = json_body(&mut req).await?;

	json_response(StatusCode::OK, &global.users.login(input).await?)
}

async fn list(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;

	json_response(StatusCode::OK, &global.users.list().await?)
}

async fn get(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let id = id_param(&req, "user")?;

	json_response(StatusCode::OK, &global.users.get(id).await?)
}

async fn update(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let id = id_param(&req, "user")?;
	let input: UserInput = json_body(&mut req).await?;

	json_response(StatusCode::OK, &global.users.update(id, input).await?)
}

async fn delete(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let id = id_param(&req, "user")?;

	json_response(StatusCode::OK, &global.users.delete(id).await?)
}

pub fn routes(_: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
	Router::builder()
		.post("/api/user/register", register)
		.post("/api/user/login", login)
		.get("/api/users", list)
		.get("/api/users/:id", get)
		.put("/api/users/:id/update", update)
		.delete("/api/users/:id/delete", delete)
		.build()
		.expect("failed to build router")
}
