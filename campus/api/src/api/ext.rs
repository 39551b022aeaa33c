use std::sync::Arc;

use common::http::ext::{RequestGlobalExt, ResultExt};
use common::http::RouteError;
use common::make_response;
use hyper::{Body, Request, Response, StatusCode};
use routerify::ext::RequestExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::Result;
use crate::global::GlobalState;

pub fn global_state(req: &Request<Body>) -> Result<Arc<GlobalState>> {
	req.get_global::<GlobalState>()
}

/// Reads the request body as JSON. Malformed input is a client error.
pub async fn json_body<T: DeserializeOwned>(req: &mut Request<Body>) -> Result<T> {
	let body = hyper::body::to_bytes(req.body_mut())
		.await
		.map_err_route((StatusCode::BAD_REQUEST, "Invalid input: failed to read body"))?;

	serde_json::from_slice(&body).map_err(|err| {
		let message = format!("Invalid input: {err}");
		RouteError::from((StatusCode::BAD_REQUEST, message, err))
	})
}

/// Parses the `:id` route parameter, `entity` names it in the error.
pub fn id_param(req: &Request<Body>, entity: &str) -> Result<i64> {
	req.param("id")
		.and_then(|id| id.parse().ok())
		.ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Invalid {} ID", entity.to_lowercase())).into())
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<Body>> {
	let body = serde_json::to_string(body).map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to serialize response"))?;

	Ok(make_response!(status, body))
}
