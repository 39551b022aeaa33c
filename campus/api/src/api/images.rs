use std::sync::Arc;

use common::http::RouteError;
use hyper::header;
use hyper::{Body, Request, Response, StatusCode};
use routerify::ext::RequestExt;
use routerify::Router;

use super::error::{ApiError, Result};
use super::ext::global_state;
use crate::global::GlobalState;
use crate::image_store::{content_type, ImageError};

/// Serves a stored image read-only.
async fn serve(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let file = req.param("file").cloned().unwrap_or_default();

	let bytes = match global.images.read(&file).await {
		Ok(bytes) => bytes,
		Err(err @ (ImageError::InvalidName(_) | ImageError::Read(_))) => {
			return Err((StatusCode::NOT_FOUND, "Image not found", err).into());
		}
		Err(err) => return Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to read image", err).into()),
	};

	Response::builder()
		.status(StatusCode::OK)
		.header(header::CONTENT_TYPE, content_type(&file))
		.body(Body::from(bytes))
		.map_err(|_| "failed to build response".into())
}

pub fn routes(_: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
	Router::builder()
		.get("/Images/:file", serve)
		.build()
		.expect("failed to build router")
}
