use common::http::RouteError;
use hyper::StatusCode;

use crate::image_store::ImageError;
use crate::lifecycle::LifecycleError;

pub type Result<T, E = RouteError<ApiError>> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
	#[error("failed to parse http body: {0}")]
	ParseHttpBody(#[from] hyper::Error),
	#[error("failed to (de)serialize json: {0}")]
	Json(#[from] serde_json::Error),
	#[error(transparent)]
	Lifecycle(#[from] LifecycleError),
	#[error("image error: {0}")]
	Image(#[from] ImageError),
}

impl LifecycleError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(_) | Self::MissingReference { .. } | Self::Conflict(_) => StatusCode::BAD_REQUEST,
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::Unauthorized => StatusCode::UNAUTHORIZED,
			Self::Asset { .. } | Self::Credential(_) | Self::Dependency { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<LifecycleError> for RouteError<ApiError> {
	#[track_caller]
	fn from(err: LifecycleError) -> Self {
		let status = err.status();
		let message = err.to_string();

		RouteError::from((status, message, err))
	}
}
