use std::sync::Arc;

use common::http::RouteError;
use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;

use super::error::{ApiError, Result};
use super::ext::{global_state, id_param, json_body, json_response};
use crate::database::{Event, Job, Timetable};
use crate::global::GlobalState;
use crate::lifecycle::{RecordLifecycle, Replaceable};

/// A record type served with plain CRUD routes under `/api/<table>`.
pub trait Resource: Replaceable {
	fn lifecycle(global: &GlobalState) -> &RecordLifecycle<Self>;
}

impl Resource for Job {
	fn lifecycle(global: &GlobalState) -> &RecordLifecycle<Self> {
		&global.jobs
	}
}

impl Resource for Event {
	fn lifecycle(global: &GlobalState) -> &RecordLifecycle<Self> {
		&global.events
	}
}

impl Resource for Timetable {
	fn lifecycle(global: &GlobalState) -> &RecordLifecycle<Self> {
		&global.timetables
	}
}

async fn list<R: Resource>(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;

	json_response(StatusCode::OK, &R::lifecycle(&global).list().await?)
}

async fn create<R: Resource>(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let input: R::Input = json_body(&mut req).await?;

	json_response(StatusCode::CREATED, &R::lifecycle(&global).create(input).await?)
}

async fn get<R: Resource>(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let id = id_param(&req, R::ENTITY)?;

	json_response(StatusCode::OK, &R::lifecycle(&global).get(id).await?)
}

async fn update<R: Resource>(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let id = id_param(&req, R::ENTITY)?;
	let input: R::Input = json_body(&mut req).await?;

	json_response(StatusCode::OK, &R::lifecycle(&global).update(id, input).await?)
}

async fn delete<R: Resource>(req: Request<Body>) -> Result<Response<Body>> {
	let global = global_state(&req)?;
	let id = id_param(&req, R::ENTITY)?;

	json_response(StatusCode::OK, &R::lifecycle(&global).delete(id).await?)
}

pub fn routes<R: Resource>(_: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
	let base = format!("/api/{}", R::TABLE);

	Router::builder()
		.get(base.as_str(), list::<R>)
		.post(base.as_str(), create::<R>)
		.get(format!("{base}/:id"), get::<R>)
		.put(format!("{base}/:id/update"), update::<R>)
		.delete(format!("{base}/:id/delete"), delete::<R>)
		.build()
		.expect("failed to build router")
}
