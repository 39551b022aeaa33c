use std::sync::Arc;

use common::http::RouteError;
use common::make_response;
use hyper::server::conn::Http;
use hyper::{Body, Request, Response, StatusCode};
use routerify::{RequestServiceBuilder, Router};
use tokio::net::TcpSocket;
use tokio::select;

use self::error::{ApiError, Result};
use crate::database::{Event, Job, Timetable};
use crate::global::GlobalState;

pub mod error;
mod ext;
mod images;
mod middleware;
mod posts;
mod records;
mod users;

async fn preflight(_: Request<Body>) -> Result<Response<Body>> {
	Ok(Response::builder()
		.status(StatusCode::NO_CONTENT)
		.body(Body::empty())
		.expect("failed to build response"))
}

async fn not_found(_: Request<Body>) -> Result<Response<Body>> {
	Ok(make_response!(StatusCode::NOT_FOUND, common::http::error_body("Not found")))
}

pub fn routes(global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
	let weak = Arc::downgrade(global);
	Router::builder()
		.data(weak)
		// Adds the CORS headers to every response, errors included
		.middleware(middleware::cors::cors_middleware(global))
		.options("/*", preflight)
		.scope("/", users::routes(global))
		.scope("/", posts::routes(global))
		.scope("/", records::routes::<Job>(global))
		.scope("/", records::routes::<Event>(global))
		.scope("/", records::routes::<Timetable>(global))
		.scope("/", images::routes(global))
		.any(not_found)
		.err_handler_with_info(common::http::error_handler::<ApiError>)
		.build()
		.expect("failed to build router")
}

pub async fn run(global: Arc<GlobalState>) -> anyhow::Result<()> {
	let config = &global.config.api;

	tracing::info!("Listening on {}", config.bind_address);
	let socket = if config.bind_address.is_ipv6() {
		TcpSocket::new_v6()?
	} else {
		TcpSocket::new_v4()?
	};

	socket.set_reuseaddr(true)?;
	socket.bind(config.bind_address)?;
	let listener = socket.listen(1024)?;

	// Requests only hold a Weak reference to the global state, so open
	// keep-alive connections do not block shutdown.
	let request_service = RequestServiceBuilder::new(routes(&global)).expect("failed to build request service");

	loop {
		select! {
			_ = global.ctx.done() => {
				return Ok(());
			},
			r = listener.accept() => {
				let (socket, addr) = r?;

				let service = request_service.build(addr);

				tracing::debug!("Accepted connection from {}", addr);

				tokio::spawn(async move {
					Http::new().serve_connection(socket, service).await.ok();
				});
			},
		}
	}
}
