use std::{convert::Infallible, net::SocketAddr, sync::atomic::Ordering};

use axum::{
	Json, Router,
	extract::{ConnectInfo, FromRequestParts, Request, State},
	http::{
		HeaderName, HeaderValue, Method, StatusCode,
		header::{AUTHORIZATION, CONTENT_TYPE},
		request::Parts,
	},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::state::AppState;
use riposte_service::{ChatRequest, ChatResponse, RequestIdentity, ServiceError};

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

pub fn router(state: AppState) -> Router {
	let cors = cors_layer(&state.service.cfg.security.allowed_origins);

	Router::new()
		.route("/api/chat", post(chat))
		.route("/v1/chat", post(chat))
		.route("/healthz", get(healthz))
		.route("/metrics", get(metrics))
		.layer(cors)
		.layer(middleware::from_fn(decorate_response))
		.with_state(state)
}

async fn healthz() -> StatusCode {
	StatusCode::OK
}

async fn chat(
	State(state): State<AppState>,
	CallerIdentity(identity): CallerIdentity,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	state.metrics.chat_requests_total.fetch_add(1, Ordering::Relaxed);

	let result = state.service.chat(payload, identity).await;

	if result.is_err() {
		state.metrics.chat_errors_total.fetch_add(1, Ordering::Relaxed);
	}

	Ok(Json(result?))
}

async fn metrics(State(state): State<AppState>) -> Response {
	use std::fmt::Write as _;

	let requests = state.metrics.chat_requests_total.load(Ordering::Relaxed);
	let errors = state.metrics.chat_errors_total.load(Ordering::Relaxed);
	let mut buf = String::new();

	writeln!(&mut buf, "# HELP riposte_chat_requests_total Chat requests received.").ok();
	writeln!(&mut buf, "# TYPE riposte_chat_requests_total counter").ok();
	writeln!(&mut buf, "riposte_chat_requests_total {requests}").ok();
	writeln!(&mut buf, "# HELP riposte_chat_errors_total Chat requests that ended in an error.")
		.ok();
	writeln!(&mut buf, "# TYPE riposte_chat_errors_total counter").ok();
	writeln!(&mut buf, "riposte_chat_errors_total {errors}").ok();

	([(CONTENT_TYPE, "text/plain; version=0.0.4")], buf).into_response()
}

/// Caller credentials, pulled from the Authorization bearer token (or the
/// X-Api-Key fallback) and the connection's peer address. Never rejects;
/// missing pieces surface later as access or rate-limit decisions.
pub struct CallerIdentity(pub RequestIdentity);

impl<S> FromRequestParts<S> for CallerIdentity
where
	S: Send + Sync,
{
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let api_key = parts
			.headers
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "))
			.or_else(|| {
				parts.headers.get(&API_KEY_HEADER).and_then(|value| value.to_str().ok())
			})
			.map(str::to_string);
		let remote_addr = parts
			.extensions
			.get::<ConnectInfo<SocketAddr>>()
			.map(|connect_info| connect_info.0.ip().to_string());

		Ok(Self(RequestIdentity { api_key, remote_addr }))
	}
}

/// Stamps every response with a correlation id (echoed from the request
/// when present) and the standard security headers.
async fn decorate_response(request: Request, next: Next) -> Response {
	let request_id = request
		.headers()
		.get(&REQUEST_ID)
		.and_then(|value| value.to_str().ok())
		.map(str::to_string)
		.unwrap_or_else(|| Uuid::new_v4().to_string());
	let mut response = next.run(request).await;
	let headers = response.headers_mut();

	if let Ok(value) = HeaderValue::from_str(&request_id) {
		headers.insert(REQUEST_ID, value);
	}

	headers.insert(
		"strict-transport-security",
		HeaderValue::from_static("max-age=63072000; includeSubDomains"),
	);
	headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
	headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
	headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
	headers.insert("content-security-policy", HeaderValue::from_static("default-src 'none'"));

	response
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
	let layer = CorsLayer::new()
		.allow_methods([Method::GET, Method::POST])
		.allow_headers([CONTENT_TYPE, AUTHORIZATION, API_KEY_HEADER, REQUEST_ID]);

	if allowed_origins.iter().any(|origin| origin == "*") {
		layer.allow_origin(Any)
	} else {
		layer.allow_origin(
			allowed_origins
				.iter()
				.filter_map(|origin| origin.parse::<HeaderValue>().ok())
				.collect::<Vec<_>>(),
		)
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let status = match err {
			ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
			ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
			ServiceError::Throttled => StatusCode::TOO_MANY_REQUESTS,
			// Domain failures keep the widget-facing 200 envelope; the body
			// carries the error message instead of an answer.
			_ => StatusCode::OK,
		};

		Self { status, message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorBody { error: self.message })).into_response()
	}
}
