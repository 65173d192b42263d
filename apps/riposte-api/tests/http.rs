use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use tower::util::ServiceExt;

use riposte_api::{routes, state::AppState};
use riposte_domain::Variant;
use riposte_service::{ChatService, Collaborators};
use riposte_testkit::{StubGenerator, StubStore, TestTenants, sample_profile, test_config};

const ANSWER: &str = "Nous intervenons rapidement pour votre tournage. Contactez-nous pour un \
                      devis détaillé.";

fn app(tenants: &TestTenants, mutate: impl FnOnce(&mut riposte_config::Config)) -> Router {
	let mut cfg = test_config(tenants.roots());

	mutate(&mut cfg);

	let collaborators = Collaborators {
		generator: Arc::new(StubGenerator::replying(ANSWER)),
		store: Arc::new(StubStore::new()),
	};
	let state = AppState::with_service(Arc::new(ChatService::new(cfg, collaborators)));

	routes::router(state)
}

fn chat_request(uri: &str, payload: serde_json::Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse response body.")
}

#[tokio::test]
async fn healthz_carries_request_id_and_security_headers() {
	let tenants = TestTenants::new();
	let app = app(&tenants, |_| {});
	let response = app
		.oneshot(
			Request::builder()
				.uri("/healthz")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /healthz.");

	assert_eq!(response.status(), StatusCode::OK);

	let headers = response.headers();

	assert!(headers.contains_key("x-request-id"));
	assert_eq!(headers["x-content-type-options"], "nosniff");
	assert_eq!(headers["x-frame-options"], "DENY");
	assert_eq!(headers["referrer-policy"], "no-referrer");
	assert!(headers.contains_key("strict-transport-security"));
	assert!(headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn provided_request_id_is_echoed() {
	let tenants = TestTenants::new();
	let app = app(&tenants, |_| {});
	let response = app
		.oneshot(
			Request::builder()
				.uri("/healthz")
				.header("x-request-id", "trace-me-7")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /healthz.");

	assert_eq!(response.headers()["x-request-id"], "trace-me-7");
}

#[tokio::test]
async fn chat_returns_the_success_envelope() {
	let tenants = TestTenants::new();

	tenants.write_profile(Variant::Primary, "bms_ventouse", &sample_profile("BMS Ventouse"));

	let app = app(&tenants, |_| {});
	let response = app
		.oneshot(chat_request("/api/chat", serde_json::json!({ "question": "Bonjour" })))
		.await
		.expect("Failed to call /api/chat.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["tenant_id"], "bms_ventouse");
	assert_eq!(json["variant"], "primary");
	assert_eq!(json["provider"], "stub-generator");
	assert_eq!(json["response"], ANSWER);
	assert!(json.get("error").is_none());
}

#[tokio::test]
async fn versioned_alias_serves_the_same_endpoint() {
	let tenants = TestTenants::new();

	tenants.write_profile(Variant::Primary, "bms_ventouse", &sample_profile("BMS Ventouse"));

	let app = app(&tenants, |_| {});
	let response = app
		.oneshot(chat_request("/v1/chat", serde_json::json!({ "question": "Bonjour" })))
		.await
		.expect("Failed to call /v1/chat.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["response"], ANSWER);
}

#[tokio::test]
async fn missing_profile_yields_an_error_envelope_not_a_failure_status() {
	let tenants = TestTenants::new();
	let app = app(&tenants, |_| {});
	let response = app
		.oneshot(chat_request("/api/chat", serde_json::json!({ "question": "Bonjour" })))
		.await
		.expect("Failed to call /api/chat.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert!(json["error"].as_str().expect("Error message expected.").contains("not found"));
}

#[tokio::test]
async fn unknown_variant_yields_an_error_envelope() {
	let tenants = TestTenants::new();
	let app = app(&tenants, |_| {});
	let response = app
		.oneshot(chat_request(
			"/api/chat",
			serde_json::json!({ "question": "Bonjour", "variant": "tertiary" }),
		))
		.await
		.expect("Failed to call /api/chat.");

	assert_eq!(response.status(), StatusCode::OK);
	assert!(json_body(response).await["error"].as_str().is_some());
}

#[tokio::test]
async fn missing_key_is_unauthorized_when_keys_are_configured() {
	let tenants = TestTenants::new();

	tenants.write_profile(Variant::Primary, "bms_ventouse", &sample_profile("BMS Ventouse"));

	let app = app(&tenants, |cfg| cfg.security.api_keys = vec!["secret".to_string()]);
	let response = app
		.clone()
		.oneshot(chat_request("/api/chat", serde_json::json!({ "question": "Bonjour" })))
		.await
		.expect("Failed to call /api/chat.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	let authorized = app
		.oneshot({
			let mut request =
				chat_request("/api/chat", serde_json::json!({ "question": "Bonjour" }));

			request
				.headers_mut()
				.insert("authorization", "Bearer secret".parse().expect("Header value."));

			request
		})
		.await
		.expect("Failed to call /api/chat.");

	assert_eq!(authorized.status(), StatusCode::OK);
}

#[tokio::test]
async fn scoped_key_is_forbidden_outside_its_tenants() {
	let tenants = TestTenants::new();

	tenants.write_profile(Variant::Primary, "bms_ventouse", &sample_profile("BMS Ventouse"));

	let app = app(&tenants, |cfg| {
		cfg.security.api_keys = vec!["secret".to_string()];
		cfg.security.key_scopes.insert("secret".to_string(), vec!["other_tenant".to_string()]);
	});
	let mut request = chat_request("/api/chat", serde_json::json!({ "question": "Bonjour" }));

	request.headers_mut().insert("x-api-key", "secret".parse().expect("Header value."));

	let response = app.oneshot(request).await.expect("Failed to call /api/chat.");

	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn metrics_expose_request_and_error_counters() {
	let tenants = TestTenants::new();

	tenants.write_profile(Variant::Primary, "bms_ventouse", &sample_profile("BMS Ventouse"));

	let app = app(&tenants, |_| {});

	app.clone()
		.oneshot(chat_request("/api/chat", serde_json::json!({ "question": "Bonjour" })))
		.await
		.expect("Failed to call /api/chat.");
	app.clone()
		.oneshot(chat_request(
			"/api/chat",
			serde_json::json!({ "question": "Bonjour", "variant": "tertiary" }),
		))
		.await
		.expect("Failed to call /api/chat.");

	let response = app
		.oneshot(
			Request::builder()
				.uri("/metrics")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /metrics.");

	assert_eq!(response.status(), StatusCode::OK);

	let content_type = response.headers()["content-type"].to_str().expect("Header value.");

	assert!(content_type.starts_with("text/plain"));

	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let text = String::from_utf8(bytes.to_vec()).expect("Metrics must be UTF-8.");

	assert!(text.contains("# TYPE riposte_chat_requests_total counter"));
	assert!(text.contains("riposte_chat_requests_total 2"));
	assert!(text.contains("riposte_chat_errors_total 1"));
}

#[tokio::test]
async fn throttled_callers_get_429() {
	let tenants = TestTenants::new();

	tenants.write_profile(Variant::Primary, "bms_ventouse", &sample_profile("BMS Ventouse"));

	let app = app(&tenants, |cfg| cfg.security.rate_limit.max_requests = 1);
	let first = app
		.clone()
		.oneshot(chat_request("/api/chat", serde_json::json!({ "question": "Bonjour" })))
		.await
		.expect("Failed to call /api/chat.");

	assert_eq!(first.status(), StatusCode::OK);

	let second = app
		.oneshot(chat_request("/api/chat", serde_json::json!({ "question": "Bonjour" })))
		.await
		.expect("Failed to call /api/chat.");

	assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}
