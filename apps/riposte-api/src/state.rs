use std::sync::{Arc, atomic::AtomicU64};

use riposte_service::{ChatService, Collaborators};

/// Process-local request counters, exposed on `GET /metrics` in Prometheus
/// text format.
#[derive(Default)]
pub struct Metrics {
	pub chat_requests_total: AtomicU64,
	pub chat_errors_total: AtomicU64,
}

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ChatService>,
	pub metrics: Arc<Metrics>,
}
impl AppState {
	pub fn new(config: riposte_config::Config) -> color_eyre::Result<Self> {
		let collaborators = Collaborators::from_config(&config)?;
		let service = ChatService::new(config, collaborators);

		Ok(Self::with_service(Arc::new(service)))
	}

	pub fn with_service(service: Arc<ChatService>) -> Self {
		Self { service, metrics: Arc::new(Metrics::default()) }
	}
}
