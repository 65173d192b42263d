use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub retrieval: Retrieval,
	pub providers: Providers,
	pub security: Security,
	#[serde(default)]
	pub limits: Limits,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Deployment profile, either "development" or "production". Production
	/// refuses to start without API keys and with wildcard origins.
	pub profile: String,
	pub default_tenant: String,
}
impl Service {
	pub fn is_production(&self) -> bool {
		self.profile == "production"
	}
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
	pub tenants: TenantRoots,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection_prefix: String,
	pub vector_dim: u32,
}

/// Per-variant tenant profile root directories. The two variants never share
/// a directory or a collection.
#[derive(Debug, Deserialize)]
pub struct TenantRoots {
	pub primary_dir: PathBuf,
	pub secondary_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	pub top_k: u32,
	pub score_threshold: f32,
	pub max_context_snippets: u32,
	pub chunk_max_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generator: GeneratorConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratorConfig {
	pub provider_id: String,
	/// Wire shape of the backend, either "chat" (messages array) or
	/// "completion" (single prompt string).
	pub kind: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	#[serde(default)]
	pub api_keys: Vec<String>,
	/// Optional per-key tenant allow-list. A key absent from this map may
	/// address any tenant.
	#[serde(default)]
	pub key_scopes: HashMap<String, Vec<String>>,
	pub allowed_origins: Vec<String>,
	pub rate_limit: RateLimit,
}

#[derive(Debug, Deserialize)]
pub struct RateLimit {
	pub window_secs: u64,
	pub max_requests: u32,
	/// Identity the buckets are keyed on, either "ip" or "api_key".
	pub identity: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Limits {
	pub max_question_chars: u32,
	pub min_answer_chars: u32,
}
impl Default for Limits {
	fn default() -> Self {
		Self { max_question_chars: 2_000, min_answer_chars: 25 }
	}
}
