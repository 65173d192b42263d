//! In-memory collaborator stubs and config fixtures for exercising the
//! service layer without a running Qdrant or generation backend.

use std::{
	env, fs,
	path::{Path, PathBuf},
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::{Map, json};
use uuid::Uuid;

use riposte_config::{
	Config, EmbeddingProviderConfig, GeneratorConfig, Limits, Providers, Qdrant, RateLimit,
	Retrieval, Security, Service, Storage, TenantRoots,
};
use riposte_domain::Variant;
use riposte_index::{IndexDocument, Snippet};
use riposte_service::{BoxFuture, DocumentStore, TextGenerator};

/// Scripted [`DocumentStore`]: returns canned snippets, tracks call counts,
/// and optionally delays or fails to model a slow or broken backend.
#[derive(Default)]
pub struct StubStore {
	snippets: Vec<Snippet>,
	initial_count: u64,
	build_delay: Option<Duration>,
	fail_query: bool,
	pub count_calls: AtomicUsize,
	pub populate_calls: AtomicUsize,
	pub query_calls: AtomicUsize,
	pub populated: Mutex<Vec<IndexDocument>>,
	pub deleted: Mutex<Vec<String>>,
}
impl StubStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_snippets(mut self, snippets: Vec<(&str, &str, f32)>) -> Self {
		self.snippets = snippets
			.into_iter()
			.map(|(content, kind, score)| Snippet {
				content: content.to_string(),
				kind: kind.to_string(),
				score,
			})
			.collect();

		self
	}

	/// Pretend the collection already holds this many points, so builds skip
	/// population.
	pub fn with_initial_count(mut self, count: u64) -> Self {
		self.initial_count = count;

		self
	}

	/// Stalls every `count` call, widening the race window for concurrent
	/// build tests.
	pub fn with_build_delay(mut self, delay: Duration) -> Self {
		self.build_delay = Some(delay);

		self
	}

	pub fn with_failing_query(mut self) -> Self {
		self.fail_query = true;

		self
	}
}
impl DocumentStore for StubStore {
	fn collection_name(&self, variant: Variant, tenant_id: &str) -> String {
		format!("test_{}_{}", variant.as_str(), tenant_id)
	}

	fn query<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_collection: &'a str,
		_text: &'a str,
		top_k: u32,
		score_threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Snippet>>> {
		Box::pin(async move {
			self.query_calls.fetch_add(1, Ordering::SeqCst);

			if self.fail_query {
				return Err(color_eyre::eyre::eyre!("Scripted query failure."));
			}

			Ok(self
				.snippets
				.iter()
				.filter(|snippet| snippet.score >= score_threshold)
				.take(top_k as usize)
				.cloned()
				.collect())
		})
	}

	fn populate<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_collection: &'a str,
		documents: &'a [IndexDocument],
	) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(async move {
			self.populate_calls.fetch_add(1, Ordering::SeqCst);
			self.populated
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.extend_from_slice(documents);

			Ok(documents.len() as u64)
		})
	}

	fn count<'a>(&'a self, _collection: &'a str) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(async move {
			self.count_calls.fetch_add(1, Ordering::SeqCst);

			if let Some(delay) = self.build_delay {
				tokio::time::sleep(delay).await;
			}

			Ok(self.initial_count)
		})
	}

	fn delete_if_exists<'a>(
		&'a self,
		collection: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		Box::pin(async move {
			self.deleted
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.push(collection.to_string());

			Ok(true)
		})
	}
}

/// Scripted [`TextGenerator`]: replies with a fixed answer (or fails, or
/// stalls) and records every prompt it was handed.
pub struct StubGenerator {
	output: String,
	delay: Option<Duration>,
	fail: bool,
	pub prompts: Mutex<Vec<String>>,
}
impl StubGenerator {
	pub fn replying(output: &str) -> Self {
		Self { output: output.to_string(), delay: None, fail: false, prompts: Mutex::new(Vec::new()) }
	}

	pub fn failing() -> Self {
		Self { output: String::new(), delay: None, fail: true, prompts: Mutex::new(Vec::new()) }
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}

	pub fn last_prompt(&self) -> Option<String> {
		self.prompts.lock().unwrap_or_else(|err| err.into_inner()).last().cloned()
	}
}
impl TextGenerator for StubGenerator {
	fn invoke<'a>(
		&'a self,
		_cfg: &'a GeneratorConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move {
			self.prompts
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.push(prompt.to_string());

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if self.fail {
				return Err(color_eyre::eyre::eyre!("Scripted generation failure."));
			}

			Ok(self.output.clone())
		})
	}
}

/// On-disk tenant roots under a unique temp directory, removed on drop.
pub struct TestTenants {
	pub root: PathBuf,
	pub primary_dir: PathBuf,
	pub secondary_dir: PathBuf,
}
impl TestTenants {
	pub fn new() -> Self {
		let root = env::temp_dir().join(format!("riposte_test_{}", Uuid::new_v4().simple()));
		let primary_dir = root.join("primary");
		let secondary_dir = root.join("secondary");

		fs::create_dir_all(&primary_dir).expect("Failed to create primary tenant root.");
		fs::create_dir_all(&secondary_dir).expect("Failed to create secondary tenant root.");

		Self { root, primary_dir, secondary_dir }
	}

	pub fn roots(&self) -> TenantRoots {
		TenantRoots {
			primary_dir: self.primary_dir.clone(),
			secondary_dir: self.secondary_dir.clone(),
		}
	}

	pub fn write_profile(&self, variant: Variant, tenant_id: &str, profile: &serde_json::Value) {
		let base = match variant {
			Variant::Primary => &self.primary_dir,
			Variant::Secondary => &self.secondary_dir,
		};

		write_profile(base, tenant_id, profile);
	}
}
impl Default for TestTenants {
	fn default() -> Self {
		Self::new()
	}
}
impl Drop for TestTenants {
	fn drop(&mut self) {
		let _ = fs::remove_dir_all(&self.root);
	}
}

pub fn write_profile(base: &Path, tenant_id: &str, profile: &serde_json::Value) {
	let dir = base.join(tenant_id);

	fs::create_dir_all(&dir).expect("Failed to create tenant directory.");
	fs::write(
		dir.join("profile.json"),
		serde_json::to_vec_pretty(profile).expect("Profile must serialize."),
	)
	.expect("Failed to write tenant profile.");
}

pub fn sample_profile(brand: &str) -> serde_json::Value {
	json!({
		"brand": {
			"name": brand,
			"slogan": "Logistique audiovisuelle",
			"mission": "Faciliter les tournages",
			"values": ["réactivité", "fiabilité"]
		},
		"services": [
			{
				"name": "Ventousage",
				"description": "Réservation de voirie pour tournages",
				"details": ["autorisations", "signalisation"]
			}
		],
		"references": [
			{ "project": "Série TV", "client": "Netflix", "kind": "fiction", "note": "tournage nocturne" }
		],
		"critical_scenarios": [
			{
				"name": "urgence_tournage",
				"triggers": ["demain", "urgent"],
				"response": "Intervention sous 24h",
				"action": "Appeler l'équipe",
				"call_to_action": "Contactez-nous"
			}
		],
		"testimonials": ["Très réactifs."]
	})
}

/// A complete development-profile config pointing at the given tenant
/// roots. Tests tweak individual fields afterwards.
pub fn test_config(roots: TenantRoots) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			profile: "development".to_string(),
			default_tenant: "bms_ventouse".to_string(),
		},
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				collection_prefix: "riposte".to_string(),
				vector_dim: 4,
			},
			tenants: roots,
		},
		retrieval: Retrieval {
			top_k: 3,
			score_threshold: 0.3,
			max_context_snippets: 3,
			chunk_max_chars: 500,
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "stub-embedding".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: String::new(),
				path: "/v1/embeddings".to_string(),
				model: "stub".to_string(),
				dimensions: 4,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			generator: GeneratorConfig {
				provider_id: "stub-generator".to_string(),
				kind: "chat".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: String::new(),
				path: "/v1/chat/completions".to_string(),
				model: "stub".to_string(),
				temperature: 0.7,
				max_tokens: 256,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		security: Security {
			api_keys: Vec::new(),
			key_scopes: Default::default(),
			allowed_origins: vec!["*".to_string()],
			rate_limit: RateLimit {
				window_secs: 60,
				max_requests: 1_000,
				identity: "ip".to_string(),
			},
		},
		limits: Limits { max_question_chars: 2_000, min_answer_chars: 25 },
	}
}
