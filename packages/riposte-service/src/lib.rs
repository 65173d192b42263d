pub mod access;
pub mod cache;
pub mod pipeline;
pub mod ratelimit;

pub use access::{AccessPolicy, resolve_profile_path};
pub use cache::PipelineCache;
pub use pipeline::Pipeline;
pub use ratelimit::{RateDecision, RateLimiter};

use std::{future::Future, pin::Pin, sync::Arc};

use serde::{Deserialize, Serialize};

use riposte_config::{Config, EmbeddingProviderConfig, GeneratorConfig};
use riposte_domain::{Variant, validate_tenant_id};
use riposte_index::{IndexDocument, QdrantStore, Snippet};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque generation backend: prompt in, generated text out. May fail or
/// block; the pipeline bounds every call with the configured timeout.
pub trait TextGenerator
where
	Self: Send + Sync,
{
	fn invoke<'a>(
		&'a self,
		cfg: &'a GeneratorConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Opaque ranked-snippet store, addressed by tenant-scoped collection.
pub trait DocumentStore
where
	Self: Send + Sync,
{
	fn collection_name(&self, variant: Variant, tenant_id: &str) -> String;

	fn query<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		collection: &'a str,
		text: &'a str,
		top_k: u32,
		score_threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Snippet>>>;

	fn populate<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		collection: &'a str,
		documents: &'a [IndexDocument],
	) -> BoxFuture<'a, color_eyre::Result<u64>>;

	fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, color_eyre::Result<u64>>;

	fn delete_if_exists<'a>(
		&'a self,
		collection: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>>;
}

#[derive(Clone)]
pub struct Collaborators {
	pub generator: Arc<dyn TextGenerator>,
	pub store: Arc<dyn DocumentStore>,
}
impl Collaborators {
	pub fn from_config(cfg: &Config) -> color_eyre::Result<Self> {
		Ok(Self {
			generator: Arc::new(DefaultGenerator),
			store: Arc::new(QdrantStore::new(&cfg.storage.qdrant)?),
		})
	}
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidIdentifier { message: String },
	InvalidRequest { message: String },
	PathEscape { tenant_id: String },
	Unauthorized,
	Forbidden { tenant_id: String },
	Throttled,
	NotFound { tenant_id: String, variant: Variant },
	RetrievalFailure { message: String },
	GenerationFailure { message: String },
	Internal { message: String },
}
impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidIdentifier { message } => write!(f, "{message}"),
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::PathEscape { tenant_id } => {
				write!(f, "Tenant {tenant_id:?} resolves outside its storage base.")
			},
			Self::Unauthorized => write!(f, "Missing or invalid API key."),
			Self::Forbidden { tenant_id } => {
				write!(f, "API key is not allowed to address tenant {tenant_id:?}.")
			},
			Self::Throttled => write!(f, "Rate limit exceeded."),
			Self::NotFound { tenant_id, variant } => {
				write!(f, "Tenant profile not found for {tenant_id} in variant {variant}.")
			},
			Self::RetrievalFailure { message } => write!(f, "Retrieval failed: {message}"),
			Self::GenerationFailure { message } => write!(f, "Generation failed: {message}"),
			Self::Internal { message } => write!(f, "Internal error: {message}"),
		}
	}
}
impl std::error::Error for ServiceError {}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
	pub question: String,
	#[serde(default)]
	pub tenant_id: Option<String>,
	#[serde(default)]
	pub variant: Option<String>,
	#[serde(default)]
	pub refresh: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatResponse {
	pub tenant_id: String,
	pub variant: Variant,
	pub provider: String,
	pub response: String,
}

/// Who is asking, for access control and rate limiting. The API key comes
/// from the Authorization header; the address from the connection.
#[derive(Clone, Debug, Default)]
pub struct RequestIdentity {
	pub api_key: Option<String>,
	pub remote_addr: Option<String>,
}

pub struct ChatService {
	pub cfg: Arc<Config>,
	collaborators: Collaborators,
	cache: PipelineCache,
	limiter: RateLimiter,
	access: AccessPolicy,
}
impl ChatService {
	pub fn new(cfg: Config, collaborators: Collaborators) -> Self {
		let access = AccessPolicy::from_config(&cfg.security);
		let limiter = RateLimiter::new(&cfg.security.rate_limit);

		Self { cfg: Arc::new(cfg), collaborators, cache: PipelineCache::new(), limiter, access }
	}

	/// The full request flow: access gate, rate limit, cache lookup (with
	/// optional refresh), then the pipeline itself. Cheap rejections happen
	/// before any I/O.
	pub async fn chat(
		&self,
		request: ChatRequest,
		identity: RequestIdentity,
	) -> ServiceResult<ChatResponse> {
		let question = request.question.trim();

		if question.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "question must be non-empty.".to_string(),
			});
		}
		if question.chars().count() > self.cfg.limits.max_question_chars as usize {
			return Err(ServiceError::InvalidRequest {
				message: format!(
					"question must be at most {} characters.",
					self.cfg.limits.max_question_chars
				),
			});
		}

		let variant = match request.variant.as_deref() {
			None | Some("") => Variant::Primary,
			Some(raw) => raw
				.parse::<Variant>()
				.map_err(|err| ServiceError::InvalidIdentifier { message: err.to_string() })?,
		};
		let tenant_id = request
			.tenant_id
			.as_deref()
			.filter(|raw| !raw.is_empty())
			.unwrap_or(self.cfg.service.default_tenant.as_str());
		let tenant_id = validate_tenant_id(tenant_id)
			.map_err(|err| ServiceError::InvalidIdentifier { message: err.to_string() })?
			.to_string();

		self.access.authorize(identity.api_key.as_deref(), &tenant_id)?;

		let rate_identity = self.rate_identity(&identity);

		if self.limiter.check(&rate_identity) == RateDecision::Throttled {
			tracing::warn!(identity = %rate_identity, "Request throttled.");

			return Err(ServiceError::Throttled);
		}

		if request.refresh {
			self.cache.invalidate(&self.collaborators, variant, &tenant_id).await;
		}

		let pipeline = self
			.cache
			.get_or_build(&self.cfg, &self.collaborators, variant, &tenant_id)
			.await?;
		let response = pipeline.process(question, &self.cfg, &self.collaborators).await?;

		Ok(ChatResponse {
			tenant_id,
			variant,
			provider: self.cfg.providers.generator.provider_id.clone(),
			response,
		})
	}

	/// Cache visibility for tests and the refresh contract.
	pub async fn is_cached(&self, variant: Variant, tenant_id: &str) -> bool {
		self.cache.is_cached(variant, tenant_id).await
	}

	fn rate_identity(&self, identity: &RequestIdentity) -> String {
		let fallback = || identity.remote_addr.clone().unwrap_or_else(|| "unknown".to_string());

		match self.cfg.security.rate_limit.identity.as_str() {
			"api_key" => identity.api_key.clone().unwrap_or_else(fallback),
			_ => fallback(),
		}
	}
}

struct DefaultGenerator;

impl TextGenerator for DefaultGenerator {
	fn invoke<'a>(
		&'a self,
		cfg: &'a GeneratorConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(riposte_providers::generator::generate(cfg, prompt))
	}
}

impl DocumentStore for QdrantStore {
	fn collection_name(&self, variant: Variant, tenant_id: &str) -> String {
		QdrantStore::collection_name(self, variant, tenant_id)
	}

	fn query<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		collection: &'a str,
		text: &'a str,
		top_k: u32,
		score_threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Snippet>>> {
		Box::pin(QdrantStore::query(self, cfg, collection, text, top_k, score_threshold))
	}

	fn populate<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		collection: &'a str,
		documents: &'a [IndexDocument],
	) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(QdrantStore::populate(self, cfg, collection, documents))
	}

	fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, color_eyre::Result<u64>> {
		Box::pin(QdrantStore::count(self, collection))
	}

	fn delete_if_exists<'a>(
		&'a self,
		collection: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		Box::pin(QdrantStore::delete_if_exists(self, collection))
	}
}
