mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, GeneratorConfig, Limits, Providers, Qdrant, RateLimit,
	Retrieval, Security, Service, Storage, TenantRoots,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if !matches!(cfg.service.profile.as_str(), "development" | "production") {
		return Err(Error::Validation {
			message: "service.profile must be one of development or production.".to_string(),
		});
	}
	if cfg.service.default_tenant.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.default_tenant must be non-empty.".to_string(),
		});
	}

	if cfg.service.is_production() {
		if cfg.security.api_keys.is_empty() {
			return Err(Error::Validation {
				message: "security.api_keys must be non-empty in the production profile."
					.to_string(),
			});
		}
		if cfg.security.allowed_origins.iter().any(|origin| origin == "*") {
			return Err(Error::Validation {
				message: "security.allowed_origins must not contain \"*\" in the production \
				          profile."
					.to_string(),
			});
		}
	}

	if cfg.storage.qdrant.collection_prefix.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection_prefix must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.retrieval.score_threshold.is_finite()
		|| !(0.0..=1.0).contains(&cfg.retrieval.score_threshold)
	{
		return Err(Error::Validation {
			message: "retrieval.score_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.retrieval.max_context_snippets == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_context_snippets must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.chunk_max_chars == 0 {
		return Err(Error::Validation {
			message: "retrieval.chunk_max_chars must be greater than zero.".to_string(),
		});
	}

	if !matches!(cfg.providers.generator.kind.as_str(), "chat" | "completion") {
		return Err(Error::Validation {
			message: "providers.generator.kind must be one of chat or completion.".to_string(),
		});
	}
	if !cfg.providers.generator.temperature.is_finite()
		|| cfg.providers.generator.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "providers.generator.temperature must be zero or greater.".to_string(),
		});
	}
	if cfg.providers.generator.max_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.generator.max_tokens must be greater than zero.".to_string(),
		});
	}

	for (label, timeout_ms) in [
		("embedding", cfg.providers.embedding.timeout_ms),
		("generator", cfg.providers.generator.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	if cfg.security.rate_limit.window_secs == 0 {
		return Err(Error::Validation {
			message: "security.rate_limit.window_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.security.rate_limit.max_requests == 0 {
		return Err(Error::Validation {
			message: "security.rate_limit.max_requests must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.security.rate_limit.identity.as_str(), "ip" | "api_key") {
		return Err(Error::Validation {
			message: "security.rate_limit.identity must be one of ip or api_key.".to_string(),
		});
	}

	for key in cfg.security.key_scopes.keys() {
		if !cfg.security.api_keys.iter().any(|configured| configured == key) {
			return Err(Error::Validation {
				message: format!("security.key_scopes references unknown API key {key:?}."),
			});
		}
	}

	if cfg.limits.max_question_chars == 0 {
		return Err(Error::Validation {
			message: "limits.max_question_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.limits.min_answer_chars == 0 {
		return Err(Error::Validation {
			message: "limits.min_answer_chars must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.security.api_keys.retain(|key| !key.trim().is_empty());

	for key in cfg.security.api_keys.iter_mut() {
		*key = key.trim().to_string();
	}

	cfg.security.allowed_origins.retain(|origin| !origin.trim().is_empty());
}
