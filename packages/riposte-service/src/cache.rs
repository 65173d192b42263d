use std::sync::Arc;

use ahash::AHashMap;
use tokio::sync::{Mutex, OnceCell};

use crate::{
	Collaborators, Pipeline, ServiceError, ServiceResult, access::resolve_profile_path,
};
use riposte_config::Config;
use riposte_domain::{Variant, resolve_template};
use riposte_index::{build_documents, profile};

type CacheKey = (Variant, String);
type CacheCell = Arc<OnceCell<Arc<Pipeline>>>;

/// Per-(variant, tenant) pipeline cache with single-flight builds. The map
/// lock is only held to hand out a cell; the build itself runs outside it,
/// so concurrent first requests for one tenant coalesce into one build
/// while other tenants proceed unblocked. A failed build leaves the cell
/// empty and the next request retries.
pub struct PipelineCache {
	cells: Mutex<AHashMap<CacheKey, CacheCell>>,
}
impl PipelineCache {
	pub fn new() -> Self {
		Self { cells: Mutex::new(AHashMap::new()) }
	}

	pub async fn get_or_build(
		&self,
		cfg: &Config,
		collaborators: &Collaborators,
		variant: Variant,
		tenant_id: &str,
	) -> ServiceResult<Arc<Pipeline>> {
		let key = (variant, tenant_id.to_string());
		let cell = {
			let mut cells = self.cells.lock().await;

			cells.entry(key.clone()).or_default().clone()
		};

		match cell
			.get_or_try_init(|| build_pipeline(cfg, collaborators, variant, tenant_id))
			.await
		{
			Ok(pipeline) => Ok(pipeline.clone()),
			Err(err) => {
				// Drop the empty cell so failed keys (e.g. well-formed ids
				// with no profile) do not accumulate. A concurrent waiter may
				// have initialized it in the meantime; leave those alone.
				let mut cells = self.cells.lock().await;

				if let Some(existing) = cells.get(&key)
					&& Arc::ptr_eq(existing, &cell)
					&& !existing.initialized()
				{
					cells.remove(&key);
				}

				Err(err)
			},
		}
	}

	/// Drops the cached pipeline and the tenant's collection, forcing the
	/// next request to rebuild and re-index. Collection deletion failures
	/// are logged, not surfaced; the rebuild re-populates regardless.
	pub async fn invalidate(
		&self,
		collaborators: &Collaborators,
		variant: Variant,
		tenant_id: &str,
	) {
		let evicted = {
			let mut cells = self.cells.lock().await;

			cells.remove(&(variant, tenant_id.to_string())).is_some()
		};
		let collection = collaborators.store.collection_name(variant, tenant_id);

		match collaborators.store.delete_if_exists(&collection).await {
			Ok(deleted) =>
				tracing::info!(collection, evicted, deleted, "Invalidated tenant pipeline."),
			Err(err) => tracing::warn!(
				collection,
				error = %err,
				"Failed to delete collection during invalidation."
			),
		}
	}

	pub async fn is_cached(&self, variant: Variant, tenant_id: &str) -> bool {
		let cells = self.cells.lock().await;

		cells
			.get(&(variant, tenant_id.to_string()))
			.is_some_and(|cell| cell.initialized())
	}

	/// Tracked keys, including in-flight builds.
	pub async fn entry_count(&self) -> usize {
		self.cells.lock().await.len()
	}
}
impl Default for PipelineCache {
	fn default() -> Self {
		Self::new()
	}
}

async fn build_pipeline(
	cfg: &Config,
	collaborators: &Collaborators,
	variant: Variant,
	tenant_id: &str,
) -> ServiceResult<Arc<Pipeline>> {
	let path = resolve_profile_path(&cfg.storage.tenants, variant, tenant_id)?;
	let profile = profile::load(&path).map_err(|err| match err {
		profile::ProfileError::NotFound { .. } =>
			ServiceError::NotFound { tenant_id: tenant_id.to_string(), variant },
		other => ServiceError::Internal { message: other.to_string() },
	})?;
	let collection = collaborators.store.collection_name(variant, tenant_id);
	let existing = collaborators
		.store
		.count(&collection)
		.await
		.map_err(|err| ServiceError::Internal { message: err.to_string() })?;

	if existing == 0 {
		let documents = build_documents(&profile, cfg.retrieval.chunk_max_chars as usize);
		let indexed = collaborators
			.store
			.populate(&cfg.providers.embedding, &collection, &documents)
			.await
			.map_err(|err| ServiceError::Internal { message: err.to_string() })?;

		tracing::info!(tenant_id, %variant, collection, indexed, "Indexed tenant profile.");
	} else {
		tracing::debug!(tenant_id, %variant, collection, existing, "Reusing populated collection.");
	}

	Ok(Arc::new(Pipeline {
		variant,
		tenant_id: tenant_id.to_string(),
		collection,
		brand: profile.brand.name.clone(),
		slogan: profile.brand.slogan.clone(),
		template: resolve_template(profile.prompt_template.as_deref()).to_string(),
	}))
}
