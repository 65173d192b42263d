use std::time::Duration;

use crate::{Collaborators, ServiceError, ServiceResult};
use riposte_config::Config;
use riposte_domain::{Variant, classify, compose_context, render_prompt, sanitize};

/// A ready-to-serve tenant pipeline: profile loaded, collection populated,
/// template resolved. Built once per (variant, tenant) and shared across
/// requests; `process` itself holds no mutable state.
pub struct Pipeline {
	pub variant: Variant,
	pub tenant_id: String,
	pub collection: String,
	pub brand: String,
	pub slogan: String,
	pub template: String,
}
impl Pipeline {
	/// Retrieval, classification, prompt rendering, bounded generation, then
	/// sanitization. Retrieval and generation failures map to their own
	/// error variants so the router can report them distinctly.
	pub async fn process(
		&self,
		question: &str,
		cfg: &Config,
		collaborators: &Collaborators,
	) -> ServiceResult<String> {
		let snippets = collaborators
			.store
			.query(
				&cfg.providers.embedding,
				&self.collection,
				question,
				cfg.retrieval.top_k,
				cfg.retrieval.score_threshold,
			)
			.await
			.map_err(|err| ServiceError::RetrievalFailure { message: err.to_string() })?;

		tracing::debug!(
			tenant_id = %self.tenant_id,
			variant = %self.variant,
			snippets = snippets.len(),
			"Retrieved context snippets."
		);

		let contents = snippets.iter().map(|snippet| snippet.content.clone()).collect::<Vec<_>>();
		let context = compose_context(
			&contents,
			&self.brand,
			&self.slogan,
			cfg.retrieval.max_context_snippets as usize,
		);
		let scenario = classify(question);
		let prompt =
			render_prompt(&self.template, &self.brand, &context, question, scenario.label());
		let timeout = Duration::from_millis(cfg.providers.generator.timeout_ms);
		let raw = match tokio::time::timeout(
			timeout,
			collaborators.generator.invoke(&cfg.providers.generator, &prompt),
		)
		.await
		{
			Ok(Ok(text)) => text,
			Ok(Err(err)) =>
				return Err(ServiceError::GenerationFailure { message: err.to_string() }),
			Err(_) =>
				return Err(ServiceError::GenerationFailure {
					message: format!("Generator timed out after {timeout:?}."),
				}),
		};

		Ok(sanitize(&raw, &self.brand, cfg.limits.min_answer_chars as usize))
	}
}
