use color_eyre::{Result, eyre};
use qdrant_client::{
	Payload,
	qdrant::{
		CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, Query,
		QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, VectorParamsBuilder,
		value::Kind,
	},
};

use crate::documents::IndexDocument;
use riposte_domain::Variant;

/// One retrieved context snippet, ranked by the store.
#[derive(Clone, Debug)]
pub struct Snippet {
	pub content: String,
	pub kind: String,
	pub score: f32,
}

/// Qdrant-backed document store. One client serves every tenant; isolation
/// comes from per-(variant, tenant) collections.
pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection_prefix: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &riposte_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			collection_prefix: cfg.collection_prefix.clone(),
			vector_dim: cfg.vector_dim,
		})
	}

	/// Collection namespace for one (variant, tenant) pair. Variants never
	/// share a collection.
	pub fn collection_name(&self, variant: Variant, tenant_id: &str) -> String {
		format!("{}_{}_{}", self.collection_prefix, variant.as_str(), tenant_id)
	}

	pub async fn count(&self, collection: &str) -> Result<u64> {
		if !self.client.collection_exists(collection).await? {
			return Ok(0);
		}

		let response =
			self.client.count(CountPointsBuilder::new(collection).exact(true)).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}

	/// Embeds and upserts the documents, creating the collection first when
	/// it does not exist yet. Returns the number of indexed points.
	pub async fn populate(
		&self,
		embedding_cfg: &riposte_config::EmbeddingProviderConfig,
		collection: &str,
		documents: &[IndexDocument],
	) -> Result<u64> {
		if documents.is_empty() {
			return Ok(0);
		}

		let texts = documents.iter().map(|doc| doc.content.clone()).collect::<Vec<_>>();
		let vectors = riposte_providers::embedding::embed(embedding_cfg, &texts).await?;

		if vectors.len() != documents.len() {
			return Err(eyre::eyre!("Embedding provider returned mismatched vector count."));
		}

		for vector in &vectors {
			if vector.len() != self.vector_dim as usize {
				return Err(eyre::eyre!("Embedding vector dimension mismatch."));
			}
		}

		if !self.client.collection_exists(collection).await? {
			self.client
				.create_collection(
					CreateCollectionBuilder::new(collection).vectors_config(
						VectorParamsBuilder::new(self.vector_dim as u64, Distance::Cosine),
					),
				)
				.await?;
		}

		let points = documents
			.iter()
			.zip(vectors)
			.enumerate()
			.map(|(index, (doc, vector))| {
				let mut payload = Payload::new();

				payload.insert("content", doc.content.clone());
				payload.insert("kind", doc.kind);
				payload.insert("name", doc.name.clone());

				PointStruct::new(index as u64, vector, payload)
			})
			.collect::<Vec<_>>();
		let indexed = points.len() as u64;

		self.client.upsert_points(UpsertPointsBuilder::new(collection, points).wait(true)).await?;

		tracing::info!(collection, indexed, "Populated collection.");

		Ok(indexed)
	}

	/// Ranked similarity lookup above the score threshold.
	pub async fn query(
		&self,
		embedding_cfg: &riposte_config::EmbeddingProviderConfig,
		collection: &str,
		text: &str,
		top_k: u32,
		score_threshold: f32,
	) -> Result<Vec<Snippet>> {
		let embedded =
			riposte_providers::embedding::embed(embedding_cfg, &[text.to_string()]).await?;
		let vector = embedded
			.into_iter()
			.next()
			.ok_or_else(|| eyre::eyre!("Embedding provider returned no vectors."))?;

		if vector.len() != self.vector_dim as usize {
			return Err(eyre::eyre!("Embedding vector dimension mismatch."));
		}

		let response = self
			.client
			.query(
				QueryPointsBuilder::new(collection)
					.query(Query::new_nearest(vector))
					.limit(top_k as u64)
					.score_threshold(score_threshold)
					.with_payload(true),
			)
			.await?;

		Ok(response.result.iter().map(snippet_from_point).collect())
	}

	/// Explicit delete-if-present, so an absent collection is a normal
	/// outcome instead of an error to swallow.
	pub async fn delete_if_exists(&self, collection: &str) -> Result<bool> {
		if !self.client.collection_exists(collection).await? {
			return Ok(false);
		}

		self.client.delete_collection(collection).await?;

		Ok(true)
	}
}

fn snippet_from_point(point: &ScoredPoint) -> Snippet {
	Snippet {
		content: payload_str(point, "content").unwrap_or_default(),
		kind: payload_str(point, "kind").unwrap_or_default(),
		score: point.score,
	}
}

fn payload_str(point: &ScoredPoint, key: &str) -> Option<String> {
	match point.payload.get(key).and_then(|value| value.kind.as_ref()) {
		Some(Kind::StringValue(value)) => Some(value.clone()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn store_with_prefix(prefix: &str) -> QdrantStore {
		QdrantStore::new(&riposte_config::Qdrant {
			url: "http://127.0.0.1:6334".to_string(),
			collection_prefix: prefix.to_string(),
			vector_dim: 4,
		})
		.expect("Store construction must not require a live server.")
	}

	#[test]
	fn collection_names_are_namespaced_per_variant() {
		let store = store_with_prefix("riposte");

		assert_eq!(
			store.collection_name(Variant::Primary, "bms_ventouse"),
			"riposte_primary_bms_ventouse"
		);
		assert_eq!(
			store.collection_name(Variant::Secondary, "bms_ventouse"),
			"riposte_secondary_bms_ventouse"
		);
	}
}
