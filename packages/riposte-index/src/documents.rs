use crate::profile::TenantProfile;

/// One retrieval unit headed for the vector index. `kind` and `name` land in
/// the point payload for traceability; only `content` is embedded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexDocument {
	pub content: String,
	pub kind: &'static str,
	pub name: String,
}

/// Splits long text into word-preserving chunks of at most `max_chars`
/// characters (a single oversized word still becomes its own chunk).
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
	let mut chunks = Vec::new();
	let mut current = String::new();

	for word in text.split_whitespace() {
		let candidate_len =
			current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();

		if !current.is_empty() && candidate_len > max_chars {
			chunks.push(std::mem::take(&mut current));
		}
		if !current.is_empty() {
			current.push(' ');
		}

		current.push_str(word);
	}

	if !current.is_empty() {
		chunks.push(current);
	}

	chunks
}

/// Flattens a tenant profile into the documents that populate its
/// collection: one brand block plus one document per service, reference,
/// critical scenario, and testimonial.
pub fn build_documents(profile: &TenantProfile, chunk_max_chars: usize) -> Vec<IndexDocument> {
	let max_chars = chunk_max_chars.max(1);
	let mut documents = Vec::new();
	let brand = &profile.brand;
	let mut brand_sections = vec![format!("Entreprise: {}", brand.name)];

	if !brand.slogan.is_empty() {
		brand_sections.push(format!("Slogan: {}", brand.slogan));
	}
	if !brand.mission.is_empty() {
		brand_sections.push(format!("Mission: {}", brand.mission));
	}
	if !brand.values.is_empty() {
		brand_sections.push(format!("Valeurs: {}", brand.values.join(", ")));
	}

	for chunk in chunk_text(&brand_sections.join(" | "), max_chars) {
		documents.push(IndexDocument { content: chunk, kind: "brand", name: brand.name.clone() });
	}

	for service in &profile.services {
		let text = format!(
			"Service: {} | Description: {} | Détails: {}",
			service.name,
			service.description,
			service.details.join("; "),
		);

		for chunk in chunk_text(&text, max_chars) {
			documents.push(IndexDocument {
				content: chunk,
				kind: "service",
				name: service.name.clone(),
			});
		}
	}

	for reference in &profile.references {
		let text = format!(
			"Référence client: {} | Client: {} | Type: {} | Spécificité: {}",
			reference.project, reference.client, reference.kind, reference.note,
		);

		for chunk in chunk_text(&text, max_chars) {
			documents.push(IndexDocument {
				content: chunk,
				kind: "reference",
				name: reference.client.clone(),
			});
		}
	}

	for scenario in &profile.critical_scenarios {
		let text = format!(
			"Scénario critique: {} | Déclencheurs: {} | Réponse: {} | Action: {} | CTA: {}",
			scenario.name,
			scenario.triggers.join(", "),
			scenario.response,
			scenario.action,
			scenario.call_to_action,
		);

		for chunk in chunk_text(&text, max_chars) {
			documents.push(IndexDocument {
				content: chunk,
				kind: "critical_scenario",
				name: scenario.name.clone(),
			});
		}
	}

	for (index, testimonial) in profile.testimonials.iter().enumerate() {
		let text = format!("Témoignage client {}: {}", index + 1, testimonial);

		for chunk in chunk_text(&text, max_chars) {
			documents.push(IndexDocument {
				content: chunk,
				kind: "testimonial",
				name: format!("testimonial_{}", index + 1),
			});
		}
	}

	documents
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::profile::TenantProfile;

	fn sample_profile() -> TenantProfile {
		serde_json::from_str(
			r#"{
				"brand": { "name": "BMS Ventouse", "slogan": "Logistique audiovisuelle" },
				"services": [
					{ "name": "Ventousage", "description": "Réservation de voirie", "details": ["autorisations", "signalisation"] }
				],
				"references": [
					{ "project": "Série TV", "client": "Netflix", "kind": "fiction", "note": "tournage nocturne" }
				],
				"critical_scenarios": [
					{ "name": "urgence_tournage", "triggers": ["demain", "urgent"], "response": "Intervention sous 24h" }
				],
				"testimonials": ["Très réactifs.", "Équipe fiable."]
			}"#,
		)
		.expect("Sample profile must parse.")
	}

	#[test]
	fn chunking_respects_word_boundaries() {
		let chunks = chunk_text("un deux trois quatre cinq", 9);

		assert_eq!(chunks, vec!["un deux", "trois", "quatre", "cinq"]);
	}

	#[test]
	fn chunking_keeps_short_text_whole() {
		assert_eq!(chunk_text("texte court", 500), vec!["texte court".to_string()]);
	}

	#[test]
	fn chunking_of_empty_text_is_empty() {
		assert!(chunk_text("   ", 500).is_empty());
	}

	#[test]
	fn builds_one_document_per_profile_entry() {
		let documents = build_documents(&sample_profile(), 500);
		let kinds = documents.iter().map(|doc| doc.kind).collect::<Vec<_>>();

		assert_eq!(
			kinds,
			vec!["brand", "service", "reference", "critical_scenario", "testimonial", "testimonial"]
		);
		assert!(documents[0].content.contains("Entreprise: BMS Ventouse"));
		assert!(documents[1].content.contains("autorisations; signalisation"));
		assert!(documents[2].content.contains("Netflix"));
		assert!(documents[3].content.contains("demain, urgent"));
	}

	#[test]
	fn long_entries_are_chunked() {
		let mut profile = sample_profile();

		profile.testimonials = vec!["mot ".repeat(300)];

		let documents = build_documents(&profile, 100);
		let testimonial_chunks =
			documents.iter().filter(|doc| doc.kind == "testimonial").count();

		assert!(testimonial_chunks > 1);
	}
}
