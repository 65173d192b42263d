use std::{fs, io, path::Path};

use serde::Deserialize;

pub type Result<T, E = ProfileError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
	#[error("Tenant profile not found at {path:?}.")]
	NotFound { path: std::path::PathBuf },
	#[error("Failed to read tenant profile at {path:?}.")]
	Read { path: std::path::PathBuf, source: io::Error },
	#[error("Failed to parse tenant profile at {path:?}.")]
	Parse { path: std::path::PathBuf, source: serde_json::Error },
}

/// A tenant's immutable brand profile. Loaded once per pipeline build; the
/// domain content below the brand block feeds only the retrieval index.
#[derive(Clone, Debug, Deserialize)]
pub struct TenantProfile {
	pub brand: Brand,
	/// Custom prompt template. Used only when it carries all four required
	/// placeholders; otherwise the default template applies.
	#[serde(default)]
	pub prompt_template: Option<String>,
	#[serde(default)]
	pub services: Vec<Service>,
	#[serde(default)]
	pub references: Vec<Reference>,
	#[serde(default)]
	pub critical_scenarios: Vec<CriticalScenario>,
	#[serde(default)]
	pub testimonials: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Brand {
	pub name: String,
	#[serde(default)]
	pub slogan: String,
	#[serde(default)]
	pub mission: String,
	#[serde(default)]
	pub values: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub details: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Reference {
	pub project: String,
	pub client: String,
	#[serde(default)]
	pub kind: String,
	#[serde(default)]
	pub note: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CriticalScenario {
	pub name: String,
	#[serde(default)]
	pub triggers: Vec<String>,
	#[serde(default)]
	pub response: String,
	#[serde(default)]
	pub action: String,
	#[serde(default)]
	pub call_to_action: String,
}

pub fn load(path: &Path) -> Result<TenantProfile> {
	let raw = fs::read_to_string(path).map_err(|err| {
		if err.kind() == io::ErrorKind::NotFound {
			ProfileError::NotFound { path: path.to_path_buf() }
		} else {
			ProfileError::Read { path: path.to_path_buf(), source: err }
		}
	})?;

	serde_json::from_str(&raw)
		.map_err(|err| ProfileError::Parse { path: path.to_path_buf(), source: err })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_minimal_profile() {
		let raw = r#"{ "brand": { "name": "BMS Ventouse" } }"#;
		let profile: TenantProfile = serde_json::from_str(raw).expect("parse failed");

		assert_eq!(profile.brand.name, "BMS Ventouse");
		assert!(profile.brand.slogan.is_empty());
		assert!(profile.prompt_template.is_none());
		assert!(profile.services.is_empty());
	}

	#[test]
	fn parses_full_profile() {
		let raw = r#"{
			"brand": {
				"name": "BMS Ventouse",
				"slogan": "Logistique audiovisuelle",
				"mission": "Faciliter les tournages",
				"values": ["réactivité"]
			},
			"prompt_template": "{brand_name} {context} {question} {scenario}",
			"services": [
				{ "name": "Ventousage", "description": "Réservation de voirie", "details": ["autorisations"] }
			],
			"references": [
				{ "project": "Série TV", "client": "Netflix", "kind": "fiction" }
			],
			"critical_scenarios": [
				{ "name": "urgence_tournage", "triggers": ["demain"], "response": "Intervention sous 24h" }
			],
			"testimonials": ["Très réactifs."]
		}"#;
		let profile: TenantProfile = serde_json::from_str(raw).expect("parse failed");

		assert_eq!(profile.services.len(), 1);
		assert_eq!(profile.references[0].client, "Netflix");
		assert_eq!(profile.critical_scenarios[0].triggers, vec!["demain".to_string()]);
		assert_eq!(profile.testimonials.len(), 1);
	}

	#[test]
	fn missing_file_maps_to_not_found() {
		let err = load(Path::new("/nonexistent/riposte/profile.json"))
			.expect_err("Expected a not-found error.");

		assert!(matches!(err, ProfileError::NotFound { .. }));
	}
}
