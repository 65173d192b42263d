use std::{
	collections::{HashMap, HashSet},
	path::{Component, Path, PathBuf},
};

use crate::{ServiceError, ServiceResult};
use riposte_config::{Security, TenantRoots};
use riposte_domain::Variant;

/// API-key gate with optional per-key tenant scoping. An empty key set is
/// open mode; config validation refuses that combination in production.
pub struct AccessPolicy {
	keys: HashSet<String>,
	scopes: HashMap<String, HashSet<String>>,
}
impl AccessPolicy {
	pub fn from_config(security: &Security) -> Self {
		let keys = security.api_keys.iter().cloned().collect();
		let scopes = security
			.key_scopes
			.iter()
			.map(|(key, tenants)| (key.clone(), tenants.iter().cloned().collect()))
			.collect();

		Self { keys, scopes }
	}

	pub fn authorize(&self, api_key: Option<&str>, tenant_id: &str) -> ServiceResult<()> {
		if self.keys.is_empty() {
			return Ok(());
		}

		let Some(key) = api_key else {
			return Err(ServiceError::Unauthorized);
		};

		if !self.keys.contains(key) {
			return Err(ServiceError::Unauthorized);
		}
		if let Some(scope) = self.scopes.get(key)
			&& !scope.is_empty()
			&& !scope.contains(tenant_id)
		{
			return Err(ServiceError::Forbidden { tenant_id: tenant_id.to_string() });
		}

		Ok(())
	}
}

/// Resolves a tenant's profile file under the variant's base directory.
/// Identifier validation already bans path separators; this re-checks the
/// resolution anyway and fails closed on anything that would escape the
/// base.
pub fn resolve_profile_path(
	roots: &TenantRoots,
	variant: Variant,
	tenant_id: &str,
) -> ServiceResult<PathBuf> {
	let base = match variant {
		Variant::Primary => &roots.primary_dir,
		Variant::Secondary => &roots.secondary_dir,
	};
	let mut components = Path::new(tenant_id).components();

	match (components.next(), components.next()) {
		(Some(Component::Normal(_)), None) => {},
		_ => return Err(ServiceError::PathEscape { tenant_id: tenant_id.to_string() }),
	}

	let path = base.join(tenant_id).join("profile.json");

	if !path.starts_with(base) {
		return Err(ServiceError::PathEscape { tenant_id: tenant_id.to_string() });
	}

	Ok(path)
}
