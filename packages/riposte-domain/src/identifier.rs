pub const MAX_TENANT_ID_LEN: usize = 64;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IdentifierError {
	InvalidTenantId { raw: String },
	UnknownVariant { raw: String },
}
impl std::fmt::Display for IdentifierError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidTenantId { raw } => write!(f, "Invalid tenant id {raw:?}."),
			Self::UnknownVariant { raw } => {
				write!(f, "Unknown variant {raw:?}; expected primary or secondary.")
			},
		}
	}
}
impl std::error::Error for IdentifierError {}

/// Accepts only safe identifiers (1-64 chars of `[A-Za-z0-9_-]`). Anything
/// else is rejected before it can reach tenant storage paths.
pub fn validate_tenant_id(raw: &str) -> Result<&str, IdentifierError> {
	if raw.is_empty() || raw.len() > MAX_TENANT_ID_LEN {
		return Err(IdentifierError::InvalidTenantId { raw: raw.to_string() });
	}
	if !raw.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-')) {
		return Err(IdentifierError::InvalidTenantId { raw: raw.to_string() });
	}

	Ok(raw)
}
