pub mod compose;
pub mod identifier;
pub mod sanitize;
pub mod scenario;
pub mod template;

pub use compose::compose_context;
pub use identifier::{IdentifierError, validate_tenant_id};
pub use sanitize::sanitize;
pub use scenario::{Scenario, classify};
pub use template::{DEFAULT_TEMPLATE, render_prompt, resolve_template};

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the two isolated deployments of a tenant's data. Each variant has
/// its own profile root directory and its own collection namespace.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
	Primary,
	Secondary,
}
impl Variant {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Primary => "primary",
			Self::Secondary => "secondary",
		}
	}
}
impl FromStr for Variant {
	type Err = IdentifierError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"primary" => Ok(Self::Primary),
			"secondary" => Ok(Self::Secondary),
			_ => Err(IdentifierError::UnknownVariant { raw: raw.to_string() }),
		}
	}
}
impl fmt::Display for Variant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
