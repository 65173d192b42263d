/// Placeholders a custom tenant template must carry to be usable. Presence
/// is the only check; extra placeholders pass through unresolved.
pub const REQUIRED_PLACEHOLDERS: [&str; 4] =
	["{brand_name}", "{context}", "{question}", "{scenario}"];

pub const DEFAULT_TEMPLATE: &str = "Tu es l'assistant de {brand_name}.

CONTEXTE:
{context}

CLIENT DIT: \"{question}\"

SITUATION: {scenario}

Mission: Réponds en 2-3 phrases claires, professionnelles et orientées solution. Termine par un \
                                    appel à l'action (contact, devis, etc.).
Réponse:";

/// Picks the tenant's custom template when it carries all four required
/// placeholders, otherwise the default.
pub fn resolve_template(custom: Option<&str>) -> &str {
	match custom {
		Some(template)
			if REQUIRED_PLACEHOLDERS
				.iter()
				.all(|placeholder| template.contains(placeholder)) =>
			template,
		_ => DEFAULT_TEMPLATE,
	}
}

pub fn render_prompt(
	template: &str,
	brand: &str,
	context: &str,
	question: &str,
	scenario: &str,
) -> String {
	template
		.replace("{brand_name}", brand)
		.replace("{context}", context)
		.replace("{question}", question)
		.replace("{scenario}", scenario)
}
