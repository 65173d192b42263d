const URGENCY_KEYWORDS: [&str; 4] = ["urgent", "demain", "crise", "last minute"];
const QUOTE_KEYWORDS: [&str; 4] = ["prix", "devis", "budget", "tarif"];
const REFERENCES_KEYWORDS: [&str; 3] = ["référence", "reference", "portfolio"];

/// Situational tag injected into the prompt. Classification is keyword
/// priority order: urgency beats quote beats references.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scenario {
	Urgency,
	Quote,
	References,
	General,
}
impl Scenario {
	pub fn label(&self) -> &'static str {
		match self {
			Self::Urgency => "Urgence",
			Self::Quote => "Devis",
			Self::References => "Références",
			Self::General => "Question générale",
		}
	}
}

pub fn classify(text: &str) -> Scenario {
	let lowered = text.to_lowercase();

	if URGENCY_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
		return Scenario::Urgency;
	}
	if QUOTE_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
		return Scenario::Quote;
	}
	if REFERENCES_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
		return Scenario::References;
	}

	Scenario::General
}
