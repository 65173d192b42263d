use std::sync::LazyLock;

use regex::Regex;

/// Prompt fragments that should never appear in a served answer. Seeing one
/// means the generator echoed its own instructions.
const LEAK_MARKERS: [&str; 3] = ["MISSION", "VOCABULAIRE", "# "];

static BRACKETED: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\[.*?\]").expect("Bracketed-annotation regex must compile."));
static EMPHASIS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\*+\s?").expect("Emphasis regex must compile."));
static NEWLINE_RUNS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\n+").expect("Newline-run regex must compile."));
static RESPONSE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"Réponse\s*:|\*\*Réponse\s*:?\*\*").expect("Response-marker regex must compile.")
});

pub fn contains_leak_marker(text: &str) -> bool {
	LEAK_MARKERS.iter().any(|marker| text.contains(marker))
}

pub fn brand_fallback(brand: &str) -> String {
	format!(
		"Merci pour votre message. L'équipe {brand} vous répond rapidement. Contact recommandé \
		 pour devis/précisions."
	)
}

/// Deterministic cleanup of raw generated text: strip bracketed annotations
/// and emphasis runs, collapse blank lines, drop leaked instructions before
/// the last response marker, deduplicate sentences, then guard against
/// degenerate output with a brand fallback.
pub fn sanitize(raw: &str, brand: &str, min_chars: usize) -> String {
	let stripped = BRACKETED.replace_all(raw, "");
	let stripped = EMPHASIS.replace_all(&stripped, "");
	let collapsed = NEWLINE_RUNS.replace_all(&stripped, "\n").into_owned();
	let body = if contains_leak_marker(&collapsed) {
		let parts = RESPONSE_MARKER.split(&collapsed).collect::<Vec<_>>();

		if parts.len() > 1 {
			parts.last().map(|part| part.trim().to_string()).unwrap_or_default()
		} else {
			collapsed
		}
	} else {
		collapsed
	};
	let mut unique: Vec<&str> = Vec::new();

	for sentence in body.split(". ") {
		let sentence = sentence.trim();

		if sentence.is_empty() {
			continue;
		}
		if !unique.contains(&sentence) {
			unique.push(sentence);
		}
	}

	let result = unique.join(". ").trim().to_string();

	if result.chars().count() < min_chars || contains_leak_marker(&result) {
		return brand_fallback(brand);
	}

	result
}
