/// Turns retrieved snippets into the context block of the prompt. The
/// retriever already ranked the snippets; order is preserved and nothing is
/// deduplicated here. An empty result still yields a short brand anchor so
/// the generator never sees an empty context.
pub fn compose_context(snippets: &[String], brand: &str, slogan: &str, max_snippets: usize) -> String {
	if snippets.is_empty() {
		return format!("{brand} — {slogan}");
	}

	snippets.iter().take(max_snippets).map(String::as_str).collect::<Vec<_>>().join("\n")
}
