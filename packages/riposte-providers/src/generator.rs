use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Invokes the configured generation backend with a single prompt. The two
/// supported wire shapes are "chat" (OpenAI-style messages array) and
/// "completion" (single prompt string, e.g. a local Ollama server). The
/// request itself is bounded by the configured timeout; the serving layer
/// adds its own outer deadline on top.
pub async fn generate(cfg: &riposte_config::GeneratorConfig, prompt: &str) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = match cfg.kind.as_str() {
		"chat" => serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"max_tokens": cfg.max_tokens,
			"messages": [{ "role": "user", "content": prompt }],
		}),
		_ => serde_json::json!({
			"model": cfg.model,
			"prompt": prompt,
			"stream": false,
			"options": {
				"temperature": cfg.temperature,
				"num_predict": cfg.max_tokens,
			},
		}),
	};
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	match cfg.kind.as_str() {
		"chat" => parse_chat_response(json),
		_ => parse_completion_response(json),
	}
}

fn parse_chat_response(json: Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(|content| content.to_string())
		.ok_or_else(|| eyre::eyre!("Chat response is missing message content."))
}

fn parse_completion_response(json: Value) -> Result<String> {
	if let Some(response) = json.get("response").and_then(|v| v.as_str()) {
		return Ok(response.to_string());
	}
	if let Some(text) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("text"))
		.and_then(|t| t.as_str())
	{
		return Ok(text.to_string());
	}

	Err(eyre::eyre!("Completion response is missing generated text."))
}
