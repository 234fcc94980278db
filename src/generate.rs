//! Request/response plumbing for the text-to-concept-map service.
//!
//! The network hop is left to a [`Transport`]: the browser host uses `fetch`,
//! native hosts plug in whatever HTTP client they already carry.

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::ir::ConceptMap;
use crate::parser::parse_concept_map;
use serde_json::{Value, json};
use url::Url;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub url: String,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    /// POSTs `body` as `application/json` and returns whatever came back.
    /// Only failures to get any response at all should be `Err`.
    fn post_json(&self, url: &str, body: &str) -> anyhow::Result<HttpResponse>;
}

impl GenerationRequest {
    pub fn new(text: &str, api_key: &str, service: &ServiceConfig) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::MissingInput {
                what: "service API key",
            });
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::MissingInput {
                what: "source text",
            });
        }

        let safety: Vec<Value> = SAFETY_CATEGORIES
            .iter()
            .map(|category| json!({"category": category, "threshold": "BLOCK_MEDIUM_AND_ABOVE"}))
            .collect();
        let body = json!({
            "contents": [{"parts": [{"text": build_prompt(text)}]}],
            "generationConfig": {
                "temperature": service.temperature,
                "maxOutputTokens": service.max_output_tokens,
            },
            "safetySettings": safety,
        });

        let url = Url::parse_with_params(&service.endpoint, [("key", api_key)]).map_err(|err| {
            Error::ServiceRequest {
                status: None,
                message: format!("invalid endpoint `{}`: {err}", service.endpoint),
            }
        })?;

        Ok(Self {
            url: url.into(),
            body,
        })
    }
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"Given the following text: "{text}", build an educational concept map.
Extract the main topic and its key subtopics so that the relationships are easy to visualise and learn.
For every topic give a bullet-point description of 100 to 150 words and one emoji that represents it.
Answer with strict, valid JSON only, shaped like:
{{
  "mainTopic": {{"name": "...", "description": "...", "emoji": "..."}},
  "subtopics": [
    {{"name": "...", "parent": "<name of an existing topic>", "description": "...", "emoji": "..."}}
  ]
}}
Every "parent" must be the exact name of the main topic or of an earlier subtopic."#
    )
}

/// Turns a raw service reply into a concept map.
pub fn interpret_response(response: &HttpResponse) -> Result<ConceptMap> {
    if !response.is_success() {
        return Err(Error::ServiceRequest {
            status: Some(response.status),
            message: summarize_error_body(&response.body),
        });
    }
    let text = extract_candidate_text(&response.body)?;
    parse_concept_map(&text)
}

/// Pulls `candidates[0].content.parts[0].text` out of a service envelope.
pub fn extract_candidate_text(body: &str) -> Result<String> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|err| Error::malformed(format!("service envelope is not JSON: {err}")))?;
    envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::malformed("service envelope has no candidate text"))
}

pub fn generate_concept_map(
    transport: &dyn Transport,
    text: &str,
    api_key: &str,
    service: &ServiceConfig,
) -> Result<ConceptMap> {
    let request = GenerationRequest::new(text, api_key, service)?;
    tracing::info!(endpoint = %service.endpoint, "requesting concept map");
    let response = transport
        .post_json(&request.url, &request.body.to_string())
        .map_err(|err| Error::ServiceRequest {
            status: None,
            message: err.to_string(),
        })?;
    interpret_response(&response)
}

fn summarize_error_body(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.trim().chars().take(200).collect(),
    }
}
