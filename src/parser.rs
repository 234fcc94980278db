use crate::error::{Error, Result};
use crate::ir::ConceptMap;
use serde_json::Value;

/// Parses the model's reply into a [`ConceptMap`].
///
/// Models like to wrap their JSON in prose or code fences, so everything
/// outside the first `{` and the last `}` is dropped before parsing.
pub fn parse_concept_map(input: &str) -> Result<ConceptMap> {
    let json = extract_json_object(input)
        .ok_or_else(|| Error::malformed("no JSON object found in the response"))?;

    let value: Value = serde_json::from_str(json).map_err(|err| {
        tracing::warn!(%err, "concept map response is not valid JSON");
        Error::malformed(format!("invalid JSON: {err}"))
    })?;

    if !value.get("mainTopic").is_some_and(Value::is_object) {
        return Err(Error::malformed("missing required object `mainTopic`"));
    }
    if !value.get("subtopics").is_some_and(Value::is_array) {
        return Err(Error::malformed("missing required array `subtopics`"));
    }

    let map: ConceptMap = serde_json::from_value(value)
        .map_err(|err| Error::malformed(format!("unexpected field shape: {err}")))?;
    if map.main_topic.name.trim().is_empty() {
        return Err(Error::malformed("`mainTopic.name` is empty"));
    }
    tracing::debug!(
        root = %map.main_topic.name,
        subtopics = map.subtopics.len(),
        "parsed concept map"
    );
    Ok(map)
}

fn extract_json_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    if start > end {
        return None;
    }
    Some(&input[start..=end])
}
