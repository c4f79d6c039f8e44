use serde_json::Value;

use super::ProposerError;
use crate::workflows::planning::domain::RawCandidate;

/// Pull the candidate list out of free-form proposer text.
///
/// The first balanced `{ ... }` block is parsed as JSON and its
/// `recommendations` array read entry by entry. Entries that are not objects
/// are skipped; a missing array is an empty proposal, not an error.
pub fn parse_response(text: &str) -> Result<Vec<RawCandidate>, ProposerError> {
    let block = first_json_object(text)
        .ok_or_else(|| ProposerError::Malformed("no JSON object in response".to_string()))?;
    let document: Value = serde_json::from_str(block)
        .map_err(|err| ProposerError::Malformed(err.to_string()))?;

    let recommendations = match document.get("recommendations") {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(_) => {
            return Err(ProposerError::Malformed(
                "recommendations is not a list".to_string(),
            ))
        }
    };

    Ok(recommendations
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| serde_json::from_value::<RawCandidate>(item.clone()).ok())
        .collect())
}

fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
