use serde::Deserialize;

/// One event candidate as emitted by the parsing pass, before
/// normalization. Every field is optional here; validation happens in the
/// agent.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEventCandidate {
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
}

/// Parse the parsing pass response into raw candidates.
///
/// A payload that is not a JSON object, or one without an `events` key,
/// yields an empty set rather than an error: the model legitimately
/// returns nothing for documents with no events, and a malformed shape
/// must not fail the whole run. Individual malformed array items are
/// skipped.
pub fn parse_event_candidates(response: &str) -> Vec<RawEventCandidate> {
    #[derive(Deserialize)]
    struct ParseResponse {
        events: Option<Vec<serde_json::Value>>,
    }

    let stripped = strip_code_fence(response);

    let parsed: ParseResponse = match serde_json::from_str(stripped) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable extraction payload, treating as empty");
            return vec![];
        }
    };

    parse_array_lenient(parsed.events.as_deref())
}

/// Strip a surrounding ```json fence if the model wrapped its output.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse an array leniently — skip items that fail to deserialize.
fn parse_array_lenient<T: for<'de> Deserialize<'de>>(
    items: Option<&[serde_json::Value]>,
) -> Vec<T> {
    match items {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
    }
}
