//! Extraction agent: two completion passes plus candidate resolution.

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::ScheduleEvent;

use super::completion::CompletionClient;
use super::normalize::{canonical_date, canonical_time_range, repair_time};
use super::parser::{parse_event_candidates, RawEventCandidate};
use super::prompt::{build_parse_prompt, PromptSet};
use super::ExtractionError;

/// Result of extracting one document.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub events: Vec<ScheduleEvent>,
    /// Share of candidates that needed no repair or fallback, 0-100.
    pub confidence: f32,
}

/// Runs the two-pass extraction over a completion client.
pub struct ExtractionAgent {
    client: Box<dyn CompletionClient>,
    prompts: PromptSet,
}

impl ExtractionAgent {
    pub fn new(client: Box<dyn CompletionClient>) -> Self {
        Self {
            client,
            prompts: PromptSet::default(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Extract events from one document.
    ///
    /// Pass 1 transcribes the raw bytes; an empty transcript is an error
    /// because there is nothing to degrade to. Pass 2 parses the
    /// transcript into candidates; a malformed payload there degrades to
    /// zero events. Candidates that cannot be resolved to a date, start
    /// time and description are dropped.
    pub fn extract(
        &self,
        document_id: Option<Uuid>,
        filename: &str,
        bytes: &[u8],
        current_date: NaiveDate,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let transcript =
            self.client
                .transcribe_document(&self.prompts.transcribe_system, filename, bytes)?;
        if transcript.trim().is_empty() {
            return Err(ExtractionError::EmptyTranscript);
        }
        tracing::debug!(filename, chars = transcript.len(), "Document transcribed");

        let parse_user = build_parse_prompt(&transcript, current_date);
        let response = self
            .client
            .complete_text(&self.prompts.parse_system, &parse_user, true)?;

        let candidates = parse_event_candidates(&response);
        let total = candidates.len();

        let mut events = Vec::new();
        let mut clean = 0usize;
        for candidate in candidates {
            if let Some((event, was_clean)) =
                resolve_candidate(candidate, document_id, filename, current_date)
            {
                events.push(event);
                if was_clean {
                    clean += 1;
                }
            }
        }

        let confidence = if total == 0 {
            100.0
        } else {
            (clean as f32 / total as f32) * 100.0
        };

        tracing::info!(
            filename,
            candidates = total,
            resolved = events.len(),
            confidence,
            "Extraction finished"
        );

        Ok(ExtractionOutcome { events, confidence })
    }
}

/// Resolve one raw candidate into a storable event.
///
/// Returns the event and whether it resolved cleanly (no time repair, no
/// date fallback). `None` means the candidate lacked a usable start time
/// or description and was dropped.
fn resolve_candidate(
    candidate: RawEventCandidate,
    document_id: Option<Uuid>,
    filename: &str,
    current_date: NaiveDate,
) -> Option<(ScheduleEvent, bool)> {
    let description = candidate.description?.trim().to_string();
    if description.is_empty() {
        return None;
    }

    let mut clean = true;

    let (start_time, start_repaired) = resolve_time(candidate.start_time.as_deref()?)?;
    clean &= !start_repaired;

    let end_time = match candidate.end_time.as_deref() {
        None => None,
        Some(raw) => match resolve_time(raw) {
            Some((t, repaired)) => {
                clean &= !repaired;
                Some(t)
            }
            // An unusable end time does not sink the event
            None => {
                clean = false;
                None
            }
        },
    };

    let event_date = match candidate
        .event_date
        .as_deref()
        .and_then(|d| canonical_date(d, Some(current_date)))
    {
        Some(date) => {
            if candidate.event_date.as_deref().map(str::trim)
                != Some(date.format("%Y-%m-%d").to_string().as_str())
            {
                clean = false;
            }
            date
        }
        // Dropping an event is worse than an approximate date
        None => {
            clean = false;
            current_date
        }
    };

    let event = ScheduleEvent::new(
        document_id,
        event_date,
        start_time,
        end_time,
        &description,
        filename,
    );
    Some((event, clean))
}

/// Resolve a raw time string, noting whether repair was needed.
fn resolve_time(raw: &str) -> Option<(NaiveTime, bool)> {
    if let Some(repaired) = repair_time(raw) {
        let needed_repair = repaired != raw.trim();
        let time = NaiveTime::parse_from_str(&repaired, "%H:%M:%S").ok()?;
        return Some((time, needed_repair));
    }
    // The model occasionally passes military tokens straight through
    canonical_time_range(raw).map(|(start, _)| (start, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::completion::{MockCompletionClient, MockFailure};

    fn agent_with(transcript: &str, parse_response: &str) -> ExtractionAgent {
        ExtractionAgent::new(Box::new(MockCompletionClient::new(
            transcript,
            parse_response,
        )))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 19).unwrap()
    }

    #[test]
    fn clean_candidates_extract_with_full_confidence() {
        let agent = agent_with(
            "ON APR. 19, 2024 @ 1540 HOURS: NOTICE OF READINESS TENDERED",
            r#"{"events": [{"event_date": "2024-04-19", "start_time": "15:40:00", "end_time": null, "description": "NOTICE OF READINESS TENDERED"}]}"#,
        );

        let outcome = agent
            .extract(None, "sof.pdf", b"%PDF", today())
            .unwrap();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.confidence, 100.0);

        let event = &outcome.events[0];
        assert_eq!(event.event_date.to_string(), "2024-04-19");
        assert_eq!(event.start_time.to_string(), "15:40:00");
        assert_eq!(event.end_time, None);
        assert_eq!(event.description, "NOTICE OF READINESS TENDERED");
        assert_eq!(event.source_pdf, "sof.pdf");
    }

    #[test]
    fn range_event_keeps_both_times() {
        let agent = agent_with(
            "doc",
            r#"{"events": [{"event_date": "2024-04-20", "start_time": "17:24:00", "end_time": "18:30:00", "description": "VESSEL DEPARTED"}]}"#,
        );

        let outcome = agent.extract(None, "sof.pdf", b"%PDF", today()).unwrap();
        let event = &outcome.events[0];
        assert_eq!(event.event_date.to_string(), "2024-04-20");
        assert_eq!(event.start_time.to_string(), "17:24:00");
        assert_eq!(event.end_time.map(|t| t.to_string()).as_deref(), Some("18:30:00"));
    }

    #[test]
    fn five_char_times_repaired_and_lower_confidence() {
        let agent = agent_with(
            "doc",
            r#"{"events": [{"event_date": "2024-04-19", "start_time": "09:00", "description": "PILOT ON BOARD"}]}"#,
        );

        let outcome = agent.extract(None, "sof.pdf", b"%PDF", today()).unwrap();
        assert_eq!(outcome.events[0].start_time.to_string(), "09:00:00");
        assert!(outcome.confidence < 100.0);
    }

    #[test]
    fn missing_date_falls_back_to_current_date() {
        let agent = agent_with(
            "doc",
            r#"{"events": [{"start_time": "15:40:00", "description": "ANCHORED"}]}"#,
        );

        let outcome = agent.extract(None, "sof.pdf", b"%PDF", today()).unwrap();
        assert_eq!(outcome.events[0].event_date, today());
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn candidate_without_start_time_is_dropped() {
        let agent = agent_with(
            "doc",
            r#"{"events": [
                {"event_date": "2024-04-19", "description": "NO TIME"},
                {"event_date": "2024-04-19", "start_time": "15:40:00", "description": "KEPT"}
            ]}"#,
        );

        let outcome = agent.extract(None, "sof.pdf", b"%PDF", today()).unwrap();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].description, "KEPT");
    }

    #[test]
    fn missing_events_key_yields_zero_events() {
        let agent = agent_with("doc", r#"{"summary": "nothing here"}"#);
        let outcome = agent.extract(None, "sof.pdf", b"%PDF", today()).unwrap();
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.confidence, 100.0);
    }

    #[test]
    fn empty_transcript_is_an_error() {
        let agent = agent_with("   ", r#"{"events": []}"#);
        let err = agent.extract(None, "sof.pdf", b"%PDF", today()).unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyTranscript));
    }

    #[test]
    fn rate_limit_propagates() {
        let agent =
            ExtractionAgent::new(Box::new(MockCompletionClient::failing(MockFailure::RateLimited)));
        let err = agent.extract(None, "sof.pdf", b"%PDF", today()).unwrap_err();
        assert!(matches!(err, ExtractionError::RateLimited));
    }

    #[test]
    fn document_id_is_stamped_on_events() {
        let doc_id = Uuid::new_v4();
        let agent = agent_with(
            "doc",
            r#"{"events": [{"event_date": "2024-04-19", "start_time": "15:40:00", "description": "NOR"}]}"#,
        );
        let outcome = agent
            .extract(Some(doc_id), "sof.pdf", b"%PDF", today())
            .unwrap();
        assert_eq!(outcome.events[0].document_id, Some(doc_id));
    }
}
