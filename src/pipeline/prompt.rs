//! Instruction sets for the two extraction passes.
//!
//! Pass 1 transcribes the uploaded document to plain text. Pass 2 turns
//! that text into event candidates. Both instruction sets are plain
//! configuration so deployments can tune wording without a rebuild.

use chrono::NaiveDate;

/// System instructions for the transcription pass.
pub const DEFAULT_TRANSCRIBE_SYSTEM: &str = "\
You are a document transcription engine for maritime and port operation \
records (statements of facts, port logs, operation schedules). Transcribe \
the attached document to plain text, preserving reading order. Reproduce \
every date and time token exactly as written, including military times \
like 1540, ranges like 1724-1830, HRS/HOURS suffixes, and date headings \
such as APRIL 20, 2024. Do not summarize, interpret, or omit lines.";

/// System instructions for the event parsing pass.
pub const DEFAULT_PARSE_SYSTEM: &str = "\
You extract dated operational events from transcribed schedule documents. \
Respond with a single JSON object of the form \
{\"events\": [{\"event_date\": \"YYYY-MM-DD\", \"start_time\": \"HH:MM:SS\", \
\"end_time\": \"HH:MM:SS\" or null, \"description\": \"...\"}]}. \
Rules: a date heading applies to every following line until the next \
heading; convert military times (1540 means 15:40:00); a range like \
1724-1830 gives start_time and end_time; a single time leaves end_time \
null; when a date has no year, use the year of the current date you are \
given; keep descriptions verbatim from the document. If the document \
contains no events, respond with {\"events\": []}.";

/// Instruction sets used by the extraction agent.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub transcribe_system: String,
    pub parse_system: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            transcribe_system: DEFAULT_TRANSCRIBE_SYSTEM.to_string(),
            parse_system: DEFAULT_PARSE_SYSTEM.to_string(),
        }
    }
}

/// User message for the parsing pass: current date context plus the
/// transcript from pass 1.
pub fn build_parse_prompt(transcript: &str, current_date: NaiveDate) -> String {
    format!(
        "Current date: {current_date}\n\nTranscribed document:\n\n{transcript}"
    )
}

/// User message accompanying the attached document in the transcription
/// pass.
pub fn build_transcribe_prompt(filename: &str) -> String {
    format!("Transcribe the attached document ({filename}) to plain text.")
}
