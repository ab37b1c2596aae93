use base64::Engine;
use serde::{Deserialize, Serialize};

use super::prompt::build_transcribe_prompt;
use super::ExtractionError;

/// Chat-completion client abstraction (allows mocking).
pub trait CompletionClient: Send + Sync {
    /// Text-only completion. `json_response` requests a JSON object body.
    fn complete_text(
        &self,
        system: &str,
        user: &str,
        json_response: bool,
    ) -> Result<String, ExtractionError>;

    /// Completion over an attached document (sent inline, base64).
    fn transcribe_document(
        &self,
        system: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, ExtractionError>;
}

/// HTTP client for an OpenAI-style chat-completions endpoint.
pub struct HttpCompletionClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpCompletionClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractionError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    fn send(&self, body: &ChatRequest<'_>) -> Result<String, ExtractionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_connect() {
                ExtractionError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                ExtractionError::Timeout(self.timeout_secs)
            } else {
                ExtractionError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_upstream_error(status.as_u16(), body));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExtractionError::MalformedResponse("no completion choice".into()))
    }
}

/// Map a non-2xx completion response to the error the caller should see.
///
/// 429 is a rate limit unless the body names a quota problem; 402 is
/// always quota exhaustion. Everything else stays a generic upstream
/// failure carrying status and body.
fn classify_upstream_error(status: u16, body: String) -> ExtractionError {
    match status {
        429 if body.to_ascii_lowercase().contains("quota") => ExtractionError::QuotaExhausted,
        429 => ExtractionError::RateLimited,
        402 => ExtractionError::QuotaExhausted,
        _ => ExtractionError::Upstream { status, body },
    }
}

impl CompletionClient for HttpCompletionClient {
    fn complete_text(
        &self,
        system: &str,
        user: &str,
        json_response: bool,
    ) -> Result<String, ExtractionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(system),
                },
                Message {
                    role: "user",
                    content: MessageContent::Text(user),
                },
            ],
            response_format: json_response.then_some(ResponseFormat { kind: "json_object" }),
        };
        self.send(&body)
    }

    fn transcribe_document(
        &self,
        system: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, ExtractionError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let file_data = format!("data:application/pdf;base64,{encoded}");
        let user_text = build_transcribe_prompt(filename);

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(system),
                },
                Message {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text { text: &user_text },
                        ContentPart::File {
                            file: FilePart {
                                filename,
                                file_data,
                            },
                        },
                    ]),
                },
            ],
            response_format: None,
        };
        self.send(&body)
    }
}

/// Request body for /v1/chat/completions
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    File { file: FilePart<'a> },
}

#[derive(Serialize)]
struct FilePart<'a> {
    filename: &'a str,
    file_data: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Response body from /v1/chat/completions
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Failure mode a `MockCompletionClient` should simulate.
#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    RateLimited,
    QuotaExhausted,
    Upstream(u16),
}

/// Mock completion client for testing — returns configurable responses.
pub struct MockCompletionClient {
    transcript: String,
    parse_response: String,
    failure: Option<MockFailure>,
}

impl MockCompletionClient {
    pub fn new(transcript: &str, parse_response: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            parse_response: parse_response.to_string(),
            failure: None,
        }
    }

    pub fn failing(failure: MockFailure) -> Self {
        Self {
            transcript: String::new(),
            parse_response: String::new(),
            failure: Some(failure),
        }
    }

    fn fail(&self) -> Option<ExtractionError> {
        self.failure.map(|f| match f {
            MockFailure::RateLimited => ExtractionError::RateLimited,
            MockFailure::QuotaExhausted => ExtractionError::QuotaExhausted,
            MockFailure::Upstream(status) => ExtractionError::Upstream {
                status,
                body: "upstream failure".into(),
            },
        })
    }
}

impl CompletionClient for MockCompletionClient {
    fn complete_text(
        &self,
        _system: &str,
        _user: &str,
        _json_response: bool,
    ) -> Result<String, ExtractionError> {
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(self.parse_response.clone())
    }

    fn transcribe_document(
        &self,
        _system: &str,
        _filename: &str,
        _bytes: &[u8],
    ) -> Result<String, ExtractionError> {
        if let Some(err) = self.fail() {
            return Err(err);
        }
        Ok(self.transcript.clone())
    }
}
