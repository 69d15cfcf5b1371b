use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    #[error("completion API key is not configured")]
    MissingCredential,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("completion API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("completion API returned no text")]
    EmptyResponse,
}

impl AssistError {
    /// Text shown in the transcript in place of a reply.
    pub fn user_message(&self) -> &'static str {
        match self {
            AssistError::MissingCredential => {
                "API key not configured. Please add GEMINI_API_KEY to your environment variables."
            }
            AssistError::Network(_) => {
                "Sorry, I encountered an error. Please check your internet connection and try again."
            }
            AssistError::Api { .. } => {
                "Sorry, the writing assistant is unavailable right now. Please try again later."
            }
            AssistError::EmptyResponse => {
                "Sorry, I couldn't come up with a response. Try rephrasing your request."
            }
        }
    }
}

/// A hosted text-completion service.
#[async_trait]
pub trait CompletionEndpoint: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AssistError>;
}

/// Wraps the raw user message in the writing-assistant instructions.
pub fn build_prompt(message: &str) -> String {
    format!(
        "You are an AI writing assistant helping users create better articles.\n\
         The user asked: \"{message}\"\n\n\
         Please provide helpful, concise advice for article writing. Keep responses practical and actionable.\n\
         If the user asks for content generation, provide high-quality, original content.\n\
         If they ask for improvements, be specific about what could be better.\n\
         Focus on clarity, engagement, and readability."
    )
}

#[derive(Debug, Clone)]
pub struct AssistConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl AssistConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: AssistConfig,
}

impl GeminiClient {
    pub fn new(config: AssistConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl CompletionEndpoint for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, AssistError> {
        let Some(key) = self.config.api_key.as_deref() else {
            return Err(AssistError::MissingCredential);
        };

        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };
        debug!(model = %self.config.model, "requesting completion");
        let resp = self
            .client
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            warn!(%status, %message, "completion request rejected");
            return Err(AssistError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        parsed.into_text().ok_or(AssistError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_raw_message() {
        let prompt = build_prompt("give me an outline about \"Mars\"");
        assert!(prompt.starts_with("You are an AI writing assistant"));
        assert!(prompt.contains("The user asked: \"give me an outline about \"Mars\"\""));
    }

    #[test]
    fn each_failure_kind_has_fixed_text() {
        let api = AssistError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert!(AssistError::MissingCredential
            .user_message()
            .contains("GEMINI_API_KEY"));
        assert!(!api.user_message().contains("boom"));
        assert_ne!(api.user_message(), AssistError::EmptyResponse.user_message());
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}},
                {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("Hello there"));
    }

    #[test]
    fn blocked_response_has_no_text() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(parsed.into_text().is_none());
        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_text().is_none());
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(AssistConfig {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            base_url: "http://127.0.0.1:9".into(),
        });
        let err = client.complete("hi").await.unwrap_err();
        assert!(matches!(err, AssistError::MissingCredential));
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(AssistConfig {
            api_key: Some("k".into()),
            model: "gemini-pro".into(),
            base_url: "http://localhost:1234".into(),
        });
        assert_eq!(
            client.endpoint(),
            "http://localhost:1234/v1beta/models/gemini-pro:generateContent"
        );
    }
}
