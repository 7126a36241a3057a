// =============================================================================
// GEMINI CLASSIFIER - text safety verdicts from Google AI Studio
// =============================================================================
//
// Implements `ContentClassifier` on top of the Gemini generateContent
// endpoint (https://ai.google.dev/api/generate-content).
//
// The request pins the answer shape with `responseMimeType: application/json`
// and a `responseSchema` of `{ safe: boolean, reason: string }`, so the text
// at `candidates[0].content.parts[0].text` is itself a JSON verdict.
//
// Every failure here (transport, HTTP status, blocked candidate, malformed
// JSON) is reported as `ClassifierError::Transient`. Whether to retry and
// what to do when retries run out is the pipeline's call, not ours.
//
// **Environment Variables:**
// - `GEMINI_API_KEY` - API key from https://aistudio.google.com/apikey
// - `GEMINI_MODEL` - Model name (default: `gemini-2.5-flash`)

use crate::core::moderation::{ClassifierError, ClassifierVerdict, ContentClassifier};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

/// See: https://ai.google.dev/api/generate-content#generationconfig
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[allow(dead_code)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

// =============================================================================
// CLASSIFIER
// =============================================================================

pub struct GeminiClassifier {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClassifier {
    /// `request_timeout` bounds the HTTP exchange itself; the pipeline applies
    /// its own per-attempt deadline on top.
    pub fn new(api_key: String, model: String, request_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn response_schema() -> serde_json::Value {
        json!({
            "type": "OBJECT",
            "description": "Content moderation response",
            "properties": {
                "safe": {
                    "type": "BOOLEAN",
                    "description": "Whether the content is safe or not"
                },
                "reason": {
                    "type": "STRING",
                    "description": "Short explanation of the safety determination"
                }
            },
            "required": ["safe", "reason"]
        })
    }

    fn build_request(text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(format!(
                        "Analyze the following text for safety and moderation: \"{}\"",
                        text
                    )),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: Self::response_schema(),
                temperature: 0.0,
            },
        }
    }

    /// Pull the JSON verdict out of a generateContent response body.
    fn parse_verdict(body: &str) -> Result<ClassifierVerdict, ClassifierError> {
        let response: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| ClassifierError::Transient(format!("unreadable Gemini response: {e}")))?;

        let text = response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.parts.iter().find_map(|p| p.text.as_deref()))
            .ok_or_else(|| {
                ClassifierError::Transient(
                    "no content in Gemini response - the prompt may have been blocked".to_string(),
                )
            })?;

        serde_json::from_str::<ClassifierVerdict>(text.trim())
            .map_err(|e| ClassifierError::Transient(format!("malformed verdict JSON: {e}")))
    }

    fn describe_http_error(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<GeminiErrorResponse>(body) {
            Ok(error_response) => {
                format!("Gemini API error ({}): {}", status, error_response.error.message)
            }
            Err(_) => format!("Gemini API error: {} - {}", status, body),
        }
    }
}

#[async_trait]
impl ContentClassifier for GeminiClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError> {
        // Never log the URL: it carries the API key
        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, self.model, self.api_key
        );
        let request = Self::build_request(text);

        tracing::debug!(model = %self.model, chars = text.len(), "Gemini classify request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifierError::Transient(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClassifierError::Transient(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(ClassifierError::Transient(Self::describe_http_error(
                status, &body,
            )));
        }

        let verdict = Self::parse_verdict(&body)?;
        tracing::debug!(safe = verdict.safe, "Gemini verdict received");
        Ok(verdict)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    #[test]
    fn test_request_serialization() {
        let request = GeminiClassifier::build_request("hello world");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            json["generationConfig"]["responseSchema"]["required"],
            json!(["safe", "reason"])
        );
        let prompt = json["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("\"hello world\""));
        assert_eq!(json["contents"][0]["role"], "user");
    }

    #[test]
    fn test_model_is_reported_as_configured() {
        let classifier = GeminiClassifier::new(
            "key".to_string(),
            DEFAULT_MODEL.to_string(),
            Duration::from_secs(5),
        );
        assert_eq!(classifier.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_parse_safe_verdict() {
        let body = wrap(r#"{"safe": true, "reason": "friendly greeting"}"#);
        let verdict = GeminiClassifier::parse_verdict(&body).unwrap();
        assert_eq!(verdict, ClassifierVerdict::safe("friendly greeting"));
    }

    #[test]
    fn test_parse_unsafe_verdict_is_success() {
        let body = wrap(r#"{"safe": false, "reason": "harassment"}"#);
        let verdict = GeminiClassifier::parse_verdict(&body).unwrap();
        assert!(!verdict.safe);
        assert_eq!(verdict.reason, "harassment");
    }

    #[test]
    fn test_missing_reason_defaults_to_empty() {
        let body = wrap(r#"{"safe": true}"#);
        let verdict = GeminiClassifier::parse_verdict(&body).unwrap();
        assert!(verdict.safe);
        assert!(verdict.reason.is_empty());
    }

    #[test]
    fn test_blocked_or_malformed_responses_are_transient() {
        let blocked = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert!(matches!(
            GeminiClassifier::parse_verdict(blocked),
            Err(ClassifierError::Transient(_))
        ));

        let not_json = wrap("I think this is fine");
        assert!(matches!(
            GeminiClassifier::parse_verdict(&not_json),
            Err(ClassifierError::Transient(_))
        ));

        assert!(matches!(
            GeminiClassifier::parse_verdict("<html>502</html>"),
            Err(ClassifierError::Transient(_))
        ));
    }

    #[test]
    fn test_http_error_uses_api_message() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let msg =
            GeminiClassifier::describe_http_error(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert!(msg.contains("429"));
        assert!(msg.contains("Quota exceeded"));

        let msg = GeminiClassifier::describe_http_error(
            reqwest::StatusCode::BAD_GATEWAY,
            "upstream down",
        );
        assert!(msg.contains("upstream down"));
    }
}
