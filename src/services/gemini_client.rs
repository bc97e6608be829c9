//! Gemini generative backend client
//!
//! Issues `generateContent` calls with an optional inline image and an
//! expect-JSON mode (`response_mime_type = "application/json"`). Candidate
//! parts are concatenated into one text blob; an empty result is an error.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{BackendError, GenerateRequest, GenerativeBackend};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
}

// ---- wire types -----------------------------------------------------------

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

// ---- client ---------------------------------------------------------------

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            model,
        })
    }

    fn build_body(&self, request: &GenerateRequest) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);

        if let Some(image) = &request.image {
            parts.push(Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: "image/jpeg".to_string(),
                    data: base64::engine::general_purpose::STANDARD.encode(image.as_bytes()),
                }),
            });
        }

        parts.push(Part {
            text: Some(request.prompt.clone()),
            inline_data: None,
        });

        GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: request.expect_json.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, BackendError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );
        let body = self.build_body(&request);

        tracing::debug!(
            model = %self.model,
            has_image = request.image.is_some(),
            expect_json = request.expect_json,
            "Querying Gemini API"
        );

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(status.as_u16(), error_text));
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        // Concatenate every text part of every candidate, one per line.
        let mut text = String::new();
        for candidate in &generated.candidates {
            if let Some(content) = &candidate.content {
                for part in &content.parts {
                    if let Some(t) = &part.text {
                        text.push_str(t);
                        text.push('\n');
                    }
                }
            }
        }

        if text.trim().is_empty() {
            return Err(BackendError::Empty(
                "no content generated by Gemini".to_string(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImagePayload;

    #[test]
    fn client_creation() {
        let client = GeminiClient::new("test-key".to_string(), "gemini-1.5-pro".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn body_places_image_before_prompt() {
        let client =
            GeminiClient::new("test-key".to_string(), "gemini-1.5-pro".to_string()).unwrap();
        let request = GenerateRequest::with_image(
            "identify the food",
            ImagePayload::new(vec![0xFF, 0xD8, 0xFF]),
        )
        .expecting_json();

        let body = client.build_body(&request);
        let json = serde_json::to_value(&body.contents[0].parts).unwrap();

        assert!(json[0]["inlineData"]["data"].is_string());
        assert_eq!(json[1]["text"], "identify the food");
        assert_eq!(
            body.generation_config.unwrap().response_mime_type,
            "application/json"
        );
    }

    #[test]
    fn text_only_body_has_no_generation_config() {
        let client =
            GeminiClient::new("test-key".to_string(), "gemini-1.5-pro".to_string()).unwrap();
        let body = client.build_body(&GenerateRequest::text("a prompt"));
        assert_eq!(body.contents[0].parts.len(), 1);
        assert!(body.generation_config.is_none());
    }

    #[test]
    fn response_parts_concatenate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let candidate = &parsed.candidates[0];
        let parts = &candidate.content.as_ref().unwrap().parts;
        assert_eq!(parts.len(), 2);
    }
}
