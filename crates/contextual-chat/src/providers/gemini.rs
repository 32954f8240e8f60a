//! Gemini API client for URL-grounded answers
//!
//! Streams answers with the URL context tool enabled and asks for quick-start
//! suggestions with a JSON response schema.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;

use super::llm::{GroundedModel, ResponseStream};
use super::sse::SseDecoder;
use crate::config::GeminiConfig;
use crate::error::{Error, Result};
use crate::generation::prompt::{PromptBuilder, EMPTY_GROUP_SUGGESTION};
use crate::types::grounding::{Content, GenerateContentResponse};

const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Gemini client, built once from a validated configuration
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    safety_threshold: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    safety_settings: Vec<SafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SuggestionsPayload {
    suggestions: Vec<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl GeminiClient {
    /// Create a client, failing fast on an unusable configuration
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Gemini client initialized (model: {})", config.model);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            safety_threshold: config.safety_threshold.clone(),
        })
    }

    /// Endpoint URL for a model method such as `generateContent`
    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    fn safety_settings(&self) -> Vec<SafetySetting> {
        SAFETY_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: self.safety_threshold.clone(),
            })
            .collect()
    }

    fn grounded_request(&self, prompt: &str, urls: &[String]) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content::user_text(PromptBuilder::with_url_context(prompt, urls))],
            tools: vec![json!({ "urlContext": {} })],
            safety_settings: self.safety_settings(),
            generation_config: None,
        }
    }

    fn suggestions_request(&self, urls: &[String]) -> GenerateRequest {
        // Tools cannot be combined with a JSON response type.
        GenerateRequest {
            contents: vec![Content::user_text(PromptBuilder::suggestions(urls))],
            tools: Vec::new(),
            safety_settings: self.safety_settings(),
            generation_config: Some(json!({
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "suggestions": {
                            "type": "ARRAY",
                            "items": {
                                "type": "STRING",
                                "description": "A concise and actionable question a developer might ask."
                            }
                        }
                    },
                    "required": ["suggestions"]
                }
            })),
        }
    }

    async fn post(&self, url: &str, request: &GenerateRequest) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(500).collect();
            tracing::error!("Gemini error {}: {}", status, preview);
            return Err(classify_api_error(status, &body));
        }

        Ok(response)
    }
}

/// Map an unsuccessful API response onto the crate's error kinds
fn classify_api_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string());

    if message.contains("API key not valid") {
        Error::InvalidApiKey
    } else if message.contains("quota") {
        Error::QuotaExceeded
    } else {
        Error::llm(format!("Gemini API error ({}): {}", status, message))
    }
}

fn decode_frame(data: &str) -> Result<GenerateContentResponse> {
    serde_json::from_str(data)
        .map_err(|e| Error::llm(format!("Failed to parse Gemini stream frame: {}", e)))
}

struct FrameState {
    bytes: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

/// Turn an SSE byte stream into decoded response frames
fn frame_stream(bytes: BoxStream<'static, reqwest::Result<bytes::Bytes>>) -> ResponseStream {
    let state = FrameState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.pending.pop_front() {
                return Some((decode_frame(&data), state));
            }
            if state.done {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(Error::Http(e)), state));
                }
                None => {
                    state.done = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl GroundedModel for GeminiClient {
    async fn stream_with_url_context(&self, prompt: &str, urls: &[String]) -> Result<ResponseStream> {
        let request = self.grounded_request(prompt, urls);
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));

        tracing::info!("Gemini stream request (model: {}, urls: {})", self.model, urls.len());
        let response = self.post(&url, &request).await?;

        Ok(frame_stream(response.bytes_stream().boxed()))
    }

    async fn initial_suggestions(&self, urls: &[String]) -> Result<Vec<String>> {
        if urls.is_empty() {
            return Ok(vec![EMPTY_GROUP_SUGGESTION.to_string()]);
        }

        let request = self.suggestions_request(urls);
        let response = self.post(&self.endpoint("generateContent"), &request).await?;
        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse Gemini response: {}", e)))?;

        let payload: SuggestionsPayload = serde_json::from_str(&body.text())?;
        tracing::debug!("Received {} suggestions", payload.suggestions.len());
        Ok(payload.suggestions)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            api_key: "test-key".into(),
            base_url: "https://example.test/v1beta/".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_construction_requires_api_key() {
        let err = GeminiClient::new(&GeminiConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            client().endpoint("generateContent"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_grounded_request_body() {
        let urls = vec!["https://a.com".to_string()];
        let body = serde_json::to_value(client().grounded_request("Why?", &urls)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "Why?\n\nRelevant URLs for context:\nhttps://a.com"
        );
        assert_eq!(body["tools"], json!([{ "urlContext": {} }]));
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_suggestions_request_uses_json_schema_without_tools() {
        let urls = vec!["https://a.com".to_string()];
        let body = serde_json::to_value(client().suggestions_request(&urls)).unwrap();

        assert!(body.get("tools").is_none());
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["suggestions"])
        );
    }

    #[test]
    fn test_classify_api_errors() {
        let invalid_key = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            classify_api_error(StatusCode::BAD_REQUEST, invalid_key),
            Error::InvalidApiKey
        ));

        let quota = r#"{"error":{"code":429,"message":"You exceeded your current quota","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            classify_api_error(StatusCode::TOO_MANY_REQUESTS, quota),
            Error::QuotaExceeded
        ));

        match classify_api_error(StatusCode::INTERNAL_SERVER_ERROR, "upstream down") {
            Error::Llm(msg) => assert!(msg.contains("upstream down") && msg.contains("500")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_frame_stream_decodes_split_events() {
        let parts: Vec<reqwest::Result<bytes::Bytes>> = vec![
            Ok(bytes::Bytes::from_static(
                b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel",
            )),
            Ok(bytes::Bytes::from_static(
                b"lo\"}]}}]}\r\n\r\ndata: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" there\"}]}}]}",
            )),
        ];
        let frames: Vec<Result<GenerateContentResponse>> =
            frame_stream(stream::iter(parts).boxed()).collect().await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap().text(), "Hello");
        assert_eq!(frames[1].as_ref().unwrap().text(), " there");
    }

    #[tokio::test]
    async fn test_suggestions_for_empty_group_skip_request() {
        let suggestions = client().initial_suggestions(&[]).await.unwrap();
        assert_eq!(suggestions, vec![EMPTY_GROUP_SUGGESTION.to_string()]);
    }
}
