//! Wire records returned by the model API
//!
//! Everything here mirrors the `generateContent` response shape. Fields are
//! optional because the API omits them freely. A malformed list entry becomes
//! an empty placeholder at its position, so a single bad record never fails a
//! whole streamed frame and later processing still sees every entry.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One (possibly partial) response frame from the model API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, with all text parts concatenated
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(Content::text)
            .unwrap_or_default()
    }

    /// Grounding metadata of the first candidate, if any
    pub fn grounding_metadata(&self) -> Option<&GroundingMetadata> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
    }

    /// Reason the prompt was blocked, if the API refused it outright
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// Role-tagged content made of parts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// User-role content holding a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }

    /// Concatenated text of every text part
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Grounding information attached to a candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    /// Retrieved sources; identity is the position in this list
    #[serde(default, deserialize_with = "positional_vec")]
    pub grounding_chunks: Vec<GroundingChunk>,
    /// Spans of the answer attributed to a chunk
    #[serde(default, deserialize_with = "positional_vec")]
    pub grounding_attributions: Vec<GroundingAttribution>,
}

/// A retrieved source (SourceChunk)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<ChunkReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_context: Option<ChunkReference>,
}

impl GroundingChunk {
    /// Chunk pointing at a web URI
    pub fn web(uri: impl Into<String>) -> Self {
        Self {
            web: Some(ChunkReference::new(uri)),
            retrieved_context: None,
        }
    }

    /// Chunk pointing at a retrieved-context URI
    pub fn retrieved(uri: impl Into<String>) -> Self {
        Self {
            web: None,
            retrieved_context: Some(ChunkReference::new(uri)),
        }
    }

    /// Source URI: the web URI when present and non-empty, else the
    /// retrieved-context URI under the same condition
    pub fn uri(&self) -> Option<&str> {
        self.web
            .as_ref()
            .and_then(ChunkReference::non_empty_uri)
            .or_else(|| {
                self.retrieved_context
                    .as_ref()
                    .and_then(ChunkReference::non_empty_uri)
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ChunkReference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            title: None,
        }
    }

    fn non_empty_uri(&self) -> Option<&str> {
        self.uri.as_deref().filter(|u| !u.is_empty())
    }
}

/// A span of the answer attributed to a chunk (Attribution)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingAttribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<AttributionSourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<AttributionContent>,
}

impl GroundingAttribution {
    /// Attribution of a text span to the chunk at `chunk_index`
    pub fn new(content: impl Into<String>, chunk_index: i64) -> Self {
        Self {
            source_id: Some(AttributionSourceId {
                chunk_index: Some(chunk_index),
            }),
            content: Some(AttributionContent::Text(content.into())),
        }
    }

    pub fn chunk_index(&self) -> Option<i64> {
        self.source_id.as_ref().and_then(|s| s.chunk_index)
    }

    /// Attributed text; `None` only when the content field is absent
    pub fn content_text(&self) -> Option<String> {
        self.content.as_ref().map(AttributionContent::text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionSourceId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<i64>,
}

/// Attributed content arrives either as a bare string or as a content record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributionContent {
    Text(String),
    Parts(AttributionParts),
}

/// Content record form of an attribution; `parts` must be present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionParts {
    pub parts: Vec<Part>,
}

impl AttributionContent {
    pub fn text(&self) -> String {
        match self {
            AttributionContent::Text(text) => text.clone(),
            AttributionContent::Parts(record) => record
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect(),
        }
    }
}

/// Retrieval status of a cited source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrievalStatus {
    #[default]
    Success,
}

/// One entry of the numbered source list (1-indexed by position)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitationEntry {
    #[serde(rename = "retrievedUrl")]
    pub url: String,
    #[serde(rename = "urlRetrievalStatus", default)]
    pub status: RetrievalStatus,
}

impl CitationEntry {
    pub fn success(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: RetrievalStatus::Success,
        }
    }
}

/// Deserialize a list where position is identity: malformed entries become
/// defaults instead of being dropped
fn positional_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::debug!("Keeping placeholder for malformed grounding record: {}", e);
                T::default()
            })
        })
        .collect())
}
