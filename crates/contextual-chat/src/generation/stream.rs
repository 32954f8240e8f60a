//! Accumulation of a streamed model answer
//!
//! Text, grounding chunks and attributions arrive spread over many frames.
//! They are collected here and post-processed once the stream is complete.

use crate::citation::{process_attributions, ProcessedAnswer};
use crate::types::grounding::{GenerateContentResponse, GroundingAttribution, GroundingChunk};

/// Collects streamed frames into one answer
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    chunks: Vec<GroundingChunk>,
    attributions: Vec<GroundingAttribution>,
    frames: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame and return the text it contributed
    pub fn push(&mut self, frame: &GenerateContentResponse) -> String {
        self.frames += 1;

        let delta = frame.text();
        self.text.push_str(&delta);

        if let Some(metadata) = frame.grounding_metadata() {
            self.chunks.extend(metadata.grounding_chunks.iter().cloned());
            self.attributions
                .extend(metadata.grounding_attributions.iter().cloned());
        }

        delta
    }

    /// Text received so far
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Run citation processing over the complete answer
    pub fn finish(self) -> ProcessedAnswer {
        tracing::debug!(
            "Stream complete: {} frames, {} chunks, {} attributions",
            self.frames,
            self.chunks.len(),
            self.attributions.len()
        );
        process_attributions(&self.text, &self.attributions, &self.chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_grounding_accumulates_across_frames() {
        let mut acc = StreamAccumulator::new();

        let delta = acc.push(&frame(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Cats are mammals." }] },
                "groundingMetadata": {
                    "groundingChunks": [{ "web": { "uri": "https://x.com" } }]
                }
            }]
        })));
        assert_eq!(delta, "Cats are mammals.");

        acc.push(&frame(json!({
            "candidates": [{
                "content": { "parts": [{ "text": " Dogs are mammals." }] },
                "groundingMetadata": {
                    "groundingAttributions": [
                        { "sourceId": { "chunkIndex": 0 }, "content": "Cats are mammals." }
                    ]
                }
            }]
        })));

        assert_eq!(acc.text(), "Cats are mammals. Dogs are mammals.");
        assert_eq!(acc.frame_count(), 2);

        let answer = acc.finish();
        assert_eq!(answer.processed_text, "Cats are mammals. [1] Dogs are mammals.");
        assert_eq!(answer.sources.len(), 1);
    }

    #[test]
    fn test_ungrounded_stream_falls_back() {
        let mut acc = StreamAccumulator::new();
        acc.push(&frame(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Plain." }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://a.com" } },
                        { "web": { "uri": "https://a.com" } }
                    ]
                }
            }]
        })));

        let answer = acc.finish();
        assert_eq!(answer.processed_text, "Plain.");
        assert_eq!(answer.sources.len(), 1);
    }

    #[test]
    fn test_malformed_attributions_stay_on_grounded_path() {
        let mut acc = StreamAccumulator::new();
        acc.push(&frame(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Cats are mammals." }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://a.com" } },
                        { "web": { "uri": "https://b.com" } }
                    ],
                    "groundingAttributions": [
                        { "sourceId": { "chunkIndex": "zero" }, "content": "Cats are mammals." }
                    ]
                }
            }]
        })));

        let answer = acc.finish();
        assert_eq!(answer.processed_text, "Cats are mammals.");
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn test_object_content_without_parts_is_not_cited() {
        let mut acc = StreamAccumulator::new();
        acc.push(&frame(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Cats are mammals." }] },
                "groundingMetadata": {
                    "groundingChunks": [{ "web": { "uri": "https://a.com" } }],
                    "groundingAttributions": [
                        { "sourceId": { "chunkIndex": 0 }, "content": { "unexpected": true } }
                    ]
                }
            }]
        })));

        let answer = acc.finish();
        assert_eq!(answer.processed_text, "Cats are mammals.");
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn test_empty_stream() {
        let answer = StreamAccumulator::new().finish();
        assert_eq!(answer, ProcessedAnswer::default());
    }
}
