//! Core types for the chat client

pub mod grounding;
pub mod group;
pub mod message;

pub use grounding::{
    AttributionContent, AttributionParts, AttributionSourceId, Candidate, ChunkReference,
    CitationEntry, Content, GenerateContentResponse, GroundingAttribution, GroundingChunk,
    GroundingMetadata, Part, RetrievalStatus,
};
pub use group::UrlGroup;
pub use message::{ChatMessage, MessageSender};
