//! contextual-chat: Chat with web pages through a URL-grounded model
//!
//! Prompts are answered by a model that reads the URLs of the active
//! knowledge base group. Grounding metadata returned with the answer is
//! turned into inline `[n]` citation markers plus a numbered source list.

pub mod chat;
pub mod citation;
pub mod config;
pub mod error;
pub mod generation;
pub mod knowledge;
pub mod providers;
pub mod types;

pub use chat::{ChatSession, Conversations};
pub use citation::{process_attributions, unique_chunk_sources, ProcessedAnswer};
pub use config::ChatConfig;
pub use error::{Error, Result};
pub use knowledge::{ChatStore, KnowledgeBase};
pub use providers::{GeminiClient, GroundedModel};
pub use types::{
    grounding::{CitationEntry, GroundingAttribution, GroundingChunk},
    group::UrlGroup,
    message::{ChatMessage, MessageSender},
};
