//! Model API providers
//!
//! The chat session talks to the model through the `GroundedModel` trait so
//! the Gemini client can be swapped for a scripted model in tests.

pub mod gemini;
pub mod llm;
pub mod sse;

pub use gemini::GeminiClient;
pub use llm::{GroundedModel, ResponseStream};
pub use sse::SseDecoder;
