//! Prompt construction and streamed answer assembly

pub mod prompt;
pub mod stream;

pub use prompt::PromptBuilder;
pub use stream::StreamAccumulator;
