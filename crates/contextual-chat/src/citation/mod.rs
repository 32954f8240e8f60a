//! Citation numbering and source lists for grounded answers

pub mod attribution;
pub mod sources;

pub use attribution::{
    process_attributions, unique_chunk_sources, AttributionDecision, ProcessedAnswer, SkipReason,
};
pub use sources::{format_source_list, numbered_sources, SourceLink};
