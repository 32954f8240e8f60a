//! Citation attribution post-processing
//!
//! Turns a finished model answer plus its grounding attributions into an
//! answer annotated with `[n]` markers and an ordered, deduplicated list of
//! cited sources. Citation numbers follow the first-seen order of source URLs
//! among the attributions.
//!
//! Locating a span is a linear scan per attribution that restarts from the
//! beginning of the text, so the cost is O(text length x attributions). That
//! is fine for chat-sized answers and is left unoptimized.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::types::grounding::{CitationEntry, GroundingAttribution, GroundingChunk};

/// Text following a span that is already annotated: optional whitespace then `[digits]`
static EXISTING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[0-9]+\]").expect("marker pattern is valid"));

/// Annotated answer and the numbered sources it cites
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedAnswer {
    pub processed_text: String,
    /// Entry `i` is citation number `i + 1`
    pub sources: Vec<CitationEntry>,
}

/// Why an attribution contributes nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingContent,
    MissingChunkIndex,
    ChunkIndexOutOfRange,
    MissingUri,
}

/// Result of validating one attribution against the chunk list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributionDecision<'a> {
    Cite { content: String, url: &'a str },
    Skip(SkipReason),
}

impl<'a> AttributionDecision<'a> {
    /// Validate an attribution once, at the boundary
    pub fn resolve(attribution: &GroundingAttribution, chunks: &'a [GroundingChunk]) -> Self {
        let Some(content) = attribution.content_text() else {
            return Self::Skip(SkipReason::MissingContent);
        };
        let Some(index) = attribution.chunk_index() else {
            return Self::Skip(SkipReason::MissingChunkIndex);
        };
        let Some(chunk) = usize::try_from(index).ok().and_then(|i| chunks.get(i)) else {
            return Self::Skip(SkipReason::ChunkIndexOutOfRange);
        };
        match chunk.uri() {
            Some(url) => Self::Cite { content, url },
            None => Self::Skip(SkipReason::MissingUri),
        }
    }
}

#[derive(Debug)]
struct Insertion {
    offset: usize,
    marker: String,
}

/// Annotate `full_text` with citation markers derived from `attributions`
///
/// Without attributions or without chunks, the text is returned unchanged and
/// the sources are the distinct chunk URIs in first-seen order.
pub fn process_attributions(
    full_text: &str,
    attributions: &[GroundingAttribution],
    chunks: &[GroundingChunk],
) -> ProcessedAnswer {
    if attributions.is_empty() || chunks.is_empty() {
        return ProcessedAnswer {
            processed_text: full_text.to_string(),
            sources: unique_chunk_sources(chunks),
        };
    }

    let mut url_to_citation: HashMap<&str, usize> = HashMap::new();
    let mut cited: Vec<Option<CitationEntry>> = Vec::new();
    let mut insertions: Vec<Insertion> = Vec::new();

    for (position, attribution) in attributions.iter().enumerate() {
        let (content, url) = match AttributionDecision::resolve(attribution, chunks) {
            AttributionDecision::Cite { content, url } => (content, url),
            AttributionDecision::Skip(reason) => {
                tracing::trace!("Skipping attribution {}: {:?}", position, reason);
                continue;
            }
        };

        let number = match url_to_citation.get(url) {
            Some(&number) => number,
            None => {
                let number = url_to_citation.len() + 1;
                url_to_citation.insert(url, number);
                if cited.len() < number {
                    cited.resize(number, None);
                }
                cited[number - 1] = Some(CitationEntry::success(url));
                number
            }
        };

        match find_unmarked(full_text, &content) {
            Some(offset) => insertions.push(Insertion {
                offset,
                marker: format!(" [{}]", number),
            }),
            None => tracing::trace!(
                "Attribution {} has no unmarked match for citation [{}]",
                position,
                number
            ),
        }
    }

    let processed_text = apply_insertions(full_text, insertions);
    let sources: Vec<CitationEntry> = cited.into_iter().flatten().collect();

    tracing::debug!(
        "Processed {} attributions into {} citations",
        attributions.len(),
        sources.len()
    );

    ProcessedAnswer {
        processed_text,
        sources,
    }
}

/// Distinct chunk URIs in first-seen order
pub fn unique_chunk_sources(chunks: &[GroundingChunk]) -> Vec<CitationEntry> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter_map(GroundingChunk::uri)
        .filter(|uri| seen.insert(*uri))
        .map(CitationEntry::success)
        .collect()
}

/// Offset just past the first occurrence of `content` not already followed by a marker
fn find_unmarked(text: &str, content: &str) -> Option<usize> {
    let mut from = 0;
    while from <= text.len() {
        let start = from + text[from..].find(content)?;
        let end = start + content.len();
        if !EXISTING_MARKER.is_match(&text[end..]) {
            return Some(end);
        }
        from = start + text[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Apply insertions from the highest offset down so earlier offsets stay valid
fn apply_insertions(text: &str, mut insertions: Vec<Insertion>) -> String {
    // Stable: equal offsets keep input order, so later ones land in front.
    insertions.sort_by(|a, b| b.offset.cmp(&a.offset));

    let mut result = text.to_string();
    for insertion in &insertions {
        result.insert_str(insertion.offset, &insertion.marker);
    }
    result
}
