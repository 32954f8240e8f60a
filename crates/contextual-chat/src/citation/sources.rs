//! Numbered source list for display under an answer

use crate::types::grounding::CitationEntry;

/// A cited source ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    /// Citation number as it appears in the `[n]` markers
    pub number: usize,
    pub url: String,
    /// Hostname shown in place of the full URL
    pub label: String,
}

/// Number the sources and derive a hostname label for each
pub fn numbered_sources(sources: &[CitationEntry]) -> Vec<SourceLink> {
    sources
        .iter()
        .enumerate()
        .map(|(i, entry)| SourceLink {
            number: i + 1,
            url: entry.url.clone(),
            label: hostname_label(&entry.url),
        })
        .collect()
}

/// Hostname of `url`, or the raw string when it has none
fn hostname_label(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// Plain-text "Sources" footer, empty when nothing was cited
pub fn format_source_list(sources: &[CitationEntry]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let mut out = String::from("Sources:");
    for link in numbered_sources(sources) {
        out.push_str(&format!("\n[{}] {} ({})", link.number, link.label, link.url));
    }
    out
}
