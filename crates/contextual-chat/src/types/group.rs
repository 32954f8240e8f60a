//! Knowledge base URL groups

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named group of reference URLs used as grounding context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub urls: Vec<String>,
    /// Built-in groups are read-only
    #[serde(default = "default_editable")]
    pub is_editable: bool,
}

fn default_editable() -> bool {
    true
}

impl UrlGroup {
    /// Create a new, empty, editable group with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            urls: Vec::new(),
            is_editable: true,
        }
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_group_is_editable_and_empty() {
        let group = UrlGroup::new("Rust docs");
        assert!(group.is_editable);
        assert!(group.urls.is_empty());
        assert!(Uuid::parse_str(&group.id).is_ok());
    }

    #[test]
    fn test_deserialize_stored_group() {
        let group: UrlGroup = serde_json::from_str(
            r#"{"id":"1","name":"Docs","urls":["https://a.com"],"isEditable":false}"#,
        )
        .unwrap();
        assert!(!group.is_editable);
        assert!(group.contains_url("https://a.com"));
    }
}
