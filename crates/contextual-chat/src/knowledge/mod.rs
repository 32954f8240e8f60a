//! Knowledge base: named groups of grounding URLs
//!
//! One group is active at a time; its URLs are sent along with every prompt.
//! Built-in groups are read-only.

pub mod store;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::group::UrlGroup;

pub use store::ChatStore;

/// The set of URL groups plus the active selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    groups: Vec<UrlGroup>,
    #[serde(default)]
    active_group_id: Option<String>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::from_groups(vec![UrlGroup {
            id: "1".to_string(),
            name: "Gemini API Docs".to_string(),
            urls: vec![
                "https://ai.google.dev/docs/gemini_api_overview".to_string(),
                "https://ai.google.dev/tutorials/get_started_node".to_string(),
            ],
            is_editable: false,
        }])
    }
}

impl KnowledgeBase {
    /// Build from stored groups; the first group becomes active
    pub fn from_groups(groups: Vec<UrlGroup>) -> Self {
        let active_group_id = groups.first().map(|g| g.id.clone());
        Self {
            groups,
            active_group_id,
        }
    }

    /// Point a dangling active selection at the first group
    pub(crate) fn repair_selection(&mut self) {
        if self.active_group().is_none() {
            self.active_group_id = self.groups.first().map(|g| g.id.clone());
        }
    }

    pub fn groups(&self) -> &[UrlGroup] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&UrlGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Look up a group by id, falling back to a case-insensitive name match
    pub fn find(&self, id_or_name: &str) -> Option<&UrlGroup> {
        self.group(id_or_name).or_else(|| {
            self.groups
                .iter()
                .find(|g| g.name.eq_ignore_ascii_case(id_or_name.trim()))
        })
    }

    pub fn active_group(&self) -> Option<&UrlGroup> {
        self.active_group_id.as_deref().and_then(|id| self.group(id))
    }

    /// URLs of the active group (empty when nothing is active)
    pub fn active_urls(&self) -> &[String] {
        self.active_group().map(|g| g.urls.as_slice()).unwrap_or(&[])
    }

    pub fn select_group(&mut self, id: &str) -> Result<()> {
        if self.group(id).is_none() {
            return Err(Error::GroupNotFound(id.to_string()));
        }
        self.active_group_id = Some(id.to_string());
        Ok(())
    }

    /// Add an empty editable group and make it active
    pub fn add_group(&mut self, name: &str) -> Result<&UrlGroup> {
        let name = non_blank_name(name)?;
        let group = UrlGroup::new(name);
        tracing::info!("Added URL group '{}' ({})", group.name, group.id);

        self.active_group_id = Some(group.id.clone());
        self.groups.push(group);
        Ok(&self.groups[self.groups.len() - 1])
    }

    /// Replace the name and URL list of an editable group
    pub fn update_group(&mut self, id: &str, name: &str, urls: Vec<String>) -> Result<()> {
        let name = non_blank_name(name)?;
        let group = self.editable_group_mut(id)?;
        group.name = name.to_string();
        group.urls = urls;
        Ok(())
    }

    /// Validate and append a URL to an editable group
    pub fn add_url(&mut self, id: &str, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::invalid_input("URL must not be empty"));
        }
        url::Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;

        let group = self.editable_group_mut(id)?;
        if group.contains_url(url) {
            return Err(Error::DuplicateUrl(url.to_string()));
        }
        group.urls.push(url.to_string());
        Ok(())
    }

    /// Remove a URL from an editable group; returns whether it was present
    pub fn remove_url(&mut self, id: &str, url: &str) -> Result<bool> {
        let group = self.editable_group_mut(id)?;
        let before = group.urls.len();
        group.urls.retain(|u| u != url);
        Ok(group.urls.len() != before)
    }

    /// Delete an editable group; the first remaining group takes over if it was active
    pub fn delete_group(&mut self, id: &str) -> Result<UrlGroup> {
        self.editable_group_mut(id)?;
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| Error::GroupNotFound(id.to_string()))?;
        let removed = self.groups.remove(index);

        if self.active_group_id.as_deref() == Some(id) {
            self.active_group_id = self.groups.first().map(|g| g.id.clone());
        }
        tracing::info!("Deleted URL group '{}'", removed.name);
        Ok(removed)
    }

    fn editable_group_mut(&mut self, id: &str) -> Result<&mut UrlGroup> {
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| Error::GroupNotFound(id.to_string()))?;
        if !group.is_editable {
            return Err(Error::GroupNotEditable(group.name.clone()));
        }
        Ok(group)
    }
}

fn non_blank_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_input("Group name must not be empty"));
    }
    Ok(name)
}
