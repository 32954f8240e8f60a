//! Conversations and the chat session driving them

pub mod session;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::types::ChatMessage;

pub use session::ChatSession;

/// Messages of every conversation, keyed by URL group id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversations {
    by_group: HashMap<String, Vec<ChatMessage>>,
}

impl Conversations {
    pub fn is_empty(&self) -> bool {
        self.by_group.is_empty()
    }

    /// Messages of one group, oldest first
    pub fn messages(&self, group_id: &str) -> &[ChatMessage] {
        self.by_group
            .get(group_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn push(&mut self, group_id: &str, message: ChatMessage) {
        self.by_group
            .entry(group_id.to_string())
            .or_default()
            .push(message);
    }

    pub fn message_mut(&mut self, group_id: &str, message_id: &str) -> Option<&mut ChatMessage> {
        self.by_group
            .get_mut(group_id)?
            .iter_mut()
            .find(|m| m.id == message_id)
    }

    /// Drop a group's conversation; returns whether there was one
    pub fn clear(&mut self, group_id: &str) -> bool {
        self.by_group.remove(group_id).is_some()
    }

    /// Keep only conversations of the given groups; returns how many were dropped
    pub fn retain_groups<'a>(&mut self, group_ids: impl IntoIterator<Item = &'a str>) -> usize {
        let keep: HashSet<&str> = group_ids.into_iter().collect();
        let before = self.by_group.len();
        self.by_group.retain(|id, _| keep.contains(id.as_str()));
        before - self.by_group.len()
    }
}
