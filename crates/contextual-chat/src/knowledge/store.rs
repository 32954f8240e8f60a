//! JSON-file persistence for the knowledge base and conversations

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::KnowledgeBase;
use crate::chat::Conversations;
use crate::error::Result;

const KNOWLEDGE_BASE_FILE: &str = "knowledge_base.json";
const CONVERSATIONS_FILE: &str = "conversations.json";

/// Reads and writes chat state under a data directory
#[derive(Debug, Clone)]
pub struct ChatStore {
    data_dir: PathBuf,
}

impl ChatStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load the knowledge base, falling back to the default one
    pub fn load_knowledge_base(&self) -> KnowledgeBase {
        let mut kb: KnowledgeBase = self
            .load_json(KNOWLEDGE_BASE_FILE)
            .unwrap_or_default();
        kb.repair_selection();
        kb
    }

    /// Load conversations, falling back to none
    pub fn load_conversations(&self) -> Conversations {
        self.load_json(CONVERSATIONS_FILE).unwrap_or_default()
    }

    pub fn save_knowledge_base(&self, kb: &KnowledgeBase) -> Result<()> {
        self.save_json(KNOWLEDGE_BASE_FILE, kb)
    }

    /// Save conversations, dropping those whose group no longer exists
    pub fn save_conversations(&self, conversations: &mut Conversations, kb: &KnowledgeBase) -> Result<()> {
        let removed = conversations.retain_groups(kb.groups().iter().map(|g| g.id.as_str()));
        if removed > 0 {
            tracing::info!("Pruned {} conversations of deleted groups", removed);
        }
        self.save_json(CONVERSATIONS_FILE, conversations)
    }

    fn load_json<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn save_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(file);
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&path, content)?;
        tracing::debug!("Saved {}", path.display());
        Ok(())
    }
}
