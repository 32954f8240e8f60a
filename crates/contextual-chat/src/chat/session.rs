//! Chat session: sends prompts for the active URL group and records answers

use futures::StreamExt;
use std::sync::Arc;

use super::Conversations;
use crate::citation::ProcessedAnswer;
use crate::error::{Error, Result};
use crate::generation::StreamAccumulator;
use crate::knowledge::KnowledgeBase;
use crate::providers::GroundedModel;
use crate::types::ChatMessage;

/// A chat over the knowledge base, backed by a grounded model
pub struct ChatSession {
    model: Arc<dyn GroundedModel>,
    knowledge: KnowledgeBase,
    conversations: Conversations,
}

impl ChatSession {
    pub fn new(
        model: Arc<dyn GroundedModel>,
        knowledge: KnowledgeBase,
        conversations: Conversations,
    ) -> Self {
        Self {
            model,
            knowledge,
            conversations,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn knowledge_mut(&mut self) -> &mut KnowledgeBase {
        &mut self.knowledge
    }

    pub fn conversations(&self) -> &Conversations {
        &self.conversations
    }

    /// Hand back state for persistence
    pub fn into_parts(self) -> (KnowledgeBase, Conversations) {
        (self.knowledge, self.conversations)
    }

    /// Messages of the active group's conversation
    pub fn current_messages(&self) -> &[ChatMessage] {
        match self.knowledge.active_group() {
            Some(group) => self.conversations.messages(&group.id),
            None => &[],
        }
    }

    /// Send a prompt to the model and record the answer
    ///
    /// `on_delta` receives streamed text as it arrives. Returns the final model
    /// message, or `None` when the prompt is blank or no group is active.
    /// Upstream failures are recorded as an error message rather than returned.
    pub async fn send_message<F>(&mut self, prompt: &str, mut on_delta: F) -> Option<ChatMessage>
    where
        F: FnMut(&str),
    {
        if prompt.trim().is_empty() {
            return None;
        }
        let group = self.knowledge.active_group()?;
        let group_id = group.id.clone();
        let urls = group.urls.clone();

        self.conversations.push(&group_id, ChatMessage::user(prompt));
        let placeholder = ChatMessage::model_placeholder();
        let message_id = placeholder.id.clone();
        self.conversations.push(&group_id, placeholder);

        let outcome = self
            .stream_answer(prompt, &urls, &group_id, &message_id, &mut on_delta)
            .await;

        let message = self.conversations.message_mut(&group_id, &message_id)?;
        match outcome {
            Ok(answer) => {
                tracing::info!("Answer complete with {} cited sources", answer.sources.len());
                message.text = answer.processed_text;
                message.url_context = answer.sources;
            }
            Err(e) => {
                if e.is_upstream() {
                    tracing::error!("Failed to get answer from {}: {}", self.model.name(), e);
                } else {
                    tracing::warn!("Answer failed: {}", e);
                }
                message.text = e.to_string();
                message.is_error = true;
            }
        }
        message.is_loading = false;
        Some(message.clone())
    }

    async fn stream_answer(
        &mut self,
        prompt: &str,
        urls: &[String],
        group_id: &str,
        message_id: &str,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<ProcessedAnswer> {
        tracing::debug!(
            "Streaming answer from {} ({}) with {} URLs",
            self.model.name(),
            self.model.model(),
            urls.len()
        );
        let mut stream = self.model.stream_with_url_context(prompt, urls).await?;
        let mut accumulator = StreamAccumulator::new();

        while let Some(frame) = stream.next().await {
            let frame = frame?;
            if let Some(reason) = frame.block_reason() {
                return Err(Error::llm(format!("Prompt blocked by the model API: {}", reason)));
            }

            let delta = accumulator.push(&frame);
            if delta.is_empty() {
                continue;
            }
            on_delta(&delta);
            if let Some(message) = self.conversations.message_mut(group_id, message_id) {
                message.text = accumulator.text().to_string();
            }
        }

        Ok(accumulator.finish())
    }

    /// Clear the active group's conversation
    pub fn clear_conversation(&mut self) -> bool {
        match self.knowledge.active_group() {
            Some(group) => {
                let id = group.id.clone();
                self.conversations.clear(&id)
            }
            None => false,
        }
    }

    /// Quick-start questions for the active group; empty on failure
    pub async fn suggestions(&self) -> Vec<String> {
        let Some(group) = self.knowledge.active_group() else {
            return Vec::new();
        };

        match self.model.initial_suggestions(&group.urls).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!("Failed to fetch initial suggestions: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ResponseStream;
    use crate::types::{GenerateContentResponse, MessageSender};
    use async_trait::async_trait;
    use futures::stream;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, Vec<String>)>>);

    impl Recorder {
        fn record(&self, prompt: &str, urls: &[String]) {
            self.0.lock().unwrap().push((prompt.to_string(), urls.to_vec()));
        }

        fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.0.lock().unwrap().clone()
        }
    }

    enum Script {
        Frames(Vec<serde_json::Value>),
        MidStreamQuota(Vec<serde_json::Value>),
        Refuse,
    }

    struct ScriptedModel {
        script: Script,
        calls: Recorder,
    }

    impl ScriptedModel {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: Recorder::default(),
            })
        }
    }

    fn frames(values: &[serde_json::Value]) -> Vec<Result<GenerateContentResponse>> {
        values
            .iter()
            .map(|v| Ok(serde_json::from_value(v.clone()).unwrap()))
            .collect()
    }

    #[async_trait]
    impl GroundedModel for ScriptedModel {
        async fn stream_with_url_context(&self, prompt: &str, urls: &[String]) -> Result<ResponseStream> {
            self.calls.record(prompt, urls);
            match &self.script {
                Script::Frames(values) => Ok(stream::iter(frames(values)).boxed()),
                Script::MidStreamQuota(values) => {
                    let mut items = frames(values);
                    items.push(Err(Error::QuotaExceeded));
                    Ok(stream::iter(items).boxed())
                }
                Script::Refuse => Err(Error::InvalidApiKey),
            }
        }

        async fn initial_suggestions(&self, urls: &[String]) -> Result<Vec<String>> {
            match self.script {
                Script::Refuse => Err(Error::InvalidApiKey),
                _ => Ok(vec![format!("What do these {} pages cover?", urls.len())]),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }
    }

    fn grounded_frames() -> Vec<serde_json::Value> {
        vec![
            json!({ "candidates": [{ "content": { "parts": [{ "text": "Cats are mammals." }] } }] }),
            json!({
                "candidates": [{
                    "content": { "parts": [{ "text": " Dogs are mammals." }] },
                    "groundingMetadata": {
                        "groundingChunks": [{ "web": { "uri": "https://x.com/cats" } }],
                        "groundingAttributions": [
                            { "sourceId": { "chunkIndex": 0 }, "content": "Cats are mammals." }
                        ]
                    }
                }]
            }),
        ]
    }

    #[tokio::test]
    async fn test_send_message_records_cited_answer() {
        let model = ScriptedModel::new(Script::Frames(grounded_frames()));
        let mut session = ChatSession::new(model.clone(), KnowledgeBase::default(), Conversations::default());

        let mut deltas = Vec::new();
        let answer = session
            .send_message("Are cats mammals?", |d| deltas.push(d.to_string()))
            .await
            .unwrap();

        assert_eq!(deltas, vec!["Cats are mammals.", " Dogs are mammals."]);
        assert_eq!(answer.text, "Cats are mammals. [1] Dogs are mammals.");
        assert_eq!(answer.url_context.len(), 1);
        assert!(!answer.is_loading);
        assert!(!answer.is_error);

        let messages = session.current_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, MessageSender::User);
        assert_eq!(messages[1], answer);

        let calls = model.calls.calls();
        assert_eq!(calls[0].0, "Are cats mammals?");
        assert_eq!(calls[0].1.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_prompt_is_ignored() {
        let model = ScriptedModel::new(Script::Frames(grounded_frames()));
        let mut session = ChatSession::new(model.clone(), KnowledgeBase::default(), Conversations::default());

        assert!(session.send_message("   ", |_| {}).await.is_none());
        assert!(session.current_messages().is_empty());
        assert!(model.calls.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_active_group_is_ignored() {
        let model = ScriptedModel::new(Script::Frames(grounded_frames()));
        let mut session = ChatSession::new(model, KnowledgeBase::from_groups(vec![]), Conversations::default());

        assert!(session.send_message("hello", |_| {}).await.is_none());
        assert!(session.suggestions().await.is_empty());
    }

    #[tokio::test]
    async fn test_refused_request_becomes_error_message() {
        let model = ScriptedModel::new(Script::Refuse);
        let mut session = ChatSession::new(model, KnowledgeBase::default(), Conversations::default());

        let answer = session.send_message("hello", |_| {}).await.unwrap();
        assert!(answer.is_error);
        assert!(!answer.is_loading);
        assert_eq!(answer.text, Error::InvalidApiKey.to_string());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_error_text() {
        let model = ScriptedModel::new(Script::MidStreamQuota(vec![json!({
            "candidates": [{ "content": { "parts": [{ "text": "Partial" }] } }]
        })]));
        let mut session = ChatSession::new(model, KnowledgeBase::default(), Conversations::default());

        let answer = session.send_message("hello", |_| {}).await.unwrap();
        assert!(answer.is_error);
        assert!(answer.url_context.is_empty());
        assert_eq!(answer.text, Error::QuotaExceeded.to_string());
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_reported() {
        let model = ScriptedModel::new(Script::Frames(vec![json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })]));
        let mut session = ChatSession::new(model, KnowledgeBase::default(), Conversations::default());

        let answer = session.send_message("hello", |_| {}).await.unwrap();
        assert!(answer.is_error);
        assert!(answer.text.contains("SAFETY"));
    }

    #[test]
    fn test_clear_conversation_and_suggestions() {
        let model = ScriptedModel::new(Script::Frames(grounded_frames()));
        let mut session = ChatSession::new(model, KnowledgeBase::default(), Conversations::default());

        tokio_test::block_on(async {
            session.send_message("first", |_| {}).await;
            assert_eq!(
                session.suggestions().await,
                vec!["What do these 2 pages cover?".to_string()]
            );
        });

        assert!(session.clear_conversation());
        assert!(session.current_messages().is_empty());
        assert!(!session.clear_conversation());
    }

    #[test]
    fn test_failed_suggestions_are_empty() {
        let model = ScriptedModel::new(Script::Refuse);
        let session = ChatSession::new(model, KnowledgeBase::default(), Conversations::default());
        assert!(tokio_test::block_on(session.suggestions()).is_empty());
    }
}
