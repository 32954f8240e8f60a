//! Prompt templates for URL-grounded chat

/// Suggestion returned when a group has no URLs yet
pub const EMPTY_GROUP_SUGGESTION: &str = "Add some URLs to get topic suggestions.";

/// Prompt builder for grounded queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Append the knowledge base URLs to the user prompt
    pub fn with_url_context(prompt: &str, urls: &[String]) -> String {
        if urls.is_empty() {
            return prompt.to_string();
        }
        format!("{}\n\nRelevant URLs for context:\n{}", prompt, urls.join("\n"))
    }

    /// Ask for quick-start questions about the documents behind `urls`
    pub fn suggestions(urls: &[String]) -> String {
        format!(
            "Based on the content of the following documentation URLs, provide 3-4 concise and actionable questions a developer might ask to explore these documents. These questions should be suitable as quick-start prompts.\n\nRelevant URLs:\n{}",
            urls.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_urls_is_unchanged() {
        assert_eq!(PromptBuilder::with_url_context("What is X?", &[]), "What is X?");
    }

    #[test]
    fn test_prompt_lists_urls() {
        let urls = vec!["https://a.com".to_string(), "https://b.com".to_string()];
        assert_eq!(
            PromptBuilder::with_url_context("What is X?", &urls),
            "What is X?\n\nRelevant URLs for context:\nhttps://a.com\nhttps://b.com"
        );
    }

    #[test]
    fn test_suggestions_prompt_ends_with_urls() {
        let urls = vec!["https://a.com".to_string()];
        let prompt = PromptBuilder::suggestions(&urls);
        assert!(prompt.starts_with("Based on the content"));
        assert!(prompt.ends_with("Relevant URLs:\nhttps://a.com"));
    }
}
