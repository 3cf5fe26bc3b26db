//! Literal text sections.

use crate::section::{PromptSection, SectionOptions};
use async_trait::async_trait;
use promptweave_core::{Message, RenderContext, RenderError, RenderedSection};
use std::sync::OnceLock;

/// A fixed string rendered as one message with the given role.
///
/// The token length is measured on first render and reused afterwards; a
/// section is expected to be rendered with a single tokenizer.
#[derive(Debug)]
pub struct TextSection {
    text: String,
    role: String,
    options: SectionOptions,
    length: OnceLock<usize>,
}

impl TextSection {
    /// Auto-sized and required.
    pub fn new(text: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: role.into(),
            options: SectionOptions::new(-1.0, true),
            length: OnceLock::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn role(&self) -> &str {
        &self.role
    }
}

section_builders!(TextSection);

#[async_trait]
impl PromptSection for TextSection {
    fn options(&self) -> &SectionOptions {
        &self.options
    }

    async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        let length = *self
            .length
            .get_or_init(|| ctx.tokenizer.count(&self.text));
        let messages = vec![Message::new(self.role.as_str(), self.text.as_str())];
        Ok(self
            .options
            .fit_messages(messages, length, ctx.tokenizer, max_tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptweave_core::{FunctionRegistry, TurnContext};
    use promptweave_memory::EmptyMemory;
    use promptweave_tokenizers::CharTokenizer;

    async fn render(section: &TextSection, max_tokens: usize) -> RenderedSection<Vec<Message>> {
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);
        section.render_as_messages(&ctx, max_tokens).await.unwrap()
    }

    #[tokio::test]
    async fn renders_single_message() {
        let section = TextSection::new("Hello", "user");
        let rendered = render(&section, 10).await;
        assert_eq!(rendered.output, vec![Message::user("Hello")]);
        assert_eq!(rendered.length, 5);
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn fixed_section_truncates_to_cap() {
        let section = TextSection::new("Hello World", "user").with_tokens(5.0);
        let rendered = render(&section, 100).await;
        assert_eq!(rendered.output, vec![Message::user("Hello")]);
        assert_eq!(rendered.length, 5);
    }

    #[tokio::test]
    async fn text_form_uses_prefix() {
        let section = TextSection::new("Hi", "user").with_text_prefix("user: ");
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);
        let rendered = section.render_as_text(&ctx, 100).await.unwrap();
        assert_eq!(rendered.output, "user: Hi");
        assert_eq!(rendered.length, 8);
    }

    #[test]
    fn defaults_are_auto_and_required() {
        let section = TextSection::new("x", "system");
        assert!(section.required());
        assert_eq!(section.tokens(), -1.0);
        assert_eq!(section.options().separator(), "\n");
    }
}
