//! Group sections: several sections collapsed into one message.

use crate::layout::LayoutEngine;
use crate::section::{PromptSection, Section, SectionOptions};
use async_trait::async_trait;
use promptweave_core::{Message, RenderContext, RenderError, RenderedSection, roles};

/// Lays its children out as text and wraps the result in a single message
/// with the group's role, in both projections.
#[derive(Debug)]
pub struct GroupSection {
    layout: LayoutEngine,
    role: String,
    options: SectionOptions,
}

impl GroupSection {
    /// A `system` group: auto-sized, required, separator `"\n\n"`.
    pub fn new(sections: Vec<Section>) -> Self {
        Self::with_role(sections, roles::SYSTEM)
    }

    pub fn with_role(sections: Vec<Section>, role: impl Into<String>) -> Self {
        let options = SectionOptions::new(-1.0, true).with_separator("\n\n");
        Self {
            layout: LayoutEngine::with_options(sections, options.clone()),
            role: role.into(),
            options,
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn with_tokens(mut self, tokens: f64) -> Self {
        self.options = self.options.with_tokens(tokens);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.options = self.options.with_required(required);
        self
    }

    /// Joins the children and, in text form, the group's messages.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        self.layout = self.layout.with_separator(separator.clone());
        self.options = self.options.with_separator(separator);
        self
    }

    pub fn with_text_prefix(mut self, text_prefix: impl Into<String>) -> Self {
        self.options = self.options.with_text_prefix(text_prefix);
        self
    }
}

#[async_trait]
impl PromptSection for GroupSection {
    fn options(&self) -> &SectionOptions {
        &self.options
    }

    async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        let rendered = self.layout.render_as_text(ctx, max_tokens).await?;
        let messages = vec![Message::new(self.role.as_str(), rendered.output)];
        Ok(self
            .options
            .fit_messages(messages, rendered.length, ctx.tokenizer, max_tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextSection;
    use promptweave_core::{FunctionRegistry, TurnContext};
    use promptweave_memory::EmptyMemory;
    use promptweave_tokenizers::CharTokenizer;

    fn text(content: &str) -> Section {
        Section::leaf(TextSection::new(content, "user"))
    }

    #[tokio::test]
    async fn children_collapse_into_one_message() {
        let group = GroupSection::new(vec![text("Hello"), text("World")]);
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);

        let rendered = group.render_as_messages(&ctx, 100).await.unwrap();
        assert_eq!(rendered.output, vec![Message::system("Hello\n\nWorld")]);
        assert_eq!(rendered.length, 12);

        let text = group.render_as_text(&ctx, 100).await.unwrap();
        assert_eq!(text.output, "Hello\n\nWorld");
    }

    #[tokio::test]
    async fn custom_role_and_separator() {
        let group = GroupSection::with_role(vec![text("a"), text("b")], "user").with_separator("+");
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);

        let rendered = group.render_as_messages(&ctx, 100).await.unwrap();
        assert_eq!(rendered.output, vec![Message::user("a+b")]);
    }

    #[tokio::test]
    async fn fixed_group_truncates_collapsed_text() {
        let group = GroupSection::new(vec![text("Hello"), text("World")]).with_tokens(6.0);
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);

        let rendered = group.render_as_messages(&ctx, 100).await.unwrap();
        assert_eq!(rendered.output, vec![Message::system("Hello\n")]);
        assert_eq!(rendered.length, 6);
    }
}
