//! The root of a section tree.

use crate::layout::LayoutEngine;
use crate::section::Section;
use promptweave_core::{Message, RenderContext, RenderError, RenderedSection};
use std::sync::Arc;
use tracing::debug;

/// A top-level layout. Prompts nest: a prompt used as a section of another
/// is flattened into it, so its leaves share the outer budget.
#[derive(Debug, Clone)]
pub struct Prompt {
    name: Option<String>,
    layout: LayoutEngine,
}

impl Prompt {
    /// Sections joined by `"\n\n"` in text form.
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            name: None,
            layout: LayoutEngine::new(sections),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.layout = self.layout.with_separator(separator);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn sections(&self) -> &[Section] {
        self.layout.sections()
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub async fn render_as_text(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<String>, RenderError> {
        debug!(
            prompt = self.name.as_deref().unwrap_or("-"),
            max_tokens,
            "Rendering prompt as text"
        );
        self.layout.render_as_text(ctx, max_tokens).await
    }

    pub async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        debug!(
            prompt = self.name.as_deref().unwrap_or("-"),
            max_tokens,
            "Rendering prompt as messages"
        );
        self.layout.render_as_messages(ctx, max_tokens).await
    }
}

impl From<Prompt> for Section {
    fn from(prompt: Prompt) -> Self {
        Section::Layout(Arc::new(prompt.layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextSection;
    use promptweave_core::{FunctionRegistry, TurnContext};
    use promptweave_memory::EmptyMemory;
    use promptweave_tokenizers::CharTokenizer;

    #[tokio::test]
    async fn nested_prompt_shares_budget() {
        let inner = Prompt::new(vec![
            Section::leaf(TextSection::new("bbb", "user").with_required(false)),
        ]);
        let outer = Prompt::new(vec![
            Section::leaf(TextSection::new("aaa", "system")),
            Section::from(inner),
        ])
        .named("outer");
        assert_eq!(outer.name(), Some("outer"));
        assert_eq!(outer.layout().leaves().len(), 2);

        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);

        let rendered = outer.render_as_messages(&ctx, 5).await.unwrap();
        assert_eq!(rendered.output, vec![Message::system("aaa")]);

        let rendered = outer.render_as_text(&ctx, 100).await.unwrap();
        assert_eq!(rendered.output, "aaa\n\nbbb");
    }
}
