//! Data source sections and a static text data source.

use crate::section::{PromptSection, SectionOptions, Sizing};
use async_trait::async_trait;
use promptweave_core::{
    DataSource, Memory, Message, RenderContext, RenderError, RenderedSection, Tokenizer,
    TurnContext,
};
use std::sync::Arc;

/// Wraps a [`DataSource`]: the source renders within this section's budget
/// and its text becomes one `system` message.
pub struct DataSourceSection {
    source: Arc<dyn DataSource>,
    options: SectionOptions,
}

impl DataSourceSection {
    /// Auto-sized, required, separator `"\n\n"`.
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            options: SectionOptions::new(-1.0, true).with_separator("\n\n"),
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}

section_builders!(DataSourceSection);

#[async_trait]
impl PromptSection for DataSourceSection {
    fn options(&self) -> &SectionOptions {
        &self.options
    }

    async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        // Only a fixed cap narrows the ceiling handed to the source.
        let budget = match self.options.sizing() {
            Sizing::Fixed(cap) => cap.min(max_tokens),
            Sizing::Auto | Sizing::Proportional(_) => max_tokens,
        };
        let rendered = self
            .source
            .render_data(ctx.turn, ctx.memory, ctx.tokenizer, budget)
            .await?;
        if rendered.output.is_empty() {
            return Ok(RenderedSection::empty());
        }

        let messages = vec![Message::system(rendered.output)];
        Ok(self
            .options
            .fit_messages(messages, rendered.length, ctx.tokenizer, max_tokens))
    }
}

impl std::fmt::Debug for DataSourceSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceSection")
            .field("source", &self.source.name())
            .field("options", &self.options)
            .finish()
    }
}

/// A named block of static text, truncated to whatever budget it is given.
#[derive(Debug, Clone)]
pub struct TextDataSource {
    name: String,
    text: String,
}

impl TextDataSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl DataSource for TextDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn render_data(
        &self,
        _turn: &TurnContext,
        _memory: &dyn Memory,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> Result<RenderedSection<String>, RenderError> {
        let tokens = tokenizer.encode(&self.text);
        if tokens.len() <= max_tokens {
            return Ok(RenderedSection {
                output: self.text.clone(),
                length: tokens.len(),
                too_long: false,
            });
        }

        Ok(RenderedSection {
            output: tokenizer.decode(&tokens[..max_tokens]),
            length: max_tokens,
            too_long: false,
        })
    }
}
