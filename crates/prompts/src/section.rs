//! The section capability and its sizing policy.
//!
//! A section is any type implementing [`PromptSection`]: it renders itself
//! as a list of role-tagged messages under a token ceiling, and (by default)
//! derives its text form from those messages so the two projections never
//! disagree on content.
//!
//! # Sizing
//!
//! Every section carries a signed `tokens` value, decoded into [`Sizing`]:
//!
//! | `tokens` | Policy | Meaning |
//! |----------|--------|---------|
//! | `< 0` | Auto | as much as it needs; laid out with the fixed sections |
//! | `> 1` | Fixed | hard cap; the section truncates itself to it |
//! | `0..=1` | Proportional | fraction of what is left after fixed sections |

use crate::layout::LayoutEngine;
use async_trait::async_trait;
use promptweave_core::{Message, MessageContent, RenderContext, RenderError, RenderedSection, Tokenizer};
use std::sync::Arc;

/// Sizing policy decoded from a section's `tokens` value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Take whatever the content needs; flagged, never truncated.
    Auto,
    /// Hard cap in tokens.
    Fixed(usize),
    /// Fraction of the budget remaining after fixed and auto sections.
    Proportional(f64),
}

impl Sizing {
    pub fn from_tokens(tokens: f64) -> Self {
        if tokens.is_nan() || tokens < 0.0 {
            Self::Auto
        } else if tokens > 1.0 {
            Self::Fixed(tokens.floor() as usize)
        } else {
            Self::Proportional(tokens)
        }
    }

    /// Auto and fixed sections are laid out in the first pass.
    pub fn is_fixed(&self) -> bool {
        !matches!(self, Self::Proportional(_))
    }
}

/// The settings every section shares. Immutable once the section is built.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionOptions {
    tokens: f64,
    sizing: Sizing,
    required: bool,
    separator: String,
    text_prefix: String,
}

impl SectionOptions {
    pub fn new(tokens: f64, required: bool) -> Self {
        Self {
            tokens,
            sizing: Sizing::from_tokens(tokens),
            required,
            separator: "\n".to_string(),
            text_prefix: String::new(),
        }
    }

    pub fn with_tokens(mut self, tokens: f64) -> Self {
        self.tokens = tokens;
        self.sizing = Sizing::from_tokens(tokens);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_text_prefix(mut self, text_prefix: impl Into<String>) -> Self {
        self.text_prefix = text_prefix.into();
        self
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn sizing(&self) -> Sizing {
        self.sizing
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn text_prefix(&self) -> &str {
        &self.text_prefix
    }

    /// The budget a self-limiting section should aim for under `max_tokens`.
    pub fn token_budget(&self, max_tokens: usize) -> usize {
        match self.sizing {
            Sizing::Auto => max_tokens,
            Sizing::Fixed(cap) => cap.min(max_tokens),
            Sizing::Proportional(fraction) => (fraction * max_tokens as f64).floor() as usize,
        }
    }

    /// Enforce the fixed cap on a candidate message list by truncating from
    /// the tail.
    ///
    /// Messages are popped from the end until the running length fits. The
    /// message that crosses the cap is pushed back holding only the leading
    /// tokens that still fit. Earlier messages always survive later ones.
    /// `too_long` is measured against `max_tokens`, not the cap.
    pub fn fit_messages(
        &self,
        mut output: Vec<Message>,
        mut length: usize,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> RenderedSection<Vec<Message>> {
        if let Sizing::Fixed(cap) = self.sizing {
            while length > cap {
                let Some(message) = output.pop() else {
                    break;
                };
                length = length.saturating_sub(tokenizer.count(&message.to_text()));
                // A partial function call would be malformed JSON; drop it whole.
                if length < cap && message.function_call.is_none() {
                    let encoded = tokenizer.encode(&message.content_text());
                    let delta = (cap - length).min(encoded.len());
                    output.push(Message {
                        content: Some(MessageContent::Text(tokenizer.decode(&encoded[..delta]))),
                        ..message
                    });
                    length += delta;
                }
            }
        }

        RenderedSection {
            output,
            length,
            too_long: length > max_tokens,
        }
    }

    /// Flatten a rendered message list into this section's text form.
    pub fn messages_to_text(
        &self,
        rendered: RenderedSection<Vec<Message>>,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> RenderedSection<String> {
        let messages = rendered.output;
        if messages.is_empty() {
            return RenderedSection::empty();
        }

        let body = messages
            .iter()
            .map(Message::to_text)
            .collect::<Vec<_>>()
            .join(&self.separator);
        let mut length = tokenizer.count(&self.text_prefix)
            + rendered.length
            + (messages.len() - 1) * tokenizer.count(&self.separator);
        let mut text = format!("{}{body}", self.text_prefix);

        if let Sizing::Fixed(cap) = self.sizing {
            if length > cap {
                text = tokenizer.truncate(&text, cap);
                length = cap;
            }
        }

        RenderedSection {
            output: text,
            length,
            too_long: length > max_tokens,
        }
    }
}

/// A composable, budget-aware unit of prompt content.
#[async_trait]
pub trait PromptSection: Send + Sync {
    /// Shared settings: sizing, required flag, separator, text prefix.
    fn options(&self) -> &SectionOptions;

    fn required(&self) -> bool {
        self.options().required()
    }

    fn tokens(&self) -> f64 {
        self.options().tokens()
    }

    fn sizing(&self) -> Sizing {
        self.options().sizing()
    }

    /// Render as zero or more messages within `max_tokens`.
    ///
    /// Optional sections should stay within the ceiling. Required sections
    /// may exceed it and report so via `too_long` rather than render nothing.
    async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError>;

    /// Render as text: the message form joined by the separator, with the
    /// text prefix prepended and the fixed cap enforced on the result.
    async fn render_as_text(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<String>, RenderError> {
        let rendered = self.render_as_messages(ctx, max_tokens).await?;
        Ok(self
            .options()
            .messages_to_text(rendered, ctx.tokenizer, max_tokens))
    }
}

/// A node in a prompt tree: a leaf section or a nested layout whose children
/// compete for the enclosing layout's budget.
#[derive(Clone)]
pub enum Section {
    Leaf(Arc<dyn PromptSection>),
    Layout(Arc<LayoutEngine>),
}

impl Section {
    pub fn leaf(section: impl PromptSection + 'static) -> Self {
        Self::Leaf(Arc::new(section))
    }

    pub fn required(&self) -> bool {
        match self {
            Self::Leaf(section) => section.required(),
            Self::Layout(layout) => layout.options().required(),
        }
    }

    pub fn tokens(&self) -> f64 {
        match self {
            Self::Leaf(section) => section.tokens(),
            Self::Layout(layout) => layout.options().tokens(),
        }
    }

    pub async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        match self {
            Self::Leaf(section) => section.render_as_messages(ctx, max_tokens).await,
            Self::Layout(layout) => layout.render_as_messages(ctx, max_tokens).await,
        }
    }

    pub async fn render_as_text(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<String>, RenderError> {
        match self {
            Self::Leaf(section) => section.render_as_text(ctx, max_tokens).await,
            Self::Layout(layout) => layout.render_as_text(ctx, max_tokens).await,
        }
    }

    /// Append this node's leaves, inlining nested layouts, in order.
    pub(crate) fn flatten_into(&self, leaves: &mut Vec<Arc<dyn PromptSection>>) {
        match self {
            Self::Leaf(section) => leaves.push(Arc::clone(section)),
            Self::Layout(layout) => {
                for child in layout.sections() {
                    child.flatten_into(leaves);
                }
            }
        }
    }
}

impl From<Arc<dyn PromptSection>> for Section {
    fn from(section: Arc<dyn PromptSection>) -> Self {
        Self::Leaf(section)
    }
}

impl From<LayoutEngine> for Section {
    fn from(layout: LayoutEngine) -> Self {
        Self::Layout(Arc::new(layout))
    }
}

impl std::fmt::Debug for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(section) => f
                .debug_struct("Leaf")
                .field("options", section.options())
                .finish_non_exhaustive(),
            Self::Layout(layout) => f.debug_tuple("Layout").field(layout).finish(),
        }
    }
}
