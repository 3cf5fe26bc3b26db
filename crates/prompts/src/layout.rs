//! The layout engine: packs an ordered list of sections under one token
//! ceiling.
//!
//! Nested layouts are flattened first, so every leaf in the tree competes
//! for the same budget. Layout then runs in two passes:
//!
//! 1. Auto and fixed sections render concurrently, each with the full
//!    ceiling. Optional sections are dropped from the end while the total
//!    is over budget.
//! 2. If budget is left, proportional sections render concurrently, each
//!    with the whole remainder as its ceiling, and the drop loop runs again.
//!
//! Survivors are composed in their original order. Running over is never an
//! error: it is reported through `too_long`.

use crate::section::{PromptSection, Section, SectionOptions, Sizing};
use futures::future::{BoxFuture, try_join_all};
use promptweave_core::{Message, RenderContext, RenderError, RenderedSection};
use std::sync::Arc;
use tracing::debug;

/// How a render pass projects a section: as text or as messages.
trait Projection: Sized + Send + 'static {
    fn render<'a>(
        section: &'a dyn PromptSection,
        ctx: &'a RenderContext<'a>,
        max_tokens: usize,
    ) -> BoxFuture<'a, Result<RenderedSection<Self>, RenderError>>;
}

impl Projection for String {
    fn render<'a>(
        section: &'a dyn PromptSection,
        ctx: &'a RenderContext<'a>,
        max_tokens: usize,
    ) -> BoxFuture<'a, Result<RenderedSection<Self>, RenderError>> {
        section.render_as_text(ctx, max_tokens)
    }
}

impl Projection for Vec<Message> {
    fn render<'a>(
        section: &'a dyn PromptSection,
        ctx: &'a RenderContext<'a>,
        max_tokens: usize,
    ) -> BoxFuture<'a, Result<RenderedSection<Self>, RenderError>> {
        section.render_as_messages(ctx, max_tokens)
    }
}

/// A flattened leaf and, once rendered, its output.
struct LayoutNode<T> {
    section: Arc<dyn PromptSection>,
    rendered: Option<RenderedSection<T>>,
}

/// Lays out child sections under a shared ceiling.
#[derive(Clone)]
pub struct LayoutEngine {
    sections: Vec<Section>,
    options: SectionOptions,
}

impl LayoutEngine {
    /// A layout with separator `"\n\n"`, auto sizing, required.
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            sections,
            options: SectionOptions::new(-1.0, true).with_separator("\n\n"),
        }
    }

    pub fn with_options(sections: Vec<Section>, options: SectionOptions) -> Self {
        Self { sections, options }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.options = self.options.with_separator(separator);
        self
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn options(&self) -> &SectionOptions {
        &self.options
    }

    pub fn separator(&self) -> &str {
        self.options.separator()
    }

    /// Every leaf of the tree, nested layouts inlined, in order.
    pub fn leaves(&self) -> Vec<Arc<dyn PromptSection>> {
        let mut leaves = Vec::new();
        for section in &self.sections {
            section.flatten_into(&mut leaves);
        }
        leaves
    }

    /// Render as one block of text, sections joined by the separator.
    pub async fn render_as_text(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<String>, RenderError> {
        let separator_cost = ctx.tokenizer.count(self.separator());
        let (nodes, remaining) = self
            .layout::<String>(ctx, max_tokens, separator_cost)
            .await?;

        let output = nodes
            .into_iter()
            .filter_map(|node| node.rendered)
            .filter(|rendered| !rendered.output.is_empty())
            .map(|rendered| rendered.output)
            .collect::<Vec<_>>()
            .join(self.separator());
        let length = ctx.tokenizer.count(&output);

        Ok(RenderedSection {
            output,
            length,
            too_long: remaining < 0,
        })
    }

    /// Render as the concatenation of every surviving section's messages.
    pub async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        let (nodes, remaining) = self.layout::<Vec<Message>>(ctx, max_tokens, 0).await?;

        let mut output = Vec::new();
        let mut length = 0;
        for rendered in nodes.into_iter().filter_map(|node| node.rendered) {
            output.extend(rendered.output);
            length += rendered.length;
        }

        Ok(RenderedSection {
            output,
            length,
            too_long: remaining < 0,
        })
    }

    /// Run both passes and return the surviving nodes with the final
    /// remaining budget (negative when over).
    async fn layout<T: Projection>(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
        separator_cost: usize,
    ) -> Result<(Vec<LayoutNode<T>>, i64), RenderError> {
        let mut nodes: Vec<LayoutNode<T>> = self
            .leaves()
            .into_iter()
            .map(|section| LayoutNode {
                section,
                rendered: None,
            })
            .collect();

        render_pass(&mut nodes, ctx, max_tokens, Sizing::is_fixed).await?;
        let mut remaining = drop_overflow(&mut nodes, max_tokens, separator_cost);
        debug!(
            sections = nodes.len(),
            max_tokens, remaining, "Fixed sections laid out"
        );

        if remaining > 0 && nodes.iter().any(|node| node.rendered.is_none()) {
            let ceiling = remaining as usize;
            render_pass(&mut nodes, ctx, ceiling, |sizing| !sizing.is_fixed()).await?;
            remaining = drop_overflow(&mut nodes, max_tokens, separator_cost);
            debug!(
                sections = nodes.len(),
                ceiling, remaining, "Proportional sections laid out"
            );
        }

        Ok((nodes, remaining))
    }
}

/// Render every not-yet-rendered node selected by `select` concurrently,
/// each with `max_tokens` as its ceiling.
async fn render_pass<T: Projection>(
    nodes: &mut [LayoutNode<T>],
    ctx: &RenderContext<'_>,
    max_tokens: usize,
    select: fn(&Sizing) -> bool,
) -> Result<(), RenderError> {
    let pending: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.rendered.is_none() && select(&node.section.sizing()))
        .map(|(index, _)| index)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let sections: Vec<Arc<dyn PromptSection>> = pending
        .iter()
        .map(|&index| Arc::clone(&nodes[index].section))
        .collect();
    let rendered = try_join_all(
        sections
            .iter()
            .map(|section| T::render(section.as_ref(), ctx, max_tokens)),
    )
    .await?;

    for (index, rendered) in pending.into_iter().zip(rendered) {
        nodes[index].rendered = Some(rendered);
    }
    Ok(())
}

/// Budget left after every rendered node. Separators are charged once per
/// join between non-empty outputs, matching how text is composed.
fn remaining_budget<T>(nodes: &[LayoutNode<T>], max_tokens: usize, separator_cost: usize) -> i64 {
    let (used, joined) = nodes
        .iter()
        .filter_map(|node| node.rendered.as_ref())
        .filter(|rendered| rendered.length > 0)
        .fold((0usize, 0usize), |(used, joined), rendered| {
            (used + rendered.length, joined + 1)
        });
    let separators = joined.saturating_sub(1) * separator_cost;
    max_tokens as i64 - (used + separators) as i64
}

/// Drop the last rendered optional node until the layout fits or only
/// required nodes are left. Returns the final remaining budget.
fn drop_overflow<T>(nodes: &mut Vec<LayoutNode<T>>, max_tokens: usize, separator_cost: usize) -> i64 {
    let mut remaining = remaining_budget(nodes, max_tokens, separator_cost);
    while remaining < 0 {
        let Some(index) = nodes
            .iter()
            .rposition(|node| node.rendered.is_some() && !node.section.required())
        else {
            break;
        };
        nodes.remove(index);
        remaining = remaining_budget(nodes, max_tokens, separator_cost);
        debug!(index, remaining, "Dropped optional section");
    }
    remaining
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("sections", &self.sections)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextSection;
    use promptweave_core::{FunctionRegistry, TurnContext};
    use promptweave_memory::EmptyMemory;
    use promptweave_tokenizers::CharTokenizer;

    fn text(content: &str, tokens: f64, required: bool) -> Section {
        Section::leaf(
            TextSection::new(content, "user")
                .with_tokens(tokens)
                .with_required(required),
        )
    }

    async fn render_text(layout: &LayoutEngine, max_tokens: usize) -> RenderedSection<String> {
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);
        layout.render_as_text(&ctx, max_tokens).await.unwrap()
    }

    async fn render_messages(
        layout: &LayoutEngine,
        max_tokens: usize,
    ) -> RenderedSection<Vec<Message>> {
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);
        layout.render_as_messages(&ctx, max_tokens).await.unwrap()
    }

    #[tokio::test]
    async fn empty_layout_renders_nothing() {
        let layout = LayoutEngine::new(vec![]);
        let text = render_text(&layout, 10).await;
        assert_eq!(text.output, "");
        assert_eq!(text.length, 0);
        assert!(!text.too_long);

        let messages = render_messages(&layout, 10).await;
        assert!(messages.output.is_empty());
        assert_eq!(messages.length, 0);
        assert!(!messages.too_long);
    }

    #[tokio::test]
    async fn messages_concatenate_in_order() {
        let layout = LayoutEngine::new(vec![
            text("aaa", -1.0, true),
            text("bb", 0.5, true),
            text("c", 10.0, true),
        ]);
        let rendered = render_messages(&layout, 100).await;
        let contents: Vec<String> = rendered.output.iter().map(Message::content_text).collect();
        assert_eq!(contents, vec!["aaa", "bb", "c"]);
        assert_eq!(rendered.length, 6);
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn last_optional_section_is_dropped_first() {
        let layout = LayoutEngine::new(vec![
            text("aaaa", -1.0, false),
            text("bbbb", -1.0, true),
            text("cccc", -1.0, false),
        ]);
        let rendered = render_messages(&layout, 9).await;
        let contents: Vec<String> = rendered.output.iter().map(Message::content_text).collect();
        assert_eq!(contents, vec!["aaaa", "bbbb"]);
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn required_sections_survive_and_flag_overflow() {
        let layout = LayoutEngine::new(vec![
            text("aaaa", -1.0, true),
            text("bbbb", -1.0, false),
            text("cccc", -1.0, true),
        ]);
        let rendered = render_messages(&layout, 5).await;
        let contents: Vec<String> = rendered.output.iter().map(Message::content_text).collect();
        assert_eq!(contents, vec!["aaaa", "cccc"]);
        assert_eq!(rendered.length, 8);
        assert!(rendered.too_long);
    }

    #[tokio::test]
    async fn proportional_sections_skipped_without_budget() {
        let layout = LayoutEngine::new(vec![text("aaaa", -1.0, true), text("bb", 0.5, true)]);
        let rendered = render_messages(&layout, 4).await;
        assert_eq!(rendered.output.len(), 1);
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn proportional_overflow_drops_optional() {
        let layout = LayoutEngine::new(vec![
            text("aaaa", -1.0, true),
            text("bbbb", 0.5, false),
            text("cc", 1.0, false),
        ]);
        // 6 left after the fixed pass; both proportional sections fit exactly.
        let rendered = render_messages(&layout, 10).await;
        assert_eq!(rendered.output.len(), 3);

        let rendered = render_messages(&layout, 9).await;
        let contents: Vec<String> = rendered.output.iter().map(Message::content_text).collect();
        assert_eq!(contents, vec!["aaaa", "bbbb"]);
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn text_mode_charges_one_separator_per_join() {
        let layout = LayoutEngine::new(vec![
            text("aa", -1.0, true),
            text("bb", -1.0, false),
        ])
        .with_separator("--");
        // aa--bb is 6 tokens
        let rendered = render_text(&layout, 5).await;
        assert_eq!(rendered.output, "aa");
        assert_eq!(rendered.length, 2);
        assert!(!rendered.too_long);

        let rendered = render_text(&layout, 6).await;
        assert_eq!(rendered.output, "aa--bb");
        assert_eq!(rendered.length, 6);
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn exact_fit_is_not_too_long() {
        let layout = LayoutEngine::new(vec![
            text("aa", -1.0, true),
            text("bb", -1.0, true),
            text("cc", -1.0, true),
        ])
        .with_separator("--");
        let rendered = render_text(&layout, 10).await;
        assert_eq!(rendered.output, "aa--bb--cc");
        assert_eq!(rendered.length, 10);
        assert!(!rendered.too_long);

        let rendered = render_text(&layout, 9).await;
        assert_eq!(rendered.length, 10);
        assert!(rendered.too_long);
    }

    #[tokio::test]
    async fn empty_outputs_cost_no_separator() {
        let layout = LayoutEngine::new(vec![
            text("aa", -1.0, true),
            text("", -1.0, true),
            text("bb", -1.0, false),
        ])
        .with_separator("--");
        let rendered = render_text(&layout, 6).await;
        assert_eq!(rendered.output, "aa--bb");
        assert!(!rendered.too_long);
    }

    #[tokio::test]
    async fn nested_layouts_are_flattened() {
        let inner = LayoutEngine::new(vec![text("bb", -1.0, false), text("cc", -1.0, true)]);
        let layout = LayoutEngine::new(vec![text("aa", -1.0, true), Section::from(inner)]);
        assert_eq!(layout.leaves().len(), 3);

        // The nested optional leaf competes with the outer ones.
        let rendered = render_messages(&layout, 4).await;
        let contents: Vec<String> = rendered.output.iter().map(Message::content_text).collect();
        assert_eq!(contents, vec!["aa", "cc"]);
    }

    #[tokio::test]
    async fn rendering_is_repeatable() {
        let layout = LayoutEngine::new(vec![
            text("Hello", 10.0, true),
            text("There", 0.5, false),
            text("World", -1.0, true),
        ]);
        let first = render_text(&layout, 15).await;
        let second = render_text(&layout, 15).await;
        assert_eq!(first, second);
    }
}
