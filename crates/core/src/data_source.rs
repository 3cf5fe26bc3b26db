//! Data sources: budgeted external content providers.
//!
//! A data source is asked to render at most `max_tokens` tokens of content
//! for the current turn (retrieval results, documents, ...). It is
//! registered by name and wrapped by a data-source section.

use crate::error::RenderError;
use crate::memory::Memory;
use crate::render::{RenderedSection, TurnContext};
use crate::tokenizer::Tokenizer;
use async_trait::async_trait;

#[async_trait]
pub trait DataSource: Send + Sync {
    /// The unique name of this data source.
    fn name(&self) -> &str;

    /// Render content within `max_tokens` tokens.
    async fn render_data(
        &self,
        turn: &TurnContext,
        memory: &dyn Memory,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> std::result::Result<RenderedSection<String>, RenderError>;
}
