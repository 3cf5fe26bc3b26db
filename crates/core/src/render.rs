//! Values that flow through a render call.

use crate::function::PromptFunctions;
use crate::memory::Memory;
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The output of rendering a section, with its measured token length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSection<T> {
    /// The rendered text or messages
    pub output: T,

    /// Token count of `output`, including prefix/separator overhead
    pub length: usize,

    /// Whether `length` exceeds the ceiling the render was called with.
    /// Diagnostic only: `output` is still usable.
    pub too_long: bool,
}

impl<T: Default> RenderedSection<T> {
    /// An empty result (zero sections, nothing to say).
    pub fn empty() -> Self {
        Self {
            output: T::default(),
            length: 0,
            too_long: false,
        }
    }
}

/// Caller-supplied per-turn context. The engine never inspects it; it is
/// handed through unchanged to prompt functions and data sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnContext {
    /// Conversation the turn belongs to, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Arbitrary data for collaborators
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TurnContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_conversation(id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(id.into()),
            metadata: HashMap::new(),
        }
    }
}

/// The collaborators every section render receives.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub turn: &'a TurnContext,
    pub memory: &'a dyn Memory,
    pub functions: &'a dyn PromptFunctions,
    pub tokenizer: &'a dyn Tokenizer,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        turn: &'a TurnContext,
        memory: &'a dyn Memory,
        functions: &'a dyn PromptFunctions,
        tokenizer: &'a dyn Tokenizer,
    ) -> Self {
        Self {
            turn,
            memory,
            functions,
            tokenizer,
        }
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("turn", self.turn)
            .finish_non_exhaustive()
    }
}
