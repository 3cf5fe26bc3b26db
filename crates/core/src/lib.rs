//! # promptweave core
//!
//! Domain types, collaborator traits, and error definitions for the
//! promptweave prompt layout engine. This crate has no opinion on how
//! prompts are laid out; it defines what every other crate agrees on.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the layout engine (tokenizer, memory,
//! prompt functions, data sources) is a trait here. Implementations live in
//! their respective crates, so the engine can be tested against stubs and
//! deployed against real services without change.

pub mod data_source;
pub mod error;
pub mod function;
pub mod memory;
pub mod message;
pub mod render;
pub mod text;
pub mod tokenizer;

// Re-export key types at crate root for ergonomics
pub use data_source::DataSource;
pub use error::{ConfigurationError, Error, RenderError, Result};
pub use function::{FnFunction, FunctionRegistry, PromptFunction, PromptFunctions};
pub use memory::Memory;
pub use message::{ContentPart, FunctionCall, ImageUrl, Message, MessageContent, roles};
pub use render::{RenderContext, RenderedSection, TurnContext};
pub use text::to_text;
pub use tokenizer::Tokenizer;
