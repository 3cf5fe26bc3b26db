//! # promptweave prompts
//!
//! Composable prompt sections and the layout engine that packs them under a
//! token ceiling.
//!
//! A prompt is a tree of [`Section`]s. Leaves implement [`PromptSection`]
//! (literal text, templates, conversation history, data sources, user
//! input, function call/response messages, groups); composites are
//! [`LayoutEngine`]s, with [`Prompt`] as the named root. Rendering yields
//! either one block of text or a list of role-tagged messages, together with
//! the token length and a `too_long` flag. Running over budget is never an
//! error.
//!
//! ```no_run
//! use promptweave_prompts::{Prompt, Section, TemplateSection, TextSection};
//!
//! # fn build() -> Result<Prompt, promptweave_core::ConfigurationError> {
//! let prompt = Prompt::new(vec![
//!     Section::leaf(TextSection::new("You are a helpful assistant.", "system")),
//!     Section::leaf(TemplateSection::user("{{$temp.input}}")?),
//! ]);
//! # Ok(prompt)
//! # }
//! ```

/// Sizing builders shared by every leaf section holding an `options` field.
macro_rules! section_builders {
    ($ty:ty) => {
        impl $ty {
            /// Sizing policy: negative = auto, `0..=1` = proportional, `> 1` = fixed cap.
            pub fn with_tokens(mut self, tokens: f64) -> Self {
                self.options = self.options.with_tokens(tokens);
                self
            }

            pub fn with_required(mut self, required: bool) -> Self {
                self.options = self.options.with_required(required);
                self
            }

            pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
                self.options = self.options.with_separator(separator);
                self
            }

            pub fn with_text_prefix(mut self, text_prefix: impl Into<String>) -> Self {
                self.options = self.options.with_text_prefix(text_prefix);
                self
            }
        }
    };
}

pub mod catalog;
pub mod data_source;
pub mod function_messages;
pub mod group;
pub mod history;
pub mod layout;
pub mod prompt;
pub mod section;
pub mod template;
pub mod text;
pub mod user_input;

pub use catalog::{PromptCatalog, PromptTemplate};
pub use data_source::{DataSourceSection, TextDataSource};
pub use function_messages::{FunctionCallMessage, FunctionResponseMessage};
pub use group::GroupSection;
pub use history::ConversationHistory;
pub use layout::LayoutEngine;
pub use prompt::Prompt;
pub use section::{PromptSection, Section, SectionOptions, Sizing};
pub use template::TemplateSection;
pub use text::TextSection;
pub use user_input::UserInputMessage;
