//! The user's input for the turn, with optional image attachments.

use crate::section::{PromptSection, SectionOptions};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use promptweave_core::{
    ContentPart, ImageUrl, Message, MessageContent, RenderContext, RenderError, RenderedSection,
    to_text,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Flat token cost charged per attached image.
pub const IMAGE_TOKENS: usize = 85;

/// Renders the input variable as a `user` message, followed by any image
/// attachments as `image_url` parts.
///
/// Attachments are read from a list of objects with a `contentType` and
/// either `content` (base64 string or byte array) or `contentUrl`. Text is
/// truncated to the section's budget; images that no longer fit are skipped.
#[derive(Debug)]
pub struct UserInputMessage {
    input_variable: String,
    files_variable: String,
    options: SectionOptions,
}

impl UserInputMessage {
    /// Reads `temp.input` and `temp.inputFiles`. Auto-sized, required,
    /// prefixed `"user: "` in text form.
    pub fn new() -> Self {
        Self::with_variables("temp.input", "temp.inputFiles")
    }

    pub fn with_variables(
        input_variable: impl Into<String>,
        files_variable: impl Into<String>,
    ) -> Self {
        Self {
            input_variable: input_variable.into(),
            files_variable: files_variable.into(),
            options: SectionOptions::new(-1.0, true).with_text_prefix("user: "),
        }
    }

    fn images(&self, ctx: &RenderContext<'_>) -> Vec<String> {
        let Some(Value::Array(files)) = ctx.memory.get_value(&self.files_variable) else {
            return Vec::new();
        };
        files.iter().filter_map(image_url).collect()
    }
}

impl Default for UserInputMessage {
    fn default() -> Self {
        Self::new()
    }
}

section_builders!(UserInputMessage);

#[async_trait]
impl PromptSection for UserInputMessage {
    fn options(&self) -> &SectionOptions {
        &self.options
    }

    async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        let budget = self.options.token_budget(max_tokens);
        let mut parts = Vec::new();
        let mut length = 0;

        let input = ctx
            .memory
            .get_value(&self.input_variable)
            .map(|value| to_text(ctx.tokenizer, &value))
            .unwrap_or_default();
        if !input.is_empty() {
            let encoded = ctx.tokenizer.encode(&input);
            let text = if encoded.len() > budget {
                length = budget;
                ctx.tokenizer.decode(&encoded[..budget])
            } else {
                length = encoded.len();
                input
            };
            parts.push(ContentPart::Text { text });
        }

        for url in self.images(ctx) {
            if length + IMAGE_TOKENS > budget {
                debug!(budget, length, "Skipping image that does not fit");
                break;
            }
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl { url },
            });
            length += IMAGE_TOKENS;
        }

        if parts.is_empty() {
            return Ok(RenderedSection::empty());
        }

        let messages = vec![Message::user(MessageContent::Parts(parts))];
        Ok(self
            .options
            .fit_messages(messages, length, ctx.tokenizer, max_tokens))
    }
}

/// The URL for an image attachment, or `None` for anything else.
fn image_url(file: &Value) -> Option<String> {
    let content_type = file.get("contentType")?.as_str()?;
    if !content_type.starts_with("image/") {
        return None;
    }

    match file.get("content") {
        Some(Value::String(encoded)) => Some(format!("data:{content_type};base64,{encoded}")),
        Some(Value::Array(bytes)) => {
            let bytes: Option<Vec<u8>> = bytes
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            match bytes {
                Some(bytes) => Some(format!(
                    "data:{content_type};base64,{}",
                    STANDARD.encode(bytes)
                )),
                None => {
                    warn!(content_type, "Image content is not a byte array; skipping");
                    None
                }
            }
        }
        _ => file
            .get("contentUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
