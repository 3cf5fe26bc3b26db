//! Sections replaying a function call and its response.

use crate::section::{PromptSection, SectionOptions};
use async_trait::async_trait;
use promptweave_core::{FunctionCall, Message, RenderContext, RenderError, RenderedSection, to_text};
use serde_json::Value;
use std::sync::OnceLock;

/// An assistant message requesting a function call. Measured as the call's
/// JSON form.
#[derive(Debug)]
pub struct FunctionCallMessage {
    call: FunctionCall,
    options: SectionOptions,
    length: OnceLock<usize>,
}

impl FunctionCallMessage {
    /// Auto-sized, required, prefixed `"assistant: "` in text form.
    pub fn new(call: FunctionCall) -> Self {
        Self {
            call,
            options: SectionOptions::new(-1.0, true).with_text_prefix("assistant: "),
            length: OnceLock::new(),
        }
    }

    pub fn call(&self) -> &FunctionCall {
        &self.call
    }
}

section_builders!(FunctionCallMessage);

#[async_trait]
impl PromptSection for FunctionCallMessage {
    fn options(&self) -> &SectionOptions {
        &self.options
    }

    async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        let message = Message::function_call(self.call.clone());
        let length = *self
            .length
            .get_or_init(|| ctx.tokenizer.count(&message.to_text()));
        Ok(self
            .options
            .fit_messages(vec![message], length, ctx.tokenizer, max_tokens))
    }
}

/// A `function` message carrying a function's result.
///
/// Measured as the function name plus the result's text form.
#[derive(Debug)]
pub struct FunctionResponseMessage {
    name: String,
    response: Value,
    options: SectionOptions,
}

impl FunctionResponseMessage {
    /// Auto-sized, required, prefixed `"user: "` in text form.
    pub fn new(name: impl Into<String>, response: Value) -> Self {
        Self {
            name: name.into(),
            response,
            options: SectionOptions::new(-1.0, true).with_text_prefix("user: "),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

section_builders!(FunctionResponseMessage);

#[async_trait]
impl PromptSection for FunctionResponseMessage {
    fn options(&self) -> &SectionOptions {
        &self.options
    }

    async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        let content = to_text(ctx.tokenizer, &self.response);
        let length = ctx.tokenizer.count(&self.name) + ctx.tokenizer.count(&content);
        let messages = vec![Message::function_response(self.name.as_str(), content)];
        Ok(self
            .options
            .fit_messages(messages, length, ctx.tokenizer, max_tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptweave_core::{FunctionRegistry, TurnContext};
    use promptweave_memory::EmptyMemory;
    use promptweave_tokenizers::CharTokenizer;
    use serde_json::json;

    #[tokio::test]
    async fn call_renders_as_assistant_json() {
        let section = FunctionCallMessage::new(FunctionCall::new("lookup", r#"{"id":1}"#));
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);

        let rendered = section.render_as_messages(&ctx, 100).await.unwrap();
        assert_eq!(rendered.output.len(), 1);
        assert_eq!(rendered.output[0].role, "assistant");
        assert_eq!(rendered.output[0].function_call.as_ref(), Some(section.call()));
        let json = rendered.output[0].to_text();
        assert_eq!(rendered.length, json.chars().count());

        let text = section.render_as_text(&ctx, 100).await.unwrap();
        assert_eq!(text.output, format!("assistant: {json}"));
    }

    #[tokio::test]
    async fn response_renders_name_and_content() {
        let section = FunctionResponseMessage::new("lookup", json!("found"));
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);

        let rendered = section.render_as_messages(&ctx, 100).await.unwrap();
        assert_eq!(
            rendered.output,
            vec![Message::function_response("lookup", "found")]
        );
        assert_eq!(rendered.length, 6 + 5);

        let text = section.render_as_text(&ctx, 100).await.unwrap();
        assert_eq!(text.output, "user: lookup returned found");
        assert_eq!(text.length, 6 + 11);
    }

    #[tokio::test]
    async fn structured_response_uses_to_text() {
        let section = FunctionResponseMessage::new("count", json!(7));
        let turn = TurnContext::new();
        let functions = FunctionRegistry::new();
        let ctx = RenderContext::new(&turn, &EmptyMemory, &functions, &CharTokenizer);

        let rendered = section.render_as_messages(&ctx, 100).await.unwrap();
        assert_eq!(rendered.output[0].content_text(), "7");
    }
}
