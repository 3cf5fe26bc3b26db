//! Conversation history: the most recent messages that fit the budget.

use crate::section::{PromptSection, SectionOptions};
use async_trait::async_trait;
use promptweave_core::{
    Message, MessageContent, RenderContext, RenderError, RenderedSection, Tokenizer, to_text,
};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Renders the message list stored under a memory variable (oldest first),
/// keeping the newest messages that fit.
///
/// The newest message is always kept when the section is required, even if
/// it alone exceeds the budget; nothing older is added after it in that case.
#[derive(Debug)]
pub struct ConversationHistory {
    variable: String,
    options: SectionOptions,
    drop_orphaned_tool_messages: bool,
    max_messages: Option<usize>,
}

impl ConversationHistory {
    /// Proportional (`tokens = 1.0`), optional, separator `"\n"`.
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            options: SectionOptions::new(1.0, false),
            drop_orphaned_tool_messages: false,
            max_messages: None,
        }
    }

    /// Drop function/tool responses whose call is not in the window.
    pub fn drop_orphaned_tool_messages(mut self, drop: bool) -> Self {
        self.drop_orphaned_tool_messages = drop;
        self
    }

    /// Keep at most this many messages.
    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = Some(max_messages);
        self
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    fn load(&self, ctx: &RenderContext<'_>) -> Vec<Message> {
        match ctx.memory.get_value(&self.variable) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    let message = message_from_value(ctx.tokenizer, item);
                    if message.is_none() {
                        warn!(variable = %self.variable, "Skipping history entry that is not a message");
                    }
                    message
                })
                .collect(),
            Some(_) => {
                warn!(variable = %self.variable, "History variable is not a list; ignoring it");
                Vec::new()
            }
        }
    }
}

section_builders!(ConversationHistory);

#[async_trait]
impl PromptSection for ConversationHistory {
    fn options(&self) -> &SectionOptions {
        &self.options
    }

    async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        let mut history = self.load(ctx);
        if self.drop_orphaned_tool_messages {
            history = drop_orphans(history);
        }

        let budget = self.options.token_budget(max_tokens);
        let limit = self.max_messages.unwrap_or(usize::MAX);
        let mut window: VecDeque<(Message, usize)> = VecDeque::new();
        let mut tokens = 0;

        for message in history.into_iter().rev() {
            if window.len() >= limit {
                break;
            }
            let length = ctx.tokenizer.count(&message.to_text());
            if window.is_empty() && self.options.required() {
                tokens += length;
                window.push_front((message, length));
                if length > budget {
                    break;
                }
                continue;
            }
            if tokens + length > budget {
                break;
            }
            tokens += length;
            window.push_front((message, length));
        }

        if self.drop_orphaned_tool_messages {
            // The window may have cut a response off from its call.
            while window.len() > 1 && window.front().is_some_and(|(m, _)| m.is_call_response()) {
                if let Some((_, length)) = window.pop_front() {
                    tokens -= length;
                }
            }
        }

        debug!(
            variable = %self.variable,
            messages = window.len(),
            tokens,
            budget,
            "History windowed"
        );

        Ok(RenderedSection {
            output: window.into_iter().map(|(message, _)| message).collect(),
            length: tokens,
            too_long: tokens > max_tokens,
        })
    }
}

/// Remove call responses that do not follow an assistant function call (or
/// another response to one).
fn drop_orphans(history: Vec<Message>) -> Vec<Message> {
    let mut kept = Vec::with_capacity(history.len());
    let mut answering = false;
    for message in history {
        if message.is_call_response() {
            if answering {
                kept.push(message);
            } else {
                debug!(role = %message.role, "Dropping orphaned tool message");
            }
        } else {
            answering = message.function_call.is_some();
            kept.push(message);
        }
    }
    kept
}

/// Read one stored history entry. Content that is neither a string nor a
/// list of parts is converted to text.
fn message_from_value(tokenizer: &dyn Tokenizer, value: &Value) -> Option<Message> {
    if let Ok(message) = serde_json::from_value::<Message>(value.clone()) {
        return Some(message);
    }

    let object = value.as_object()?;
    let role = object.get("role")?.as_str()?.to_string();
    let content = object
        .get("content")
        .filter(|content| !content.is_null())
        .map(|content| MessageContent::Text(to_text(tokenizer, content)));
    let name = object
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(Message {
        role,
        content,
        function_call: None,
        name,
    })
}
