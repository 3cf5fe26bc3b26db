//! Message domain types.
//!
//! A [`Message`] is what a section renders into when a prompt is laid out as
//! a conversation. Roles are free-form strings: the well-known ones live in
//! [`roles`], but callers are free to introduce others.

use serde::{Deserialize, Serialize};

/// Conventional role names.
pub mod roles {
    pub const SYSTEM: &str = "system";
    pub const USER: &str = "user";
    pub const ASSISTANT: &str = "assistant";
    pub const FUNCTION: &str = "function";
    pub const TOOL: &str = "tool";
}

/// A function call requested by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to invoke
    pub name: String,

    /// Arguments, as the model produced them (usually a JSON string)
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// The URL of an image content part (often a `data:` URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a structured (multi-modal) message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// A message body: plain text or a list of structured parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Plain-text view of the body. Text parts are joined with a newline;
    /// image parts contribute nothing.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who the message is from (`system`, `user`, `assistant`, `function`, ...)
    pub role: String,

    /// The body, if any (function calls usually carry none)
    pub content: Option<MessageContent>,

    /// Function call requested by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    /// Name of the function whose response this message carries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Create a text message with an arbitrary role.
    pub fn new(role: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            function_call: None,
            name: None,
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(roles::USER, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(roles::ASSISTANT, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(roles::SYSTEM, content)
    }

    /// Create an assistant message requesting a function call.
    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            role: roles::ASSISTANT.to_string(),
            content: None,
            function_call: Some(call),
            name: None,
        }
    }

    /// Create a message carrying the response of the named function.
    pub fn function_response(name: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self {
            role: roles::FUNCTION.to_string(),
            content: Some(content.into()),
            function_call: None,
            name: Some(name.into()),
        }
    }

    /// The body as plain text, empty when there is none.
    pub fn content_text(&self) -> String {
        self.content
            .as_ref()
            .map(MessageContent::to_text)
            .unwrap_or_default()
    }

    /// The text form of this message.
    ///
    /// A function call renders as its JSON serialization, a function
    /// response as `"{name} returned {content}"`, anything else as its
    /// content verbatim. Exactly one of the three applies.
    pub fn to_text(&self) -> String {
        if let Some(call) = &self.function_call {
            return serde_json::to_string(call).unwrap_or_default();
        }
        match &self.name {
            Some(name) => format!("{name} returned {}", self.content_text()),
            None => self.content_text(),
        }
    }

    /// True for `function`/`tool` role messages, which answer a preceding call.
    pub fn is_call_response(&self) -> bool {
        self.role == roles::FUNCTION || self.role == roles::TOOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_text_is_content() {
        let msg = Message::user("Hello World");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.to_text(), "Hello World");
    }

    #[test]
    fn function_call_renders_as_json() {
        let msg = Message::function_call(FunctionCall::new("lookup", "{\"id\":1}"));
        assert_eq!(
            msg.to_text(),
            r#"{"name":"lookup","arguments":"{\"id\":1}"}"#
        );
        assert!(msg.content.is_none());
    }

    #[test]
    fn function_response_renders_with_name() {
        let msg = Message::function_response("lookup", "42");
        assert_eq!(msg.to_text(), "lookup returned 42");
        assert!(msg.is_call_response());
    }

    #[test]
    fn call_takes_precedence_over_name() {
        let mut msg = Message::function_call(FunctionCall::new("a", "{}"));
        msg.name = Some("b".into());
        assert!(msg.to_text().starts_with("{\"name\":\"a\""));
    }

    #[test]
    fn parts_flatten_to_text_parts_only() {
        let content = MessageContent::Parts(vec![
            ContentPart::Text { text: "look".into() },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,AAAA".into(),
                },
            },
            ContentPart::Text { text: "here".into() },
        ]);
        assert_eq!(content.to_text(), "look\nhere");
    }

    #[test]
    fn message_deserializes_from_history_json() {
        let json = r#"{"role":"assistant","content":null,"function_call":{"name":"f","arguments":"{}"}}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.function_call.unwrap().name, "f");

        let json = r#"{"role":"user","content":"hi"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content, Some(MessageContent::Text("hi".into())));
    }
}
