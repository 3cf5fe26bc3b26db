//! Template sections: text with `{{$variable}}` and `{{function args}}`
//! placeholders resolved at render time.
//!
//! Templates are parsed once, at construction, by a three-state scanner
//! (text, parameter, quoted string). Quoted strings inside a parameter use
//! `'`, `"` or `` ` `` and may contain spaces and `}}`. An unterminated
//! `{{` or quote is a [`ConfigurationError`].

use crate::section::{PromptSection, SectionOptions};
use async_trait::async_trait;
use promptweave_core::{
    ConfigurationError, Message, RenderContext, RenderError, RenderedSection, roles, to_text,
};
use std::sync::OnceLock;

const QUOTES: [char; 3] = ['\'', '"', '`'];

#[derive(Debug, Clone, PartialEq)]
enum TemplatePart {
    Text(String),
    Variable(String),
    Function { name: String, args: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    Text,
    Parameter,
    Quoted(char),
}

/// A template rendered as one message with the given role.
#[derive(Debug)]
pub struct TemplateSection {
    template: String,
    role: String,
    parts: Vec<TemplatePart>,
    options: SectionOptions,
    literal_length: OnceLock<usize>,
}

impl TemplateSection {
    /// Parse `template`. Auto-sized, required, separator `"\n"`.
    pub fn new(
        template: impl Into<String>,
        role: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let template = template.into();
        let parts = parse(&template)?;
        Ok(Self {
            template,
            role: role.into(),
            parts,
            options: SectionOptions::new(-1.0, true),
            literal_length: OnceLock::new(),
        })
    }

    /// A `system` message template.
    pub fn system(template: impl Into<String>) -> Result<Self, ConfigurationError> {
        Self::new(template, roles::SYSTEM)
    }

    /// A `user` message template, prefixed `"user: "` in text form.
    pub fn user(template: impl Into<String>) -> Result<Self, ConfigurationError> {
        Ok(Self::new(template, roles::USER)?.with_text_prefix("user: "))
    }

    /// An `assistant` message template, prefixed `"assistant: "` in text form.
    pub fn assistant(template: impl Into<String>) -> Result<Self, ConfigurationError> {
        Ok(Self::new(template, roles::ASSISTANT)?.with_text_prefix("assistant: "))
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// Names of the functions the template calls, in order of appearance.
    pub fn function_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                TemplatePart::Function { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Memory paths the template reads, in order of appearance.
    pub fn variable_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                TemplatePart::Variable(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn is_literal(&self) -> bool {
        self.parts
            .iter()
            .all(|part| matches!(part, TemplatePart::Text(_)))
    }

    async fn resolve(&self, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let mut text = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Text(literal) => text.push_str(literal),
                TemplatePart::Variable(path) => {
                    if let Some(value) = ctx.memory.get_value(path) {
                        text.push_str(&to_text(ctx.tokenizer, &value));
                    }
                }
                TemplatePart::Function { name, args } => {
                    let value = ctx
                        .functions
                        .invoke_function(name, ctx.turn, ctx.memory, ctx.tokenizer, args)
                        .await?;
                    text.push_str(&to_text(ctx.tokenizer, &value));
                }
            }
        }
        Ok(text)
    }
}

section_builders!(TemplateSection);

#[async_trait]
impl PromptSection for TemplateSection {
    fn options(&self) -> &SectionOptions {
        &self.options
    }

    async fn render_as_messages(
        &self,
        ctx: &RenderContext<'_>,
        max_tokens: usize,
    ) -> Result<RenderedSection<Vec<Message>>, RenderError> {
        let text = self.resolve(ctx).await?;
        let length = if self.is_literal() {
            *self
                .literal_length
                .get_or_init(|| ctx.tokenizer.count(&text))
        } else {
            ctx.tokenizer.count(&text)
        };

        let messages = vec![Message::new(self.role.as_str(), text)];
        Ok(self
            .options
            .fit_messages(messages, length, ctx.tokenizer, max_tokens))
    }
}

fn invalid(template: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.into(),
    }
}

fn parse(template: &str) -> Result<Vec<TemplatePart>, ConfigurationError> {
    let mut parts = Vec::new();
    let mut state = ScanState::Text;
    let mut buffer = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            ScanState::Text => {
                if c == '{' && chars.peek() == Some(&'{') {
                    chars.next();
                    if !buffer.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut buffer)));
                    }
                    state = ScanState::Parameter;
                } else {
                    buffer.push(c);
                }
            }
            ScanState::Parameter => {
                if c == '}' && chars.peek() == Some(&'}') {
                    chars.next();
                    if let Some(part) = parameter(template, buffer.trim())? {
                        parts.push(part);
                    }
                    buffer.clear();
                    state = ScanState::Text;
                } else {
                    buffer.push(c);
                    if QUOTES.contains(&c) {
                        state = ScanState::Quoted(c);
                    }
                }
            }
            ScanState::Quoted(quote) => {
                buffer.push(c);
                if c == quote {
                    state = ScanState::Parameter;
                }
            }
        }
    }

    match state {
        ScanState::Text => {
            if !buffer.is_empty() {
                parts.push(TemplatePart::Text(buffer));
            }
            Ok(parts)
        }
        ScanState::Parameter => Err(invalid(template, "unterminated '{{'")),
        ScanState::Quoted(quote) => Err(invalid(template, format!("unterminated {quote} string"))),
    }
}

/// Turn the trimmed body of a `{{...}}` into a part. Empty bodies vanish.
fn parameter(template: &str, body: &str) -> Result<Option<TemplatePart>, ConfigurationError> {
    if body.is_empty() {
        return Ok(None);
    }

    if let Some(path) = body.strip_prefix('$') {
        let path = path.trim();
        if path.is_empty() {
            return Err(invalid(template, "empty variable name"));
        }
        return Ok(Some(TemplatePart::Variable(path.to_string())));
    }

    let mut words = split_arguments(body).into_iter();
    let name = words.next().unwrap_or_default();
    if name.is_empty() {
        return Err(invalid(template, "empty function name"));
    }
    Ok(Some(TemplatePart::Function {
        name,
        args: words.collect(),
    }))
}

/// Split on spaces and tabs, keeping quoted runs together without quotes.
fn split_arguments(body: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut open: Option<char> = None;

    for c in body.chars() {
        match open {
            Some(quote) if c == quote => open = None,
            Some(_) => current.push(c),
            None if QUOTES.contains(&c) => {
                open = Some(c);
                quoted = true;
            }
            None if c == ' ' || c == '\t' => {
                if !current.is_empty() || quoted {
                    args.push(std::mem::take(&mut current));
                    quoted = false;
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        args.push(current);
    }
    args
}
