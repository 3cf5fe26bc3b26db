//! Prompt functions: callables a template can invoke with `{{name args}}`.
//!
//! Functions are registered by name in a [`FunctionRegistry`] (or any other
//! [`PromptFunctions`] implementation, such as the prompt catalog) and
//! invoked while a template section renders.

use crate::error::{ConfigurationError, RenderError};
use crate::memory::Memory;
use crate::render::TurnContext;
use crate::tokenizer::Tokenizer;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A single prompt function.
#[async_trait]
pub trait PromptFunction: Send + Sync {
    /// Invoke the function with the arguments parsed out of the template.
    async fn invoke(
        &self,
        turn: &TurnContext,
        memory: &dyn Memory,
        tokenizer: &dyn Tokenizer,
        args: &[String],
    ) -> std::result::Result<Value, RenderError>;
}

/// Lookup and invocation of named prompt functions.
#[async_trait]
pub trait PromptFunctions: Send + Sync {
    /// Whether a function with this name exists.
    fn has_function(&self, name: &str) -> bool;

    /// Get a function by name.
    fn get_function(&self, name: &str) -> Option<Arc<dyn PromptFunction>>;

    /// Invoke a function by name.
    async fn invoke_function(
        &self,
        name: &str,
        turn: &TurnContext,
        memory: &dyn Memory,
        tokenizer: &dyn Tokenizer,
        args: &[String],
    ) -> std::result::Result<Value, RenderError> {
        let function = self
            .get_function(name)
            .ok_or_else(|| RenderError::FunctionNotFound(name.to_string()))?;
        function.invoke(turn, memory, tokenizer, args).await
    }
}

/// Adapter turning a synchronous closure over the argument list into a
/// [`PromptFunction`].
pub struct FnFunction<F> {
    name: String,
    f: F,
}

impl<F> FnFunction<F>
where
    F: Fn(&[String]) -> std::result::Result<Value, String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> PromptFunction for FnFunction<F>
where
    F: Fn(&[String]) -> std::result::Result<Value, String> + Send + Sync,
{
    async fn invoke(
        &self,
        _turn: &TurnContext,
        _memory: &dyn Memory,
        _tokenizer: &dyn Tokenizer,
        args: &[String],
    ) -> std::result::Result<Value, RenderError> {
        (self.f)(args).map_err(|reason| RenderError::Function {
            name: self.name.clone(),
            reason,
        })
    }
}

/// A registry of named prompt functions.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn PromptFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function. Names are unique.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        function: Arc<dyn PromptFunction>,
    ) -> std::result::Result<(), ConfigurationError> {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return Err(ConfigurationError::DuplicateName {
                kind: "function",
                name,
            });
        }
        self.functions.insert(name, function);
        Ok(())
    }

    /// Register a synchronous closure as a function.
    pub fn add_fn<F>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> std::result::Result<(), ConfigurationError>
    where
        F: Fn(&[String]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        let name = name.into();
        let function = Arc::new(FnFunction::new(name.clone(), f));
        self.add(name, function)
    }

    /// List all registered function names.
    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl PromptFunctions for FunctionRegistry {
    fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn get_function(&self, name: &str) -> Option<Arc<dyn PromptFunction>> {
        self.functions.get(name).cloned()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}
