//! The prompt catalog: registered data sources, functions and prompts.
//!
//! Prompts are either registered directly or loaded on first use from
//! `<prompts_folder>/<name>/skprompt.txt` with its `config.json`. A loaded
//! prompt is assembled, in order, from:
//!
//! 1. one data source section per `augmentation.data_sources` entry
//! 2. the template itself, in the catalog role
//! 3. conversation history, when `include_history` is set
//! 4. the user input, when `include_input` is set (with images when
//!    `include_images` is set)
//!
//! Every reference is checked while loading: an unknown data source or
//! template function is a [`ConfigurationError`], never a render failure.

use crate::data_source::DataSourceSection;
use crate::history::ConversationHistory;
use crate::prompt::Prompt;
use crate::section::Section;
use crate::template::TemplateSection;
use crate::user_input::UserInputMessage;
use async_trait::async_trait;
use promptweave_config::{CatalogConfig, PromptTemplateConfig, WeaveConfig};
use promptweave_core::{
    ConfigurationError, DataSource, FunctionRegistry, PromptFunction, PromptFunctions,
};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::info;

const TEMPLATE_FILE: &str = "skprompt.txt";
const CONFIG_FILE: &str = "config.json";

/// A prompt together with the settings it was defined with.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub prompt: Prompt,
    pub config: PromptTemplateConfig,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, prompt: Prompt, config: PromptTemplateConfig) -> Self {
        let name = name.into();
        Self {
            prompt: prompt.named(name.clone()),
            name,
            config,
        }
    }

    /// The ceiling this prompt should be rendered with.
    pub fn max_input_tokens(&self) -> usize {
        self.config.completion.max_input_tokens
    }
}

/// Registry of everything prompts can reference.
pub struct PromptCatalog {
    prompts_folder: Option<PathBuf>,
    settings: CatalogConfig,
    defaults: PromptTemplateConfig,
    data_sources: HashMap<String, Arc<dyn DataSource>>,
    functions: FunctionRegistry,
    prompts: RwLock<HashMap<String, Arc<PromptTemplate>>>,
}

impl PromptCatalog {
    /// A catalog holding only what gets registered.
    pub fn new(settings: CatalogConfig) -> Self {
        Self {
            prompts_folder: None,
            settings,
            defaults: PromptTemplateConfig::default(),
            data_sources: HashMap::new(),
            functions: FunctionRegistry::new(),
            prompts: RwLock::new(HashMap::new()),
        }
    }

    /// A catalog that also loads prompts from `folder`.
    pub fn with_folder(folder: impl Into<PathBuf>, settings: CatalogConfig) -> Self {
        Self {
            prompts_folder: Some(folder.into()),
            ..Self::new(settings)
        }
    }

    /// A catalog over the configured folder. Prompts without a
    /// `config.json` are rendered with the configured ceiling.
    pub fn from_config(config: &WeaveConfig) -> Self {
        let mut defaults = PromptTemplateConfig::default();
        defaults.completion.max_input_tokens = config.max_input_tokens;
        Self::with_folder(&config.prompts_folder, config.catalog.clone()).with_defaults(defaults)
    }

    /// Settings for prompts whose folder has no `config.json`.
    pub fn with_defaults(mut self, defaults: PromptTemplateConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn prompts_folder(&self) -> Option<&Path> {
        self.prompts_folder.as_deref()
    }

    // --- Data sources ---

    pub fn add_data_source(&mut self, source: Arc<dyn DataSource>) -> Result<(), ConfigurationError> {
        let name = source.name().to_string();
        if self.data_sources.contains_key(&name) {
            return Err(ConfigurationError::DuplicateName {
                kind: "data source",
                name,
            });
        }
        self.data_sources.insert(name, source);
        Ok(())
    }

    pub fn has_data_source(&self, name: &str) -> bool {
        self.data_sources.contains_key(name)
    }

    pub fn get_data_source(&self, name: &str) -> Result<Arc<dyn DataSource>, ConfigurationError> {
        self.data_sources
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigurationError::DataSourceNotFound(name.to_string()))
    }

    // --- Functions ---

    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        function: Arc<dyn PromptFunction>,
    ) -> Result<(), ConfigurationError> {
        self.functions.add(name, function)
    }

    pub fn add_fn<F>(&mut self, name: impl Into<String>, f: F) -> Result<(), ConfigurationError>
    where
        F: Fn(&[String]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.functions.add_fn(name, f)
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    // --- Prompts ---

    /// Register a prompt. Names are unique.
    pub fn add_prompt(&self, template: PromptTemplate) -> Result<(), ConfigurationError> {
        let mut prompts = self.prompts.write().unwrap_or_else(|e| e.into_inner());
        if prompts.contains_key(&template.name) {
            return Err(ConfigurationError::DuplicateName {
                kind: "prompt",
                name: template.name,
            });
        }
        prompts.insert(template.name.clone(), Arc::new(template));
        Ok(())
    }

    /// Whether a prompt is registered or present on disk.
    pub fn has_prompt(&self, name: &str) -> bool {
        let registered = self
            .prompts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name);
        registered || self.prompt_dir(name).is_some_and(|dir| dir.join(TEMPLATE_FILE).is_file())
    }

    /// A registered prompt, loading (and caching) it from disk if needed.
    pub fn get_prompt(&self, name: &str) -> Result<Arc<PromptTemplate>, ConfigurationError> {
        if let Some(template) = self
            .prompts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
        {
            return Ok(Arc::clone(template));
        }

        let loaded = Arc::new(self.load_prompt(name)?);
        let mut prompts = self.prompts.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(prompts.entry(name.to_string()).or_insert(loaded)))
    }

    /// Registered and on-disk prompt names, sorted.
    pub fn prompt_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self
            .prompts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();

        if let Some(entries) = self
            .prompts_folder
            .as_ref()
            .and_then(|folder| std::fs::read_dir(folder).ok())
        {
            for entry in entries.flatten() {
                if entry.path().join(TEMPLATE_FILE).is_file() {
                    names.insert(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }
        names.into_iter().collect()
    }

    /// Build a prompt from its folder, without caching it.
    pub fn load_prompt(&self, name: &str) -> Result<PromptTemplate, ConfigurationError> {
        let dir = self
            .prompt_dir(name)
            .filter(|dir| dir.join(TEMPLATE_FILE).is_file())
            .ok_or_else(|| ConfigurationError::PromptNotFound(name.to_string()))?;

        let load_error = |reason: String| ConfigurationError::PromptLoad {
            name: name.to_string(),
            reason,
        };
        let text = std::fs::read_to_string(dir.join(TEMPLATE_FILE))
            .map_err(|e| load_error(e.to_string()))?;
        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            PromptTemplateConfig::load_from(&config_path).map_err(|e| load_error(e.to_string()))?
        } else {
            self.defaults.clone()
        };

        let sections = self.assemble(name, &text, &config)?;
        info!(
            prompt = name,
            sections = sections.len(),
            max_input_tokens = config.completion.max_input_tokens,
            "Loaded prompt template"
        );
        Ok(PromptTemplate::new(name, Prompt::new(sections), config))
    }

    fn assemble(
        &self,
        name: &str,
        text: &str,
        config: &PromptTemplateConfig,
    ) -> Result<Vec<Section>, ConfigurationError> {
        let mut sections = Vec::new();

        for (source_name, tokens) in config.data_sources() {
            let source = self.get_data_source(source_name)?;
            sections.push(Section::leaf(DataSourceSection::new(source).with_tokens(tokens)));
        }

        let template = TemplateSection::new(text, self.settings.role.as_str())?;
        if let Some(missing) = template
            .function_names()
            .into_iter()
            .find(|function| !self.functions.has_function(function))
        {
            return Err(ConfigurationError::FunctionNotFound(missing.to_string()));
        }
        sections.push(Section::leaf(template));

        let completion = &config.completion;
        if completion.include_history {
            let history = ConversationHistory::new(self.settings.history_variable(name))
                .with_tokens(self.settings.max_conversation_history_tokens);
            sections.push(Section::leaf(history));
        }

        if completion.include_input {
            let input = &self.settings.input_variable;
            let tokens = self.settings.max_input_tokens;
            if completion.include_images {
                let files = format!("{input}Files");
                sections.push(Section::leaf(
                    UserInputMessage::with_variables(input.as_str(), files).with_tokens(tokens),
                ));
            } else {
                let template = TemplateSection::user(format!("{{{{${input}}}}}"))?;
                sections.push(Section::leaf(template.with_tokens(tokens)));
            }
        }

        Ok(sections)
    }

    fn prompt_dir(&self, name: &str) -> Option<PathBuf> {
        // Names are single folder components.
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return None;
        }
        self.prompts_folder.as_ref().map(|folder| folder.join(name))
    }
}

#[async_trait]
impl PromptFunctions for PromptCatalog {
    fn has_function(&self, name: &str) -> bool {
        self.functions.has_function(name)
    }

    fn get_function(&self, name: &str) -> Option<Arc<dyn PromptFunction>> {
        self.functions.get_function(name)
    }
}

impl std::fmt::Debug for PromptCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut data_sources: Vec<&str> = self.data_sources.keys().map(String::as_str).collect();
        data_sources.sort_unstable();
        f.debug_struct("PromptCatalog")
            .field("prompts_folder", &self.prompts_folder)
            .field("data_sources", &data_sources)
            .field("functions", &self.functions)
            .finish_non_exhaustive()
    }
}
