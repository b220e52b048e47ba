//! Configuration management for reviewlens.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - `.env` in the working directory
//! - YAML config file (`.reviewlens/config.yaml` or `REVIEWLENS_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The result is loaded once at startup and read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the chat client factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["openai", "azure", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .reviewlens/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat provider ("openai", "azure", "ollama")
    pub provider: String,

    /// Model identifier sent with every chat request
    pub model: String,

    /// Log filter override
    pub log_level: Option<String>,

    /// Emit JSON log lines
    pub log_json: bool,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub retrieval: RetrievalSettings,
    pub synthesis: SynthesisSettings,
    pub access: AccessSettings,
}

/// Chat and embedding endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// Public OpenAI key (`OPENAI_API_KEY`)
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible base URL
    pub openai_base_url: String,

    /// Azure OpenAI resource endpoint
    pub azure_endpoint: Option<String>,

    /// Azure chat deployment name
    pub azure_deployment: Option<String>,

    #[serde(skip_serializing)]
    pub azure_api_key: Option<String>,

    pub azure_api_version: String,

    /// Azure embedding deployment, required for client-side vectors
    pub embedding_deployment: Option<String>,

    pub ollama_endpoint: String,

    /// HTTP timeout for model calls, in seconds
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
            azure_endpoint: None,
            azure_deployment: None,
            azure_api_key: None,
            azure_api_version: "2024-02-01".to_string(),
            embedding_deployment: None,
            ollama_endpoint: "http://localhost:11434".to_string(),
            timeout_secs: 60,
        }
    }
}

/// How the vector half of the hybrid query is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VectorMode {
    /// Send the text; the index vectorizes it
    #[default]
    Text,
    /// Embed client-side and send the raw vector
    Embedded,
}

/// Hosted search index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchSettings {
    pub endpoint: Option<String>,
    pub index_name: Option<String>,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    pub api_version: String,

    /// Index field holding review embeddings
    pub vector_field: String,

    pub vector_mode: VectorMode,

    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            index_name: None,
            api_key: None,
            api_version: "2023-11-01".to_string(),
            vector_field: "embedding".to_string(),
            vector_mode: VectorMode::Text,
            timeout_secs: 30,
        }
    }
}

/// Retrieval defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub score_threshold: f64,

    /// Fail the question when the rewriter returns no usable term list,
    /// instead of searching with the question itself
    pub strict_terms: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 10,
            score_threshold: 0.02,
            strict_terms: false,
        }
    }
}

/// Answer synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthesisSettings {
    /// Ask the model to quantify positive/negative/neutral sentiment
    pub sentiment: bool,
    pub temperature: f32,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            sentiment: true,
            temperature: 0.5,
        }
    }
}

/// Whether retrieval requires a logged-in session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Business scope is optional
    #[default]
    Open,
    /// Every retrieval is scoped to the session's bound business
    Gated,
}

/// Session gate settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessSettings {
    pub mode: AccessMode,

    /// Shared secret -> business identifier
    #[serde(skip_serializing)]
    pub secrets: HashMap<String, String>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    provider: Option<String>,
    model: Option<String>,
    llm: Option<LlmSettings>,
    search: Option<SearchSettings>,
    retrieval: Option<RetrievalSettings>,
    synthesis: Option<SynthesisSettings>,
    access: Option<AccessSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            log_level: None,
            log_json: false,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
            retrieval: RetrievalSettings::default(),
            synthesis: SynthesisSettings::default(),
            access: AccessSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, the config file and the environment.
    ///
    /// # Example
    /// ```no_run
    /// use reviewlens_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Search index: {:?}", config.search.index_name);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration with an explicit workspace and/or config file.
    ///
    /// Explicit arguments take precedence over `REVIEWLENS_WORKSPACE` and
    /// `REVIEWLENS_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        // A missing .env is normal
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(ws) = workspace.or_else(|| std::env::var("REVIEWLENS_WORKSPACE").ok().map(PathBuf::from)) {
            config.workspace = ws;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("REVIEWLENS_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => {
                if !cf.exists() {
                    return Err(AppError::Config(format!("Config file not found: {:?}", cf)));
                }
                cf.clone()
            }
            None => config.reviewlens_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        }

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&mut self, contents: &str) -> Result<(), serde_yaml::Error> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;

        if let Some(provider) = file.provider {
            self.provider = provider;
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(llm) = file.llm {
            self.llm = llm;
        }
        if let Some(search) = file.search {
            self.search = search;
        }
        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }
        if let Some(synthesis) = file.synthesis {
            self.synthesis = synthesis;
        }
        if let Some(access) = file.access {
            self.access = access;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.log_json = json;
            }
        }

        Ok(())
    }

    /// Apply environment variables through `lookup`.
    ///
    /// Environment variables:
    /// - `REVIEWLENS_PROVIDER`, `REVIEWLENS_MODEL`
    /// - `REVIEWLENS_ACCESS_MODE` (`open` | `gated`)
    /// - `REVIEWLENS_SECRETS` (`secret=business,secret2=business2`)
    /// - `AZURE_SEARCH_ENDPOINT`, `AZURE_SEARCH_INDEX_NAME`, `AZURE_SEARCH_API_KEY`
    /// - `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`
    /// - `AZURE_OPENAI_CHAT_DEPLOYMENT` (chat, `azure` provider only)
    /// - `AZURE_OPENAI_EMBEDDING_DEPLOYMENT`, falling back to
    ///   `AZURE_OPENAI_DEPLOYMENT`, which names the embedding deployment
    /// - `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OLLAMA_URL`
    /// - `RUST_LOG`, `NO_COLOR`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("REVIEWLENS_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("REVIEWLENS_MODEL") {
            self.model = model;
        }

        if let Some(v) = lookup("AZURE_SEARCH_ENDPOINT") {
            self.search.endpoint = Some(v);
        }
        if let Some(v) = lookup("AZURE_SEARCH_INDEX_NAME") {
            self.search.index_name = Some(v);
        }
        if let Some(v) = lookup("AZURE_SEARCH_API_KEY") {
            self.search.api_key = Some(v);
        }

        if let Some(v) = lookup("AZURE_OPENAI_ENDPOINT") {
            self.llm.azure_endpoint = Some(v);
        }
        if let Some(v) = lookup("AZURE_OPENAI_CHAT_DEPLOYMENT") {
            self.llm.azure_deployment = Some(v);
        }
        if let Some(v) = lookup("AZURE_OPENAI_API_KEY") {
            self.llm.azure_api_key = Some(v);
        }
        if let Some(v) = lookup("AZURE_OPENAI_EMBEDDING_DEPLOYMENT")
            .or_else(|| lookup("AZURE_OPENAI_DEPLOYMENT"))
        {
            self.llm.embedding_deployment = Some(v);
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(v);
        }
        if let Some(v) = lookup("OPENAI_BASE_URL") {
            self.llm.openai_base_url = v;
        }
        if let Some(v) = lookup("OLLAMA_URL") {
            self.llm.ollama_endpoint = v;
        }

        if let Some(mode) = lookup("REVIEWLENS_ACCESS_MODE") {
            match mode.to_lowercase().as_str() {
                "gated" => self.access.mode = AccessMode::Gated,
                "open" => self.access.mode = AccessMode::Open,
                other => tracing::warn!("Ignoring unknown REVIEWLENS_ACCESS_MODE: {}", other),
            }
        }
        if let Some(pairs) = lookup("REVIEWLENS_SECRETS") {
            self.access.secrets.extend(parse_secret_pairs(&pairs));
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the environment and the config file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .reviewlens directory.
    pub fn reviewlens_dir(&self) -> PathBuf {
        self.workspace.join(".reviewlens")
    }

    /// Validate configuration for the active provider and search index.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        match provider {
            "openai" => require(&self.llm.openai_api_key, "OPENAI_API_KEY")?,
            "azure" => {
                require(&self.llm.azure_endpoint, "AZURE_OPENAI_ENDPOINT")?;
                require(&self.llm.azure_deployment, "AZURE_OPENAI_CHAT_DEPLOYMENT")?;
                require(&self.llm.azure_api_key, "AZURE_OPENAI_API_KEY")?;
            }
            _ => {}
        }

        self.validate_search()?;

        if self.search.vector_mode == VectorMode::Embedded {
            require(&self.llm.azure_endpoint, "AZURE_OPENAI_ENDPOINT")?;
            require(&self.llm.azure_api_key, "AZURE_OPENAI_API_KEY")?;
            require(
                &self.llm.embedding_deployment,
                "AZURE_OPENAI_EMBEDDING_DEPLOYMENT",
            )?;
        }

        if self.access.mode == AccessMode::Gated && self.access.secrets.is_empty() {
            return Err(AppError::Config(
                "Gated access mode requires at least one configured secret".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate only the search and retrieval settings.
    pub fn validate_search(&self) -> AppResult<()> {
        require(&self.search.endpoint, "AZURE_SEARCH_ENDPOINT")?;
        require(&self.search.index_name, "AZURE_SEARCH_INDEX_NAME")?;
        require(&self.search.api_key, "AZURE_SEARCH_API_KEY")?;

        let threshold = self.retrieval.score_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(AppError::Config(format!(
                "Score threshold must be a non-negative number, got {}",
                threshold
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        Ok(())
    }
}

fn require(value: &Option<String>, name: &str) -> AppResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(AppError::Config(format!("Missing required setting: {}", name))),
    }
}

/// Parse `secret=business,secret2=business2`. Malformed pairs are skipped.
pub fn parse_secret_pairs(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (secret, business) = pair.split_once('=')?;
            let (secret, business) = (secret.trim(), business.trim());
            if secret.is_empty() || business.is_empty() {
                return None;
            }
            Some((secret.to_string(), business.to_string()))
        })
        .collect()
}
