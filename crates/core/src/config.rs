//! Configuration management for the concierge.
//!
//! Configuration is layered, lowest precedence first:
//! - Built-in defaults
//! - `.env` file (loaded into the process environment, never overriding it)
//! - YAML config file (`concierge.yaml` in the workspace)
//! - Environment variables
//! - Command-line flags (see [`CliOverrides`])
//!
//! Secrets are only ever read from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file name, looked up in the workspace root.
pub const CONFIG_FILE_NAME: &str = "concierge.yaml";

/// Chat providers the LLM crate knows how to build.
pub const KNOWN_CHAT_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Embedding providers the knowledge crate knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["gemini", "trigram"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (relative paths resolve against it)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// HTTP server settings
    pub server: ServerSettings,

    /// Chat model settings
    pub llm: LlmSettings,

    /// Embedding model settings
    pub embeddings: EmbeddingSettings,

    /// Source document and retrieval settings
    pub knowledge: KnowledgeSettings,

    /// Web search provider settings
    pub search: SearchSettings,

    /// Agent loop settings
    pub agent: AgentSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Answer agent failures with 502 instead of 200 (body is unchanged)
    pub surface_agent_errors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Chat provider ("gemini", "ollama")
    pub provider: String,
    pub model: String,
    /// Custom API base URL
    pub endpoint: Option<String>,
    pub temperature: f32,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Embedding provider ("gemini", "trigram")
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    /// Expected vector dimensions; `None` accepts whatever the provider returns
    pub dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    /// Source document, read once at startup
    pub document: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Passages returned per retrieval
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    pub endpoint: String,
    pub max_results: usize,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Rendered into the system prompt
    pub business_name: String,
    pub max_steps: usize,
    /// Per outbound HTTP call
    pub request_timeout_secs: u64,
    /// Whole agent run
    pub agent_timeout_secs: u64,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    server: Option<ServerFile>,
    llm: Option<LlmFile>,
    embeddings: Option<EmbeddingFile>,
    knowledge: Option<KnowledgeFile>,
    search: Option<SearchFile>,
    agent: Option<AgentFile>,
    logging: Option<LoggingFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerFile {
    host: Option<String>,
    port: Option<u16>,
    surface_agent_errors: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmFile {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingFile {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeFile {
    document: Option<PathBuf>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFile {
    endpoint: Option<String>,
    max_results: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentFile {
    business_name: Option<String>,
    max_steps: Option<usize>,
    request_timeout_secs: Option<u64>,
    agent_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LoggingFile {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub document: Option<PathBuf>,
    pub model: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 5000,
                surface_agent_errors: false,
            },
            llm: LlmSettings {
                provider: "gemini".to_string(),
                model: "gemini-1.5-flash".to_string(),
                endpoint: None,
                temperature: 0.0,
                api_key: None,
            },
            embeddings: EmbeddingSettings {
                provider: "gemini".to_string(),
                model: "models/embedding-001".to_string(),
                endpoint: None,
                dimensions: None,
            },
            knowledge: KnowledgeSettings {
                document: PathBuf::from("data/wine_info.txt"),
                chunk_size: 512,
                chunk_overlap: 64,
                top_k: 4,
            },
            search: SearchSettings {
                endpoint: "https://api.tavily.com".to_string(),
                max_results: 3,
                api_key: None,
            },
            agent: AgentSettings {
                business_name: "Vinetos de Sol".to_string(),
                max_steps: 8,
                request_timeout_secs: 30,
                agent_timeout_secs: 60,
            },
            log_level: None,
            verbose: false,
            no_color: false,
            json_logs: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, the config file and the environment.
    ///
    /// Environment variables:
    /// - `CONCIERGE_WORKSPACE`: Override workspace path
    /// - `CONCIERGE_CONFIG`: Path to config file
    /// - `CONCIERGE_HOST` / `CONCIERGE_PORT`: Listen address
    /// - `CONCIERGE_DOCUMENT`: Source document path
    /// - `CONCIERGE_PROVIDER` / `CONCIERGE_MODEL`: Chat provider and model
    /// - `CONCIERGE_EMBEDDING_PROVIDER`: Embedding provider
    /// - `CONCIERGE_SURFACE_AGENT_ERRORS`: `1`/`true` to answer failures with 502
    /// - `GEMINI_API_KEY`: Gemini credential
    /// - `TAVILY_API_KEY`: Tavily credential
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], but a workspace or config file given on the
    /// command line decides which YAML file is read.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(AppError::Config(format!("Failed to read .env file: {}", e))),
        }

        Self::load_from_with(|key| std::env::var(key).ok(), workspace, config_file)
    }

    /// Load configuration using `lookup` as the environment.
    pub fn load_from<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::load_from_with(lookup, None, None)
    }

    /// Load configuration using `lookup` as the environment. `workspace` and
    /// `config_file` win over `CONCIERGE_WORKSPACE` and `CONCIERGE_CONFIG`.
    pub fn load_from_with<F>(
        lookup: F,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
    ) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| lookup("CONCIERGE_WORKSPACE").map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        if let Some(config_file) =
            config_file.or_else(|| lookup("CONCIERGE_CONFIG").map(PathBuf::from))
        {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config.config_path();
        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.merge_env(&lookup)?;

        Ok(config)
    }

    /// Path of the YAML config file, explicit or the workspace default.
    pub fn config_path(&self) -> PathBuf {
        match self.config_file {
            Some(ref cf) => cf.clone(),
            None => self.workspace.join(CONFIG_FILE_NAME),
        }
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(server) = file.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(surface) = server.surface_agent_errors {
                self.server.surface_agent_errors = surface;
            }
        }

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if llm.endpoint.is_some() {
                self.llm.endpoint = llm.endpoint;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
        }

        if let Some(embeddings) = file.embeddings {
            if let Some(provider) = embeddings.provider {
                self.embeddings.provider = provider;
            }
            if let Some(model) = embeddings.model {
                self.embeddings.model = model;
            }
            if embeddings.endpoint.is_some() {
                self.embeddings.endpoint = embeddings.endpoint;
            }
            if embeddings.dimensions.is_some() {
                self.embeddings.dimensions = embeddings.dimensions;
            }
        }

        if let Some(knowledge) = file.knowledge {
            if let Some(document) = knowledge.document {
                self.knowledge.document = document;
            }
            if let Some(chunk_size) = knowledge.chunk_size {
                self.knowledge.chunk_size = chunk_size;
            }
            if let Some(chunk_overlap) = knowledge.chunk_overlap {
                self.knowledge.chunk_overlap = chunk_overlap;
            }
            if let Some(top_k) = knowledge.top_k {
                self.knowledge.top_k = top_k;
            }
        }

        if let Some(search) = file.search {
            if let Some(endpoint) = search.endpoint {
                self.search.endpoint = endpoint;
            }
            if let Some(max_results) = search.max_results {
                self.search.max_results = max_results;
            }
        }

        if let Some(agent) = file.agent {
            if let Some(business_name) = agent.business_name {
                self.agent.business_name = business_name;
            }
            if let Some(max_steps) = agent.max_steps {
                self.agent.max_steps = max_steps;
            }
            if let Some(secs) = agent.request_timeout_secs {
                self.agent.request_timeout_secs = secs;
            }
            if let Some(secs) = agent.agent_timeout_secs {
                self.agent.agent_timeout_secs = secs;
            }
        }

        if let Some(logging) = file.logging {
            if logging.level.is_some() {
                self.log_level = logging.level;
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.json_logs = json;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    /// Environment variables override the YAML config.
    fn merge_env<F>(&mut self, lookup: &F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CONCIERGE_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("CONCIERGE_PORT") {
            self.server.port = port.parse().map_err(|e| {
                AppError::Config(format!("Invalid CONCIERGE_PORT '{}': {}", port, e))
            })?;
        }

        if let Some(surface) = lookup("CONCIERGE_SURFACE_AGENT_ERRORS") {
            self.server.surface_agent_errors = parse_flag(&surface);
        }

        if let Some(document) = lookup("CONCIERGE_DOCUMENT") {
            self.knowledge.document = PathBuf::from(document);
        }

        if let Some(provider) = lookup("CONCIERGE_PROVIDER") {
            self.llm.provider = provider;
        }

        if let Some(model) = lookup("CONCIERGE_MODEL") {
            self.llm.model = model;
        }

        if let Some(provider) = lookup("CONCIERGE_EMBEDDING_PROVIDER") {
            self.embeddings.provider = provider;
        }

        self.llm.api_key = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty());
        self.search.api_key = lookup("TAVILY_API_KEY").filter(|k| !k.is_empty());

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over everything else.
    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(workspace) = overrides.workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = overrides.config_file {
            self.config_file = Some(config_file);
        }

        if let Some(host) = overrides.host {
            self.server.host = host;
        }

        if let Some(port) = overrides.port {
            self.server.port = port;
        }

        if let Some(document) = overrides.document {
            self.knowledge.document = document;
        }

        if let Some(model) = overrides.model {
            self.llm.model = model;
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        if overrides.json_logs {
            self.json_logs = true;
        }

        self
    }

    /// Source document path, resolved against the workspace.
    pub fn document_path(&self) -> PathBuf {
        if self.knowledge.document.is_absolute() {
            self.knowledge.document.clone()
        } else {
            self.workspace.join(&self.knowledge.document)
        }
    }

    /// Directory holding workspace prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.workspace.join(".concierge/prompts")
    }

    /// Validate the configuration. Any error here must stop startup.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.as_str();
        if !KNOWN_CHAT_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_CHAT_PROVIDERS.join(", ")
            )));
        }

        let embedding_provider = self.embeddings.provider.as_str();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding_provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        let needs_gemini = provider == "gemini" || embedding_provider == "gemini";
        if needs_gemini && self.llm.api_key.is_none() {
            return Err(AppError::Config(
                "GEMINI_API_KEY must be set in the environment or .env file".to_string(),
            ));
        }

        if self.search.api_key.is_none() {
            return Err(AppError::Config(
                "TAVILY_API_KEY must be set in the environment or .env file".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.knowledge.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }

        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.knowledge.chunk_overlap, self.knowledge.chunk_size
            )));
        }

        if self.knowledge.top_k == 0 || self.search.max_results == 0 {
            return Err(AppError::Config(
                "topK and maxResults must be at least 1".to_string(),
            ));
        }

        if self.agent.max_steps == 0 {
            return Err(AppError::Config("maxSteps must be at least 1".to_string()));
        }

        if self.agent.request_timeout_secs == 0 || self.agent.agent_timeout_secs == 0 {
            return Err(AppError::Config("Timeouts must be positive".to_string()));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
