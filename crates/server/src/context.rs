//! Startup wiring: model client, document index, tools and system prompt.

use concierge_agent::{Agent, AgentOptions, RetrievalTool, ToolSet, WeatherTool, WebSearchTool};
use concierge_core::{AppConfig, AppError, AppResult};
use concierge_knowledge::{create_provider, DocumentIndex, EmbeddingConfig, IndexOptions};
use concierge_llm::{create_client, ClientOptions};
use concierge_prompt::{build_prompt, resolve_prompt, SYSTEM_PROMPT_ID};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Immutable state shared by every request.
#[derive(Debug)]
pub struct AppContext {
    agent: Agent,
    index: Arc<DocumentIndex>,
    surface_agent_errors: bool,
}

impl AppContext {
    /// Build everything the server needs from a validated configuration.
    ///
    /// # Errors
    /// Fails on missing credentials, an unknown provider, a missing or empty
    /// source document, embedding failures and invalid prompt definitions.
    pub async fn initialize(config: &AppConfig) -> AppResult<Self> {
        let request_timeout = Duration::from_secs(config.agent.request_timeout_secs);

        let mut client_options = ClientOptions::default().with_timeout(request_timeout);
        if let Some(endpoint) = &config.llm.endpoint {
            client_options = client_options.with_endpoint(endpoint);
        }
        if let Some(api_key) = &config.llm.api_key {
            client_options = client_options.with_api_key(api_key);
        }
        let client = create_client(&config.llm.provider, &client_options).map_err(AppError::Llm)?;
        tracing::info!(
            provider = client.provider_name(),
            model = %config.llm.model,
            "Chat model ready"
        );

        let embedding_config = EmbeddingConfig::from_settings(
            &config.embeddings,
            config.llm.api_key.as_deref(),
            request_timeout,
        );
        let embeddings = create_provider(&embedding_config)?;

        let document = config.document_path();
        let index = Arc::new(
            DocumentIndex::load(&document, embeddings, IndexOptions::from(&config.knowledge))
                .await?,
        );

        let tools = ToolSet::new()
            .with(Arc::new(WeatherTool))
            .with(Arc::new(WebSearchTool::from_settings(
                &config.search,
                request_timeout,
            )?))
            .with(Arc::new(RetrievalTool::new(Arc::clone(&index))));

        let definition = resolve_prompt(&config.prompts_dir(), SYSTEM_PROMPT_ID)?;
        let mut variables = HashMap::new();
        variables.insert(
            "businessName".to_string(),
            config.agent.business_name.clone(),
        );
        let system = build_prompt(&definition, variables)?.system;

        let agent = Agent::new(client, tools, system, AgentOptions::from_config(config));
        tracing::debug!(?agent, "Agent assembled");

        Ok(Self::from_parts(
            agent,
            index,
            config.server.surface_agent_errors,
        ))
    }

    /// Assemble a context from already-built parts.
    pub fn from_parts(agent: Agent, index: Arc<DocumentIndex>, surface_agent_errors: bool) -> Self {
        Self {
            agent,
            index,
            surface_agent_errors,
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Whether agent failures are reported as 502 instead of 200.
    pub fn surface_agent_errors(&self) -> bool {
        self.surface_agent_errors
    }
}
