//! Tool trait and the registry handed to the agent.

use async_trait::async_trait;
use concierge_core::AppResult;
use concierge_llm::ToolDeclaration;
use serde_json::json;
use std::sync::Arc;

/// The single string argument a tool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolArgument {
    pub name: &'static str,
    pub description: &'static str,
}

/// A capability the model can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Natural-language description shown to the model.
    fn description(&self) -> &str;

    fn argument(&self) -> ToolArgument;

    /// Run the tool on the model-chosen argument.
    async fn call(&self, input: &str) -> AppResult<String>;

    /// JSON-schema function declaration for the model.
    fn declaration(&self) -> ToolDeclaration {
        let argument = self.argument();
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    argument.name: {
                        "type": "string",
                        "description": argument.description,
                    }
                },
                "required": [argument.name],
            }),
        }
    }
}

/// Ordered, immutable-after-startup collection of tools.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any existing tool with the same name.
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.retain(|existing| existing.name() != tool.name());
        self.tools.push(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.iter().map(|tool| tool.declaration()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
