//! Tool-using agent for the winery concierge.
//!
//! The agent alternates between asking the model what to do next and running
//! the tool it picked, until the model produces a final answer.
//!
//! # Tools
//! - `get_weather`: canned weather reports
//! - `tavily_search_results_json`: live web search through Tavily
//! - `wine_info_retriever`: passages from the winery document

pub mod runner;
pub mod tool;
pub mod tools;

pub use runner::{Agent, AgentOptions, AgentOutcome, AgentStep, Decision};
pub use tool::{Tool, ToolArgument, ToolSet};
pub use tools::{RetrievalTool, WeatherTool, WebSearchTool};
