//! Built-in concierge tools.

pub mod retrieval;
pub mod weather;
pub mod web_search;

pub use retrieval::RetrievalTool;
pub use weather::WeatherTool;
pub use web_search::WebSearchTool;
