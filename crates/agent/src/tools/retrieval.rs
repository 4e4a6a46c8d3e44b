//! Document retrieval over the winery fact sheet.

use crate::tool::{Tool, ToolArgument};
use async_trait::async_trait;
use concierge_core::AppResult;
use concierge_knowledge::DocumentIndex;
use std::sync::Arc;

/// Answers business questions from the indexed source document.
#[derive(Debug, Clone)]
pub struct RetrievalTool {
    index: Arc<DocumentIndex>,
}

impl RetrievalTool {
    pub fn new(index: Arc<DocumentIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for RetrievalTool {
    fn name(&self) -> &str {
        "wine_info_retriever"
    }

    fn description(&self) -> &str {
        "Retrieves information about the wine business from the provided document. \
         Use this tool to answer questions about the business, its history, wines, or hours."
    }

    fn argument(&self) -> ToolArgument {
        ToolArgument {
            name: "query",
            description: "What to look up in the winery document",
        }
    }

    async fn call(&self, input: &str) -> AppResult<String> {
        self.index.retrieve(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_knowledge::embeddings::providers::TrigramProvider;
    use concierge_knowledge::IndexOptions;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_returns_matching_passage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wine_info.txt");
        fs::write(
            &path,
            "Tastings run Thursday to Sunday, 11am to 6pm.\n\n\
             The estate Malbec ages eighteen months in oak.\n",
        )
        .unwrap();

        let options = IndexOptions {
            chunk_size: 60,
            chunk_overlap: 0,
            top_k: 1,
        };
        let index = DocumentIndex::load(&path, Arc::new(TrigramProvider::new(256)), options)
            .await
            .unwrap();
        let tool = RetrievalTool::new(Arc::new(index));

        let passage = tool.call("Malbec oak ageing").await.unwrap();
        assert_eq!(passage, "The estate Malbec ages eighteen months in oak.");
        assert_eq!(tool.declaration().parameters["required"][0], "query");
    }
}
