use async_trait::async_trait;
use concierge::{serve, AppContext};
use concierge_agent::{Agent, AgentOptions, RetrievalTool, ToolSet, WeatherTool};
use concierge_core::{AppConfig, AppError, AppResult};
use concierge_knowledge::embeddings::providers::TrigramProvider;
use concierge_knowledge::{DocumentIndex, IndexOptions};
use concierge_llm::{LlmClient, LlmRequest, LlmResponse, Role, ToolCall};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

const APOLOGY: &str = "Sorry, an error occurred while processing your request.";

const WINE_INFO: &str = "Vinetos de Sol was founded in 1987 in the Uco Valley.\n\n\
Our flagship wine is the Reserva Malbec, aged eighteen months in French oak.\n\n\
The tasting room is open Thursday to Sunday from 11am to 6pm.\n";

/// First turn asks for the weather in the user's words; second turn answers
/// with whatever the tool returned.
struct WeatherThenAnswer;

#[async_trait]
impl LlmClient for WeatherThenAnswer {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let last = request
            .messages
            .last()
            .ok_or_else(|| AppError::Llm("empty conversation".to_string()))?;

        if last.role == Role::Tool {
            return Ok(LlmResponse::text(
                format!("Here is what I found: {}", last.content),
                "scripted",
            ));
        }

        let mut response = LlmResponse::text("", "scripted");
        response.tool_calls = vec![ToolCall::new(
            "get_weather",
            json!({ "location": last.content }),
        )];
        Ok(response)
    }
}

struct Unavailable;

#[async_trait]
impl LlmClient for Unavailable {
    fn provider_name(&self) -> &str {
        "unavailable"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        Err(AppError::Llm("Gemini API error (503): overloaded".to_string()))
    }
}

async fn index(temp: &TempDir) -> Arc<DocumentIndex> {
    let path = temp.path().join("wine_info.txt");
    std::fs::write(&path, WINE_INFO).unwrap();
    let options = IndexOptions {
        chunk_size: 120,
        chunk_overlap: 0,
        top_k: 2,
    };
    Arc::new(
        DocumentIndex::load(&path, Arc::new(TrigramProvider::new(256)), options)
            .await
            .unwrap(),
    )
}

async fn context(
    temp: &TempDir,
    client: Arc<dyn LlmClient>,
    surface_agent_errors: bool,
) -> AppContext {
    let index = index(temp).await;
    let tools = ToolSet::new()
        .with(Arc::new(WeatherTool))
        .with(Arc::new(RetrievalTool::new(Arc::clone(&index))));
    let agent = Agent::new(
        client,
        tools,
        "You are a helpful assistant for the Vinetos de Sol winery.",
        AgentOptions::default(),
    );
    AppContext::from_parts(agent, index, surface_agent_errors)
}

/// Serve `context` on an ephemeral port and return its base URL.
async fn spawn(context: AppContext) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(
        listener,
        Arc::new(context),
        std::future::pending::<()>(),
    ));
    format!("http://{}", addr)
}

async fn post_chat(base: &str, body: impl Into<reqwest::Body>) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/chat", base))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_index_serves_chat_page() {
    let temp = TempDir::new().unwrap();
    let base = spawn(context(&temp, Arc::new(WeatherThenAnswer), false).await).await;

    let response = reqwest::get(format!("{}/", base)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let page = response.text().await.unwrap();
    assert!(page.contains("chat-form"));
    assert!(page.contains("/ui/script.js"));

    let script = reqwest::get(format!("{}/ui/script.js", base)).await.unwrap();
    assert_eq!(script.status().as_u16(), 200);
    assert!(script.text().await.unwrap().contains("fetch('/chat'"));

    let style = reqwest::get(format!("{}/ui/style.css", base)).await.unwrap();
    assert_eq!(style.status().as_u16(), 200);
}

#[tokio::test]
async fn test_missing_message_is_rejected() {
    let temp = TempDir::new().unwrap();
    let base = spawn(context(&temp, Arc::new(WeatherThenAnswer), false).await).await;

    for body in [
        "{}",
        r#"{"message": ""}"#,
        r#"{"message": "  "}"#,
        r#"{"message": 5}"#,
        "not json at all",
    ] {
        let (status, reply) = post_chat(&base, body).await;
        assert_eq!(status, 400, "body: {}", body);
        assert_eq!(reply, json!({ "response": "No message provided." }));
    }
}

#[tokio::test]
async fn test_message_runs_agent_with_tools() {
    let temp = TempDir::new().unwrap();
    let base = spawn(context(&temp, Arc::new(WeatherThenAnswer), false).await).await;

    let (status, reply) = post_chat(&base, r#"{"message": "Napa Valley"}"#).await;
    assert_eq!(status, 200);
    let text = reply["response"].as_str().unwrap();
    assert_eq!(
        text,
        "Here is what I found: The weather in Napa Valley is sunny with a temperature of 75°F. \
         Perfect for a vineyard tour!"
    );
}

#[tokio::test]
async fn test_agent_failure_returns_apology() {
    let temp = TempDir::new().unwrap();
    let base = spawn(context(&temp, Arc::new(Unavailable), false).await).await;

    let (status, reply) = post_chat(&base, r#"{"message": "Hello"}"#).await;
    assert_eq!(status, 200);
    assert_eq!(reply["response"], APOLOGY);
}

#[tokio::test]
async fn test_agent_failure_can_be_surfaced() {
    let temp = TempDir::new().unwrap();
    let base = spawn(context(&temp, Arc::new(Unavailable), true).await).await;

    let (status, reply) = post_chat(&base, r#"{"message": "Hello"}"#).await;
    assert_eq!(status, 502);
    assert_eq!(reply["response"], APOLOGY);
}

#[tokio::test]
async fn test_health_reports_agent_and_document() {
    let temp = TempDir::new().unwrap();
    let base = spawn(context(&temp, Arc::new(WeatherThenAnswer), false).await).await;

    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health["status"], "ok");
    assert_eq!(health["model"], "gemini-1.5-flash");
    assert_eq!(
        health["tools"],
        json!(["get_weather", "wine_info_retriever"])
    );
    assert_eq!(health["document"]["chunks"], 3);
    assert!(health["document"]["indexedAt"].is_string());
    assert!(health["document"]["path"]
        .as_str()
        .unwrap()
        .ends_with("wine_info.txt"));
}

#[tokio::test]
async fn test_missing_document_fails_startup() {
    let temp = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.workspace = temp.path().to_path_buf();
    config.knowledge.document = "data/missing.txt".into();
    config.llm.provider = "ollama".to_string();
    config.embeddings.provider = "trigram".to_string();
    config.search.api_key = Some("tvly-test".to_string());

    let err = AppContext::initialize(&config).await.unwrap_err();
    assert!(err.to_string().contains("Source document not found"));
}

#[tokio::test]
async fn test_initialize_from_workspace() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("data")).unwrap();
    std::fs::write(temp.path().join("data/wine_info.txt"), WINE_INFO).unwrap();

    let mut config = AppConfig::default();
    config.workspace = temp.path().to_path_buf();
    config.knowledge.document = "data/wine_info.txt".into();
    config.llm.provider = "ollama".to_string();
    config.embeddings.provider = "trigram".to_string();
    config.search.api_key = Some("tvly-test".to_string());

    let context = AppContext::initialize(&config).await.unwrap();
    assert_eq!(
        context.agent().tools().names(),
        vec!["get_weather", "tavily_search_results_json", "wine_info_retriever"]
    );
    assert!(context.agent().system().contains("Vinetos de Sol winery"));
    assert_eq!(context.index().stats().chunks, 1);
}
