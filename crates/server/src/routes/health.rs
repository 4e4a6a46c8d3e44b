use crate::context::AppContext;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

/// Liveness plus a summary of what the agent was built with.
pub async fn health_handler(State(context): State<Arc<AppContext>>) -> Json<Value> {
    let agent = context.agent();
    let stats = context.index().stats();

    Json(json!({
        "status": "ok",
        "model": agent.options().model,
        "tools": agent.tools().names(),
        "document": {
            "path": stats.path,
            "chunks": stats.chunks,
            "indexedAt": stats.indexed_at,
        },
    }))
}
