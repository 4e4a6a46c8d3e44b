//! HTTP front end for the Vinetos de Sol concierge.
//!
//! Serves the chat UI and a JSON chat endpoint backed by the tool-using
//! agent. Everything the handlers need is built once at startup into an
//! immutable [`AppContext`].

pub mod context;
pub mod routes;
pub mod server;

pub use context::AppContext;
pub use server::{bind, router, serve, ServerError};
