//! HTTP gateway for the ward assistant.
//!
//! Exposes chunk and alias management plus the chat endpoints over axum.

pub mod error;
pub mod extract;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use extract::ApiJson;
pub use server::{build_router, serve, AppState};
