pub mod auth;
pub mod client;
pub mod cors;

pub use auth::{extract_bearer_from_headers, session_token};
pub use client::client_info;
pub use cors::cors_layers;
