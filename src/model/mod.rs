//! Model client adapter.
//!
//! - [`message`]: Role-tagged messages and generation results
//! - [`client`]: `Connector` / `ModelClient` traits and the error taxonomy
//! - [`ollama`]: HTTP adapter for the Ollama chat API

pub mod client;
pub mod message;
pub mod ollama;
