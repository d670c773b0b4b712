//! lingo-gateway: prompt completion and translation over a local LLM.
//!
//! Forwards user text to a model hosted by an Ollama service and returns
//! the generated output through a small JSON HTTP API.

pub mod config;
pub mod model;
pub mod prompt;
pub mod server;
pub mod stream_check;
