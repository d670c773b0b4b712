//! Prompt templating.
//!
//! - [`template`]: Multi-message templates with `{{.name}}` placeholders
//! - [`translation`]: The fixed translation prompt

pub mod template;
pub mod translation;
