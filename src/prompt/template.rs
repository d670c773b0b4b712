//! Chat prompt templates.
//!
//! A [`ChatPromptTemplate`] is an ordered list of [`MessageTemplate`]s. Each
//! message template declares the variables it requires; formatting checks that
//! every declared variable is supplied and then substitutes `{{.name}}`
//! placeholders. Formatting never mutates the template.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::message::{Message, Role};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template: missing variable \"{0}\"")]
    MissingVariable(String),
}

/// Template for a single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub role: Role,
    pub template: String,
    pub input_variables: Vec<String>,
}

impl MessageTemplate {
    pub fn new(role: Role, template: impl Into<String>, input_variables: &[&str]) -> Self {
        Self {
            role,
            template: template.into(),
            input_variables: input_variables.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn system(template: impl Into<String>, input_variables: &[&str]) -> Self {
        Self::new(Role::System, template, input_variables)
    }

    pub fn human(template: impl Into<String>, input_variables: &[&str]) -> Self {
        Self::new(Role::Human, template, input_variables)
    }

    pub fn ai(template: impl Into<String>, input_variables: &[&str]) -> Self {
        Self::new(Role::Ai, template, input_variables)
    }
}

/// Ordered multi-message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPromptTemplate {
    messages: Vec<MessageTemplate>,
}

impl ChatPromptTemplate {
    pub fn new(messages: Vec<MessageTemplate>) -> Self {
        Self { messages }
    }

    /// Declared variables across all messages, in declaration order, deduplicated.
    pub fn input_variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.messages.iter().flat_map(|m| &m.input_variables) {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// Substitute `variables` into every message, preserving order and roles.
    ///
    /// Fails if a declared variable is absent. Extra keys are ignored.
    pub fn format(&self, variables: &HashMap<String, String>) -> Result<Vec<Message>, TemplateError> {
        if let Some(missing) = self
            .input_variables()
            .into_iter()
            .find(|name| !variables.contains_key(*name))
        {
            return Err(TemplateError::MissingVariable(missing.to_string()));
        }

        Ok(self
            .messages
            .iter()
            .map(|m| Message::new(m.role, render(&m.template, variables)))
            .collect())
    }
}

/// Replace each `{{.name}}` (inner whitespace allowed) that has a value.
/// Placeholders without a value are kept verbatim; values are not re-scanned.
fn render(template: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let value = after[..end]
            .trim()
            .strip_prefix('.')
            .map(str::trim)
            .and_then(|name| variables.get(name));
        match value {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}
