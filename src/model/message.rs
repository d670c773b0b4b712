//! Message and result types exchanged with the model.

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Instruction that frames the conversation.
    #[serde(rename = "system")]
    System,
    /// Text supplied by the user.
    #[serde(rename = "user")]
    Human,
    /// Text produced by the model.
    #[serde(rename = "assistant")]
    Ai,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::Human => write!(f, "human"),
            Role::Ai => write!(f, "ai"),
        }
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Role::Ai, content)
    }
}

/// A function/tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Arguments exactly as the model produced them.
    pub arguments: serde_json::Value,
}

/// One generated choice.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationResult {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

/// Full result of a `generate` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentResponse {
    pub choices: Vec<GenerationResult>,
}

impl ContentResponse {
    /// Wrap a single plain-text choice.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![GenerationResult {
                content: content.into(),
                function_call: None,
            }],
        }
    }

    /// First choice, if the model produced any.
    pub fn first(&self) -> Option<&GenerationResult> {
        self.choices.first()
    }
}
