//! The request-to-model pipeline shared by every endpoint.
//!
//! Prepare → connect → invoke → extract. Plain prompts go through
//! `complete`; templated inputs are formatted into messages and go through
//! `generate`, taking the first choice.

use std::collections::HashMap;

use tracing::debug;

use crate::model::client::{Connector, GenerateOptions, ModelError};
use crate::model::message::Message;
use crate::prompt::template::{ChatPromptTemplate, TemplateError};
use crate::server::error::GatewayError;

/// What a handler hands to the pipeline.
#[derive(Debug)]
pub enum PipelineInput<'a> {
    /// Free-form prompt, sent as-is.
    Prompt(String),
    /// Template plus the variables to substitute into it.
    Templated {
        template: &'a ChatPromptTemplate,
        variables: HashMap<String, String>,
    },
}

/// Model-ready payload after preparation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Prompt(String),
    Messages(Vec<Message>),
}

impl PipelineInput<'_> {
    pub fn prepare(self) -> Result<Payload, TemplateError> {
        match self {
            PipelineInput::Prompt(prompt) => Ok(Payload::Prompt(prompt)),
            PipelineInput::Templated {
                template,
                variables,
            } => template.format(&variables).map(Payload::Messages),
        }
    }
}

/// Run one request through the model and return the response text.
pub async fn run_pipeline(
    connector: &dyn Connector,
    model: &str,
    input: PipelineInput<'_>,
) -> Result<String, GatewayError> {
    let payload = input.prepare()?;
    let client = connector.connect(model)?;

    match payload {
        Payload::Prompt(prompt) => {
            debug!(model, prompt_bytes = prompt.len(), "Completing prompt");
            Ok(client.complete(&prompt).await?)
        }
        Payload::Messages(messages) => {
            debug!(model, messages = messages.len(), "Generating from messages");
            let response = client
                .generate(&messages, GenerateOptions::default())
                .await?;
            let choice = response
                .first()
                .ok_or_else(|| ModelError::Inference("empty response from model".to_string()))?;
            Ok(choice.content.clone())
        }
    }
}
