//! Adapter traits between request handlers and a model service.
//!
//! A [`Connector`] binds a model name to a [`ModelClient`] handle. Handles are
//! cheap; handlers connect once per request.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::message::{ContentResponse, Message};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("generation aborted by stream consumer: {0}")]
    Aborted(anyhow::Error),
}

/// Callback invoked once per streamed output chunk, in generation order.
///
/// Returning an error aborts generation.
pub type StreamingFunc = Box<dyn FnMut(&[u8]) -> anyhow::Result<()> + Send>;

/// Per-call generation options.
#[derive(Default)]
pub struct GenerateOptions {
    pub streaming_func: Option<StreamingFunc>,
}

impl GenerateOptions {
    pub fn with_streaming_func<F>(func: F) -> Self
    where
        F: FnMut(&[u8]) -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            streaming_func: Some(Box::new(func)),
        }
    }
}

impl std::fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("streaming", &self.streaming_func.is_some())
            .finish()
    }
}

/// A handle bound to one model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Model identifier this handle targets.
    fn model(&self) -> &str;

    /// Send an ordered message list and return the model's choices.
    async fn generate(
        &self,
        messages: &[Message],
        options: GenerateOptions,
    ) -> Result<ContentResponse, ModelError>;

    /// Single prompt in, single string out.
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let response = self
            .generate(&[Message::human(prompt)], GenerateOptions::default())
            .await?;
        response
            .first()
            .map(|choice| choice.content.clone())
            .ok_or_else(|| ModelError::Inference("empty response from model".to_string()))
    }
}

/// Opens handles to named models.
pub trait Connector: Send + Sync {
    fn connect(&self, model: &str) -> Result<Box<dyn ModelClient>, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the messages it receives and answers with a fixed choice list.
    struct Recording {
        seen: Mutex<Vec<Message>>,
        response: ContentResponse,
    }

    #[async_trait]
    impl ModelClient for Recording {
        fn model(&self) -> &str {
            "recording"
        }

        async fn generate(
            &self,
            messages: &[Message],
            _options: GenerateOptions,
        ) -> Result<ContentResponse, ModelError> {
            self.seen.lock().unwrap().extend_from_slice(messages);
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn test_complete_sends_single_human_message() {
        let client = Recording {
            seen: Mutex::new(Vec::new()),
            response: ContentResponse::from_text("world"),
        };

        let out = client.complete("hello").await.unwrap();
        assert_eq!(out, "world");
        assert_eq!(*client.seen.lock().unwrap(), vec![Message::human("hello")]);
    }

    #[tokio::test]
    async fn test_complete_without_choices_fails() {
        let client = Recording {
            seen: Mutex::new(Vec::new()),
            response: ContentResponse::default(),
        };

        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, ModelError::Inference(_)));
    }

    #[test]
    fn test_options_debug_hides_callback() {
        let opts = GenerateOptions::with_streaming_func(|_| Ok(()));
        assert_eq!(format!("{opts:?}"), "GenerateOptions { streaming: true }");
    }
}
