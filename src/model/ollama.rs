//! Ollama chat API adapter.
//!
//! Talks to `POST {base_url}/api/chat`. Non-streaming calls decode a single
//! JSON object; streaming calls read newline-delimited JSON, one object per
//! generated chunk, terminated by an object with `"done": true`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ModelConfig;
use crate::model::client::{Connector, GenerateOptions, ModelClient, ModelError, StreamingFunc};
use crate::model::message::{ContentResponse, FunctionCall, GenerationResult, Message};

/// Sampling options forwarded in the request's `options` object.
#[derive(Debug, Clone, Default, Serialize)]
struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

impl ModelOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_ctx.is_none()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a ModelOptions>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: ToolFunction,
}

#[derive(Debug, Deserialize)]
struct ToolFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

impl From<ToolCall> for FunctionCall {
    fn from(call: ToolCall) -> Self {
        FunctionCall {
            name: call.function.name,
            arguments: call.function.arguments,
        }
    }
}

/// Connector that hands out handles sharing one pooled HTTP client.
pub struct OllamaConnector {
    http: reqwest::Client,
    base_url: String,
    options: ModelOptions,
}

impl OllamaConnector {
    /// Create a connector from model configuration.
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ModelError::Connection(describe(&e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            options: ModelOptions {
                temperature: config.temperature,
                num_ctx: config.num_ctx,
            },
        })
    }

    fn chat_endpoint(&self) -> Result<Url, ModelError> {
        let raw = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let url = Url::parse(&raw)
            .map_err(|e| ModelError::Connection(format!("invalid service url {raw:?}: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ModelError::Connection(format!(
                "unsupported url scheme {scheme:?} in {raw:?}"
            ))),
        }
    }
}

impl Connector for OllamaConnector {
    fn connect(&self, model: &str) -> Result<Box<dyn ModelClient>, ModelError> {
        if model.trim().is_empty() {
            return Err(ModelError::Connection("model name is empty".to_string()));
        }
        Ok(Box::new(OllamaClient {
            http: self.http.clone(),
            endpoint: self.chat_endpoint()?,
            model: model.to_string(),
            options: self.options.clone(),
        }))
    }
}

/// Handle to one model on an Ollama service.
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
    options: ModelOptions,
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        messages: &[Message],
        options: GenerateOptions,
    ) -> Result<ContentResponse, ModelError> {
        let stream = options.streaming_func.is_some();
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream,
            options: (!self.options.is_empty()).then_some(&self.options),
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            stream,
            "Sending chat request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Inference(status_message(status, &text)));
        }

        let result = match options.streaming_func {
            Some(func) => read_stream(response, func).await?,
            None => {
                let parsed: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| ModelError::Inference(describe(&e)))?;
                let mut acc = StreamAccumulator::default();
                acc.absorb(parsed, None)?;
                acc.into_result()
            }
        };

        debug!(
            model = %self.model,
            content_bytes = result.content.len(),
            function_call = result.function_call.is_some(),
            "Chat request complete"
        );

        Ok(ContentResponse {
            choices: vec![result],
        })
    }
}

async fn read_stream(
    mut response: reqwest::Response,
    mut func: StreamingFunc,
) -> Result<GenerationResult, ModelError> {
    let mut lines = LineDecoder::default();
    let mut acc = StreamAccumulator::default();

    while !acc.done {
        let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ModelError::Inference(describe(&e)))?
        else {
            break;
        };
        lines.push(&chunk);
        while let Some(line) = lines.next_line() {
            acc.accept_line(&line, &mut func)?;
            if acc.done {
                break;
            }
        }
    }

    if !acc.done {
        if let Some(rest) = lines.finish() {
            acc.accept_line(&rest, &mut func)?;
        }
    }
    if !acc.done {
        return Err(ModelError::Inference(
            "stream ended before generation completed".to_string(),
        ));
    }

    Ok(acc.into_result())
}

/// Splits a byte stream into newline-terminated lines.
#[derive(Debug, Default)]
struct LineDecoder {
    buf: BytesMut,
}

impl LineDecoder {
    fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    fn next_line(&mut self) -> Option<Bytes> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let line = self.buf.split_to(pos + 1).freeze();
        Some(line.slice(..pos))
    }

    /// Trailing bytes with no final newline.
    fn finish(&mut self) -> Option<Bytes> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }
}

/// Aggregates response objects into one choice.
#[derive(Debug, Default)]
struct StreamAccumulator {
    content: String,
    function_call: Option<FunctionCall>,
    done: bool,
}

impl StreamAccumulator {
    fn accept_line(&mut self, line: &[u8], func: &mut StreamingFunc) -> Result<(), ModelError> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        let parsed: ChatResponse = serde_json::from_slice(line)
            .map_err(|e| ModelError::Inference(format!("malformed stream line: {e}")))?;
        self.absorb(parsed, Some(func))
    }

    fn absorb(
        &mut self,
        parsed: ChatResponse,
        func: Option<&mut StreamingFunc>,
    ) -> Result<(), ModelError> {
        if let Some(error) = parsed.error {
            return Err(ModelError::Inference(error));
        }
        if let Some(message) = parsed.message {
            if let Some(func) = func {
                func(message.content.as_bytes()).map_err(ModelError::Aborted)?;
            }
            self.content.push_str(&message.content);
            if let Some(call) = message.tool_calls.into_iter().next() {
                self.function_call = Some(call.into());
            }
        }
        self.done |= parsed.done;
        Ok(())
    }

    fn into_result(self) -> GenerationResult {
        GenerationResult {
            content: self.content,
            function_call: self.function_call,
        }
    }
}

/// Transport failures before a response arrives mean the service is unreachable.
fn classify(err: reqwest::Error) -> ModelError {
    if err.is_connect() || err.is_builder() {
        ModelError::Connection(describe(&err))
    } else {
        ModelError::Inference(describe(&err))
    }
}

/// reqwest's `Display` omits the underlying cause.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn status_message(status: reqwest::StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => format!("model service returned {status}"),
        Err(_) => format!("model service returned {status}: {}", body.trim()),
    }
}
