//! Startup streaming check.
//!
//! Streams one fixed question through the model before the server starts,
//! echoing chunks as they arrive. Used to confirm the model service is
//! reachable and streaming works.

use std::io::Write;

use tracing::info;

use crate::model::client::{GenerateOptions, ModelClient};
use crate::model::message::{ContentResponse, Message};

pub const CHECK_QUESTION: &str = "天空为什么是蓝色的";

/// Stream the check question, writing every chunk to `out` as it arrives.
pub async fn stream_check<W>(client: &dyn ModelClient, mut out: W) -> anyhow::Result<ContentResponse>
where
    W: Write + Send + 'static,
{
    info!(model = client.model(), "Running streaming check");

    let options = GenerateOptions::with_streaming_func(move |chunk| {
        out.write_all(chunk)?;
        out.flush()?;
        Ok(())
    });
    let response = client
        .generate(&[Message::human(CHECK_QUESTION)], options)
        .await?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::model::client::ModelError;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Streams fixed chunks through the callback.
    struct Chunked(Vec<&'static str>);

    #[async_trait]
    impl ModelClient for Chunked {
        fn model(&self) -> &str {
            "chunked"
        }

        async fn generate(
            &self,
            messages: &[Message],
            options: GenerateOptions,
        ) -> Result<ContentResponse, ModelError> {
            assert_eq!(messages.to_vec(), vec![Message::human(CHECK_QUESTION)]);
            let mut func = options.streaming_func.expect("streaming requested");
            for chunk in &self.0 {
                func(chunk.as_bytes()).map_err(ModelError::Aborted)?;
            }
            Ok(ContentResponse::from_text(self.0.concat()))
        }
    }

    #[tokio::test]
    async fn test_chunks_written_in_order() {
        let buf = SharedBuf::default();
        let client = Chunked(vec!["Rayleigh ", "scattering", "."]);

        let response = stream_check(&client, buf.clone()).await.unwrap();

        assert_eq!(&*buf.0.lock().unwrap(), b"Rayleigh scattering.");
        assert_eq!(response.first().unwrap().content, "Rayleigh scattering.");
    }

    #[tokio::test]
    async fn test_write_failure_aborts() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let client = Chunked(vec!["a", "b"]);
        let err = stream_check(&client, Broken).await.unwrap_err();
        assert!(err.to_string().contains("aborted"));
    }

    #[test]
    fn test_check_question_text() {
        assert_eq!(CHECK_QUESTION, "天空为什么是蓝色的");
        assert!(!CHECK_QUESTION.contains('事'));
    }
}
