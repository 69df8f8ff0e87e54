use crate::publish::{EventPublisher, PublishError};
use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

#[derive(Serialize)]
struct Envelope<'a> {
    topic: &'a str,
    key: Option<&'a str>,
    value: serde_json::Value,
}

/// Writes each event as one JSON line `{"topic", "key", "value"}`, ready to be piped
/// into a broker's console producer.
pub struct JsonLinesPublisher<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesPublisher<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> EventPublisher for JsonLinesPublisher<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: serde_json::Value,
    ) -> Result<(), PublishError> {
        let mut line = serde_json::to_vec(&Envelope {
            topic,
            key,
            value: payload,
        })
        .map_err(|e| PublishError::Encode(topic.to_string(), e))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| PublishError::Write(topic.to_string(), e))?;
        writer
            .flush()
            .await
            .map_err(|e| PublishError::Write(topic.to_string(), e))
    }
}
