use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use super::{Message, MessageFeed};
use crate::error::AppError;

/// Reads one JSON message object per line. Blank and malformed lines are skipped.
pub struct JsonLinesFeed<R> {
    name: String,
    lines: Lines<R>,
    line_no: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesFeed<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> MessageFeed for JsonLinesFeed<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_message(&mut self) -> Result<Option<Message>, AppError> {
        loop {
            let Some(line) = self
                .lines
                .next_line()
                .await
                .map_err(|e| AppError::Internal(format!("Failed to read {}: {e}", self.name)))?
            else {
                return Ok(None);
            };
            self.line_no += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<Message>(line) {
                Ok(msg) => return Ok(Some(msg)),
                Err(e) => {
                    tracing::warn!(
                        feed = %self.name,
                        line = self.line_no,
                        error = %e,
                        "Skipping malformed message"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_messages_and_skips_garbage() {
        let input = concat!(
            r#"{"text":"first","channelId":1,"messageId":10}"#,
            "\n\nnot json\n",
            r#"{"text":"second","channelId":1,"messageId":11,"raw":{"id":11}}"#,
            "\n"
        );
        let mut feed = JsonLinesFeed::new("test", input.as_bytes());

        let first = feed.next_message().await.unwrap().unwrap();
        assert_eq!(first.text, "first");
        assert_eq!(first.message_id, 10);
        assert!(first.raw.is_none());

        let second = feed.next_message().await.unwrap().unwrap();
        assert_eq!(second.text, "second");
        assert_eq!(second.raw, Some(serde_json::json!({"id": 11})));

        assert!(feed.next_message().await.unwrap().is_none());
    }
}
