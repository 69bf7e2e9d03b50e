//! Channel-backed fragment sink
//!
//! The relay task writes into a single-slot channel; the receiving half is the
//! HTTP response body, so a slow reader holds the relay at its next write.

use bytes::Bytes;
use futures::SinkExt;
use futures::channel::mpsc;

use super::relay::FragmentSink;

/// Item type of the response body stream
pub type BodyItem = Result<Bytes, std::io::Error>;

/// Writes fragments to the response body
pub struct ChannelSink {
    tx: mpsc::Sender<BodyItem>,
}

/// Create a sink and the body stream it feeds
pub fn channel() -> (ChannelSink, mpsc::Receiver<BodyItem>) {
    let (tx, rx) = mpsc::channel(0);
    (ChannelSink { tx }, rx)
}

impl ChannelSink {
    /// Fail the body so the caller sees a truncated response
    pub async fn abort(&mut self, error: &anyhow::Error) {
        let item = Err(std::io::Error::other(format!("{:#}", error)));
        if self.tx.send(item).await.is_err() {
            tracing::debug!("Caller already gone, abort not delivered");
        }
        self.tx.close_channel();
    }
}

impl FragmentSink for ChannelSink {
    async fn write(&mut self, fragment: &str) -> anyhow::Result<()> {
        self.tx
            .send(Ok(Bytes::copy_from_slice(fragment.as_bytes())))
            .await
            .map_err(|_| anyhow::anyhow!("Caller disconnected before the stream completed"))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.tx.close_channel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_fragments_arrive_in_order_then_end() {
        let (mut sink, mut body) = channel();
        let writer = tokio::spawn(async move {
            sink.write("[").await.unwrap();
            sink.write("{}").await.unwrap();
            sink.write("]").await.unwrap();
            sink.close().await.unwrap();
        });

        let mut received = Vec::new();
        while let Some(item) = body.next().await {
            received.push(item.unwrap());
        }
        writer.await.unwrap();
        assert_eq!(received, vec![Bytes::from("["), Bytes::from("{}"), Bytes::from("]")]);
    }

    #[tokio::test]
    async fn test_abort_delivers_error_item() {
        let (mut sink, mut body) = channel();
        let writer = tokio::spawn(async move {
            sink.write("partial").await.unwrap();
            sink.abort(&anyhow::anyhow!("upstream reset")).await;
        });

        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from("partial"));
        let err = body.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("upstream reset"));
        assert!(body.next().await.is_none());
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_write_fails_when_caller_gone() {
        let (mut sink, body) = channel();
        drop(body);
        assert!(sink.write("lost").await.is_err());
    }
}
