use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// One narrative message for a session's audience.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub session_id: String,
    pub text: String,
}

/// Fire-and-forget output channel.
pub trait AnnouncementSink: Send + Sync {
    fn publish(&self, session_id: &str, text: String);
}

/// Fans announcements out to every subscriber (for example websocket clients).
#[derive(Clone, Debug)]
pub struct BroadcastSink {
    sender: broadcast::Sender<Announcement>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Announcement> {
        self.sender.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<Announcement> {
        self.sender.clone()
    }
}

impl AnnouncementSink for BroadcastSink {
    fn publish(&self, session_id: &str, text: String) {
        // No subscribers is fine.
        let _ = self.sender.send(Announcement {
            session_id: session_id.to_string(),
            text,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let sink = BroadcastSink::new(8);
        sink.publish("nobody-listening", "dropped".to_string());

        let mut rx = sink.subscribe();
        sink.publish("s1", "hello".to_string());
        let received = rx.recv().await.expect("announcement");
        assert_eq!(
            received,
            Announcement {
                session_id: "s1".into(),
                text: "hello".into()
            }
        );
    }
}
