//! Poller events.
//!
//! Subscribers (a CLI, a status page) can follow what each tick did
//! without scraping logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::display::DisplayTarget;

/// Events emitted by the metrics poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PollEvent {
    /// A tick started fetching.
    TickStarted { seq: u64, timestamp: DateTime<Utc> },
    /// A tick wrote its values to the board.
    Rendered {
        seq: u64,
        /// Slots written, with the text each received.
        written: Vec<(DisplayTarget, String)>,
        timestamp: DateTime<Utc>,
    },
    /// The report carried no `model_status`.
    NoStatus { seq: u64, timestamp: DateTime<Utc> },
    /// Fetching or parsing failed.
    Failed {
        seq: u64,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// A newer tick rendered first; this result was dropped.
    Stale {
        seq: u64,
        latest_rendered: u64,
        timestamp: DateTime<Utc>,
    },
}

impl PollEvent {
    /// Sequence number of the tick this event belongs to.
    pub fn seq(&self) -> u64 {
        match self {
            PollEvent::TickStarted { seq, .. }
            | PollEvent::Rendered { seq, .. }
            | PollEvent::NoStatus { seq, .. }
            | PollEvent::Failed { seq, .. }
            | PollEvent::Stale { seq, .. } => *seq,
        }
    }

    pub fn description(&self) -> String {
        match self {
            PollEvent::TickStarted { seq, .. } => format!("tick #{} started", seq),
            PollEvent::Rendered { seq, written, .. } => {
                format!("tick #{} updated {} metric card(s)", seq, written.len())
            }
            PollEvent::NoStatus { seq, .. } => {
                format!("tick #{} received no model status", seq)
            }
            PollEvent::Failed { seq, error, .. } => format!("tick #{} failed: {}", seq, error),
            PollEvent::Stale {
                seq,
                latest_rendered,
                ..
            } => format!(
                "tick #{} discarded, tick #{} already rendered",
                seq, latest_rendered
            ),
        }
    }
}

/// Broadcaster for poller events.
#[derive(Clone)]
pub struct PollEventBroadcaster {
    sender: broadcast::Sender<PollEvent>,
}

impl PollEventBroadcaster {
    /// Create a new broadcaster with default capacity (64).
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn publish(&self, event: PollEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for PollEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_description() {
        let event = PollEvent::Stale {
            seq: 3,
            latest_rendered: 4,
            timestamp: Utc::now(),
        };
        assert_eq!(event.seq(), 3);
        assert!(event.description().contains("#4"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let broadcaster = PollEventBroadcaster::new();
        broadcaster.publish(PollEvent::TickStarted {
            seq: 1,
            timestamp: Utc::now(),
        });
        assert_eq!(broadcaster.subscriber_count(), 0);

        let mut rx = broadcaster.subscribe();
        broadcaster.publish(PollEvent::NoStatus {
            seq: 2,
            timestamp: Utc::now(),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.seq(), 2);
    }
}
