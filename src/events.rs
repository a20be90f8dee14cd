//! In-process refresh signals between views.
//!
//! Views that change data publish a [`Signal`]; views showing that data
//! subscribe to its [`Topic`] and reload. Built on a tokio broadcast channel, so
//! a subscriber that falls behind skips the signals it missed and keeps going.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "dashboard:refresh")]
    DashboardRefresh,
    #[serde(rename = "cash:refresh")]
    CashRefresh,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::DashboardRefresh => "dashboard:refresh",
            Topic::CashRefresh => "cash:refresh",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum Signal {
    #[serde(rename = "dashboard:refresh")]
    DashboardRefresh { source: String },
    #[serde(rename = "cash:refresh")]
    CashRefresh { cash_box_id: Option<String> },
}

impl Signal {
    pub fn topic(&self) -> Topic {
        match self {
            Signal::DashboardRefresh { .. } => Topic::DashboardRefresh,
            Signal::CashRefresh { .. } => Topic::CashRefresh,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Signal>,
}

impl Default for EventBus {
    fn default() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }
}

impl EventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many subscribers were listening (on any topic).
    pub fn publish(&self, signal: Signal) -> usize {
        let topic = signal.topic();
        let n = self.tx.send(signal).unwrap_or(0);
        tracing::debug!(target: "events", topic = topic.as_str(), receivers = n, "published");
        n
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        Subscription { topic, rx: self.tx.subscribe() }
    }
}

pub struct Subscription {
    topic: Topic,
    rx: broadcast::Receiver<Signal>,
}

impl Subscription {
    pub fn topic(&self) -> Topic { self.topic }

    /// Next signal for this topic; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Signal> {
        loop {
            match self.rx.recv().await {
                Ok(sig) if sig.topic() == self.topic => return Some(sig),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "events", topic = self.topic.as_str(), skipped = skipped, "subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant for polling from a render loop.
    pub fn try_recv(&mut self) -> Option<Signal> {
        loop {
            match self.rx.try_recv() {
                Ok(sig) if sig.topic() == self.topic => return Some(sig),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
