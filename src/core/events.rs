// Typed event bus for frame arrivals and rate snapshots

use crate::models::stream::{SensorFrame, StreamType};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Frames-per-second per active stream, keyed by stream name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct RateSnapshot(pub BTreeMap<StreamType, u32>);

impl RateSnapshot {
    pub fn get(&self, stream: StreamType) -> Option<u32> {
        self.0.get(&stream).copied()
    }
}

/// The fixed set of event kinds subscribers can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Frame(StreamType),
    Rates,
}

#[derive(Debug, Clone)]
pub enum StreamEvent {
    Frame(SensorFrame),
    Rates(RateSnapshot),
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Frame(frame) => EventKind::Frame(frame.stream_type()),
            StreamEvent::Rates(_) => EventKind::Rates,
        }
    }
}

/// Receiver that only yields the requested event kinds
pub struct EventSubscription {
    rx: broadcast::Receiver<StreamEvent>,
    kinds: Vec<EventKind>,
}

impl EventSubscription {
    pub fn new(rx: broadcast::Receiver<StreamEvent>, kinds: Vec<EventKind>) -> Self {
        Self { rx, kinds }
    }

    pub fn wants(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Next matching event; `None` once the dispatcher is gone
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(event.kind()) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event already queued, without waiting
    pub fn try_recv(&mut self) -> Option<StreamEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.wants(event.kind()) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
