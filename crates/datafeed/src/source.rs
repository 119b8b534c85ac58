use crate::error::FeedError;
use async_trait::async_trait;
use market_model::Event;
use std::collections::VecDeque;

/// A chronological stream of daily market events.
///
/// `next_event` returns `Ok(None)` once the stream is exhausted; the
/// backtester treats that as the end of the run.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Result<Option<Event>, FeedError>;
}

/// An in-memory feed over a pre-built list of events.
///
/// The unit tests drive the engine with this, and it is handy for replaying
/// hand-crafted scenarios without a database around.
#[derive(Debug, Default)]
pub struct MemoryEventFeed {
    events: VecDeque<Event>,
}

impl MemoryEventFeed {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into(),
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl EventSource for MemoryEventFeed {
    async fn next_event(&mut self) -> Result<Option<Event>, FeedError> {
        Ok(self.events.pop_front())
    }
}
