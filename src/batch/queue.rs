//! Pending request queue.

use std::collections::VecDeque;
use tokio::time::{Duration, Instant};

#[derive(Debug)]
pub struct QueuedItem<T> {
    pub data: T,
    pub request_id: String,
    pub enqueued_at: Instant,
}

impl<T> QueuedItem<T> {
    pub fn new(data: T, request_id: impl Into<String>) -> Self {
        Self {
            data,
            request_id: request_id.into(),
            enqueued_at: Instant::now(),
        }
    }
}

/// FIFO of requests waiting for the next flush. Not synchronized; the owner
/// holds it behind its own lock.
#[derive(Debug)]
pub struct RequestQueue<T> {
    items: VecDeque<QueuedItem<T>>,
}

impl<T> RequestQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append and return the new length.
    pub fn push(&mut self, item: QueuedItem<T>) -> usize {
        self.items.push_back(item);
        self.items.len()
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front().map(|i| &i.data)
    }

    /// Take every item matching `pred`, oldest first. The rest stay queued
    /// in their original order.
    pub fn drain_matching(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<QueuedItem<T>> {
        let (taken, kept): (Vec<_>, Vec<_>) =
            self.items.drain(..).partition(|i| pred(&i.data));
        self.items = VecDeque::from(kept);
        taken
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// How long the oldest queued item has been waiting.
    pub fn oldest_wait(&self) -> Option<Duration> {
        self.items.front().map(|i| i.enqueued_at.elapsed())
    }
}

impl<T> Default for RequestQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
