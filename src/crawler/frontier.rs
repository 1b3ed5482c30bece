//! Crawl frontier: FIFO work queue plus visited set
//!
//! A URL becomes visited exactly when it is dequeued for processing, never
//! at enqueue time. The same URL may therefore sit in the queue several
//! times; [`Frontier::dequeue`] collapses the duplicates on dequeue.

use std::collections::{HashSet, VecDeque};

/// A URL taken from the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    /// First dequeue of this URL; it is now marked visited
    Fresh(String),
    /// The URL had already been visited and was dropped
    Duplicate(String),
}

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier seeded with one normalized URL
    pub fn with_seed(seed: impl Into<String>) -> Self {
        let mut frontier = Self::default();
        frontier.queue.push_back(seed.into());
        frontier
    }

    /// Appends a URL unless it was already visited
    ///
    /// Returns true when the URL was queued.
    pub fn enqueue(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.visited.contains(&url) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Pops the next URL, marking it visited on its first dequeue
    pub fn dequeue(&mut self) -> Option<Dequeued> {
        let url = self.queue.pop_front()?;
        if self.visited.insert(url.clone()) {
            Some(Dequeued::Fresh(url))
        } else {
            Some(Dequeued::Duplicate(url))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queue entries, duplicates included
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}
