//! Bounded message FIFO
//!
//! A full queue rejects the newest message and keeps the queued ones: an undelivered or
//! unprocessed message is worth more than a new one.

use heapless::Deque;

use crate::message::Message;

/// Fixed-capacity FIFO of messages
pub struct MessageQueue<const N: usize> {
    inner: Deque<Message, N>,
}

impl<const N: usize> MessageQueue<N> {
    pub const fn new() -> Self {
        Self {
            inner: Deque::new(),
        }
    }

    /// Appends the message to the tail.
    ///
    /// Returns the message back if the queue is full. The queue is left unchanged.
    pub fn try_push(&mut self, message: Message) -> Result<(), Message> {
        self.inner.push_back(message)
    }

    /// Removes the head message.
    pub fn pop(&mut self) -> Option<Message> {
        self.inner.pop_front()
    }

    pub fn front(&self) -> Option<&Message> {
        self.inner.front()
    }

    /// Iterates in insertion order without consuming.
    pub fn iter(&self) -> impl Iterator<Item = &Message> + '_ {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<const N: usize> Default for MessageQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
