//! Owning-thread dispatch for single-writer state.
//!
//! State such as the structure tree is only ever mutated from one thread.
//! Producers on other threads cannot touch it directly; instead they post
//! items into a [`DispatchQueue`] through a cloneable [`DispatchSender`], and
//! the owner drains the queue when it is ready.
//!
//! # How It Works
//!
//! 1. The owner creates a `DispatchQueue` and hands out senders.
//! 2. Producers call [`DispatchSender::send`] from any thread.
//! 3. The owner calls [`DispatchQueue::drain`] (or `try_next`) on its own thread
//!    and processes the items in the order they were posted.
//!
//! In [`DeliveryMode::Synchronous`] the owner is expected to process items
//! inline as they are submitted on its own thread; the queue still accepts
//! posts from other threads so nothing is lost.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::logging::targets;

/// How submissions on the owning thread are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Every submission is queued and processed on the next drain.
    #[default]
    Queued,
    /// Submissions made on the owning thread run immediately.
    ///
    /// Intended for tests, where deterministic inline delivery matters more
    /// than decoupling producers from the owner.
    Synchronous,
}

/// A cloneable handle for posting items to the owning thread.
#[derive(Debug)]
pub struct DispatchSender<T> {
    sender: Sender<T>,
}

impl<T> Clone for DispatchSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> DispatchSender<T> {
    /// Post an item for the owner to process.
    pub fn send(&self, item: T) -> Result<(), DispatchError> {
        self.sender
            .send(item)
            .map_err(|_| DispatchError::QueueClosed)
    }
}

/// An unbounded FIFO of work destined for the owning thread.
#[derive(Debug)]
pub struct DispatchQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    mode: DeliveryMode,
}

impl<T> DispatchQueue<T> {
    /// Create an empty queue with the given delivery mode.
    pub fn new(mode: DeliveryMode) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            mode,
        }
    }

    /// The delivery mode this queue was created with.
    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Create a new sender handle.
    pub fn sender(&self) -> DispatchSender<T> {
        DispatchSender {
            sender: self.sender.clone(),
        }
    }

    /// Post an item from the owning thread.
    pub fn post(&self, item: T) {
        // The queue owns a receiver, so the channel cannot be disconnected.
        let _ = self.sender.send(item);
    }

    /// Take the next pending item, if any.
    pub fn try_next(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take every pending item in posting order.
    pub fn drain(&self) -> Vec<T> {
        let items: Vec<T> = self.receiver.try_iter().collect();
        if !items.is_empty() {
            tracing::trace!(target: targets::DISPATCH, count = items.len(), "drained dispatch queue");
        }
        items
    }

    /// Number of items waiting to be processed.
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Whether any items are waiting.
    pub fn has_pending(&self) -> bool {
        !self.receiver.is_empty()
    }
}

impl<T> Default for DispatchQueue<T> {
    fn default() -> Self {
        Self::new(DeliveryMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_and_drain_preserves_order() {
        let queue = DispatchQueue::new(DeliveryMode::Queued);
        queue.post(1);
        queue.post(2);
        queue.post(3);

        assert_eq!(queue.pending_count(), 3);
        assert_eq!(queue.drain(), vec![1, 2, 3]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_cross_thread_send() {
        let queue = DispatchQueue::new(DeliveryMode::Queued);

        let mut handles = vec![];
        for i in 0..4 {
            let sender = queue.sender();
            handles.push(std::thread::spawn(move || {
                sender.send(i).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut items = queue.drain();
        items.sort();
        assert_eq!(items, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_send_after_queue_dropped() {
        let queue = DispatchQueue::<u8>::new(DeliveryMode::Synchronous);
        let sender = queue.sender();
        drop(queue);
        assert_eq!(sender.send(1), Err(DispatchError::QueueClosed));
    }

    #[test]
    fn test_try_next() {
        let queue = DispatchQueue::default();
        assert_eq!(queue.mode(), DeliveryMode::Queued);
        assert_eq!(queue.try_next(), None::<u8>);
        queue.post(9);
        assert_eq!(queue.try_next(), Some(9));
    }
}
