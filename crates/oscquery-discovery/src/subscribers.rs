//! Fan-out of events to any number of unbounded receivers

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// A list of subscribers that all receive a clone of every published item
pub struct Subscribers<T> {
    senders: Mutex<Vec<mpsc::UnboundedSender<T>>>,
}

impl<T: Clone> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().push(tx);
        rx
    }

    /// Send to every live subscriber, dropping the closed ones.
    /// Returns how many subscribers received the item.
    pub fn publish(&self, item: &T) -> usize {
        let mut senders = self.senders.lock();
        senders.retain(|tx| tx.send(item.clone()).is_ok());
        senders.len()
    }

    pub fn len(&self) -> usize {
        self.senders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disconnect every subscriber
    pub fn clear(&self) {
        self.senders.lock().clear();
    }
}

impl<T: Clone> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}
