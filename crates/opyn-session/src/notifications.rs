//! Rolling log of transaction notifications

use std::collections::VecDeque;
use std::sync::Arc;

use opyn_core::{TxNotification, TxNotifier};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Keeps the most recent notifications, newest last
pub struct NotificationLog {
    entries: Mutex<VecDeque<TxNotification>>,
    capacity: usize,
}

impl NotificationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Record everything published on `notifier` from now on
    pub fn follow(self: &Arc<Self>, notifier: &TxNotifier) -> JoinHandle<()> {
        let mut rx = notifier.subscribe();
        let log = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notification) => log.push(notification),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Notification log fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn push(&self, notification: TxNotification) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
    }

    pub fn recent(&self) -> Vec<TxNotification> {
        self.entries.lock().iter().cloned().collect()
    }
}
