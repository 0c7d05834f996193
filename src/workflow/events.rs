//! Notifications for views outside the workflow (dashboard, history).

use tokio::sync::broadcast;

/// Buffered notifications per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// An entry was saved. Views that show diary data should refetch.
    Committed {
        entry_id: Option<String>,
        /// Increments once per save, starting at 1.
        refresh_generation: u64,
    },
}

/// Fan-out sender. Sending with no subscribers is fine.
#[derive(Debug)]
pub struct Notifier {
    tx: broadcast::Sender<WorkflowEvent>,
    refresh_generation: u64,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            refresh_generation: 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    pub fn refresh_generation(&self) -> u64 {
        self.refresh_generation
    }

    pub fn committed(&mut self, entry_id: Option<String>) {
        self.refresh_generation += 1;
        let receivers = self.tx.receiver_count();
        let _ = self.tx.send(WorkflowEvent::Committed {
            entry_id,
            refresh_generation: self.refresh_generation,
        });
        log::debug!(
            "[WORKFLOW] Committed notification #{} sent to {} subscriber(s)",
            self.refresh_generation,
            receivers
        );
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
