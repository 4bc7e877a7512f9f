use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Events emitted by the service layer after successful mutations.
///
/// Emission is fire-and-forget observability: events are sent after the
/// owning transaction commits and a failed send never fails the
/// business operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Reference data
    LocationCreated(i32),
    LocationUpdated(i32),
    LocationDeleted(i32),
    CategoryCreated(i32),
    CategoryUpdated(i32),
    CategoryDeleted(i32),

    // Catalog
    ItemCreated(i32),
    ItemUpdated(i32),
    ItemDeleted {
        item_id: i32,
        entries_removed: u64,
    },

    // Ledger
    EntryAdded {
        entry_id: i32,
        item_id: i32,
        quantity: i32,
    },
    EntryUpdated(i32),
    EntryDeleted {
        entry_id: i32,
        logs_removed: u64,
    },

    // Usage
    UsageLogged {
        entry_id: i32,
        quantity_used: i32,
        remaining: i32,
    },
    EntryDepleted {
        entry_id: i32,
        item_id: i32,
    },
    LowStock {
        item_id: i32,
        total_quantity: i64,
        threshold: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failures to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event and logs instead of failing when the channel is
    /// closed or full. Mutation paths use this after commit.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(error = %e, "Event channel unavailable, dropping event");
        }
    }
}

/// Drains the event channel, logging each event. A real deployment
/// would fan these out to notifiers; the core only guarantees ordering
/// and delivery into this loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::LowStock {
                item_id,
                total_quantity,
                threshold,
            } => {
                info!(
                    item_id,
                    total_quantity, threshold, "Item fell below its low-stock threshold"
                );
            }
            Event::EntryDepleted { entry_id, item_id } => {
                info!(entry_id, item_id, "Inventory entry fully depleted");
            }
            other => {
                info!(event = ?other, "Processed event");
            }
        }
    }

    info!("Event channel closed, stopping event processing loop");
}

/// Convenience constructor wiring a sender to a running
/// [`process_events`] task.
pub fn channel(buffer: usize) -> (EventSender, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(buffer);
    let handle = tokio::spawn(process_events(rx));
    (EventSender::new(tx), handle)
}
