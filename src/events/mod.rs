use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after a mutation has committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // GRN workflow events
    GrnCreated {
        grn_id: Uuid,
        grn_no: String,
    },
    GrnInspectionStarted(Uuid),
    GrnItemInspected {
        grn_id: Uuid,
        item_id: Uuid,
        accepted_qty: Decimal,
        rejected_qty: Decimal,
    },
    GrnInspectionCompleted {
        grn_id: Uuid,
        accepted_lines: usize,
    },
    GrnApproved {
        grn_id: Uuid,
        grn_no: String,
        posted_quantity: Decimal,
    },
    GrnRejected {
        grn_id: Uuid,
        reason: String,
    },
    GrnSentBack {
        grn_id: Uuid,
        reason: String,
    },
    GrnResubmitted(Uuid),

    // Stock ledger events
    StockMovementPosted {
        movement_id: Uuid,
        transaction_no: String,
    },
    StockMovementCompleted {
        movement_id: Uuid,
        item_code: String,
        warehouse_id: Uuid,
        quantity: Decimal,
    },
    StockMovementCancelled {
        movement_id: Uuid,
        reason: String,
    },
    StockBalanceRebuilt {
        item_code: String,
        warehouse_id: Uuid,
        derived_qty: Decimal,
        drift: Decimal,
    },

    // Master data events
    BomCreated {
        bom_id: Uuid,
        bom_no: String,
    },
    ItemCreated {
        item_id: Uuid,
        item_code: String,
    },
    WarehouseCreated(Uuid),
    PurchaseOrderCreated {
        po_id: Uuid,
        po_no: String,
    },
    PurchaseOrderMarkedToReceive {
        po_no: String,
        grn_no: String,
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

    /// Sends an event and logs instead of failing when the channel is gone.
    /// Used after a transaction has already committed, where the mutation
    /// must not be reported as failed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Builds an event channel with the given capacity.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Consumes events off the channel for the lifetime of the process.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "Processing event");
    }
    info!("Event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (sender, mut rx) = channel(8);
        sender
            .send(Event::GrnInspectionStarted(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(Event::GrnInspectionStarted(_))
        ));
    }

    #[tokio::test]
    async fn send_or_log_does_not_panic_when_receiver_dropped() {
        let (sender, rx) = channel(1);
        drop(rx);
        sender
            .send_or_log(Event::GrnResubmitted(Uuid::new_v4()))
            .await;
    }
}
