//! # Audit actor
//!
//! Durable-trail collaborator for order events. Producers never wait on it:
//! [`AuditClient::record`] is a non-blocking send and a full or closed
//! channel is logged, never returned.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::domain::LineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventKind {
    OrderCancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub kind: AuditEventKind,
    pub user_id: String,
    pub order_id: String,
    pub reason: String,
    pub restored_items: Vec<LineItem>,
    pub voucher_rolled_back: bool,
    pub at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum AuditRequest {
    Record(AuditEvent),
    #[cfg(test)]
    List {
        respond_to: tokio::sync::oneshot::Sender<Vec<AuditEvent>>,
    },
    Shutdown,
}

pub struct AuditActor {
    receiver: mpsc::Receiver<AuditRequest>,
    events: Vec<AuditEvent>,
}

impl AuditActor {
    pub fn new(buffer_size: usize) -> (Self, AuditClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            events: Vec::new(),
        };
        (actor, AuditClient { sender })
    }

    #[instrument(name = "audit", skip(self))]
    pub async fn run(mut self) {
        info!("Audit log starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                AuditRequest::Record(event) => {
                    info!(
                        kind = ?event.kind,
                        user_id = %event.user_id,
                        order_id = %event.order_id,
                        reason = %event.reason,
                        voucher_rolled_back = event.voucher_rolled_back,
                        "Audit event recorded"
                    );
                    self.events.push(event);
                }
                #[cfg(test)]
                AuditRequest::List { respond_to } => {
                    let _ = respond_to.send(self.events.clone());
                }
                AuditRequest::Shutdown => {
                    info!("Audit log shutting down");
                    break;
                }
            }
        }
        info!(recorded = self.events.len(), "Audit log stopped");
    }
}

#[derive(Clone)]
pub struct AuditClient {
    sender: mpsc::Sender<AuditRequest>,
}

impl AuditClient {
    /// Fire-and-forget. Failures are logged here and go no further.
    pub fn record(&self, event: AuditEvent) {
        let order_id = event.order_id.clone();
        if let Err(e) = self.sender.try_send(AuditRequest::Record(event)) {
            warn!(order_id = %order_id, error = %e, "Audit event dropped");
        }
    }

    pub async fn shutdown(&self) {
        if self.sender.send(AuditRequest::Shutdown).await.is_err() {
            warn!("Audit log already stopped");
        }
    }

    #[cfg(test)]
    pub async fn list(&self) -> Vec<AuditEvent> {
        let (respond_to, response) = tokio::sync::oneshot::channel();
        if self.sender.send(AuditRequest::List { respond_to }).await.is_err() {
            return Vec::new();
        }
        response.await.unwrap_or_default()
    }
}
