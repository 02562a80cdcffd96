use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A lifecycle event published when documents change.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentEvent {
    /// Event type, e.g. "document.uploaded", "document.deleted"
    #[serde(rename = "type")]
    pub event_type: String,
    /// Id of the affected document
    pub document_id: Uuid,
    pub tenant_id: Option<String>,
    pub product_id: Option<String>,
    pub bucket: String,
    pub path: String,
    /// User who triggered the change
    pub actor: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl DocumentEvent {
    /// Create a document event timestamped to now.
    pub fn now(
        event_type: impl Into<String>,
        document_id: Uuid,
        bucket: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            document_id,
            tenant_id: None,
            product_id: None,
            bucket: bucket.into(),
            path: path.into(),
            actor: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: Option<String>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_product(mut self, product_id: Option<String>) -> Self {
        self.product_id = product_id;
        self
    }

    pub fn with_actor(mut self, actor: Option<String>) -> Self {
        self.actor = actor;
        self
    }
}

/// Broadcast-based event bus for document lifecycle events.
///
/// Subscribers receive events via `tokio::sync::broadcast`. If a subscriber
/// falls behind, it receives `RecvError::Lagged` and can request a full refresh.
pub struct EventBus {
    tx: broadcast::Sender<DocumentEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. If there are no subscribers the event is dropped silently.
    pub fn publish(&self, event: DocumentEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to document events.
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.tx.subscribe()
    }
}
