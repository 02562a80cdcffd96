//! Business services: metadata store, orchestrator, and the event bus.

pub mod document_service;
pub mod event_bus;
pub mod orchestrator;

pub use document_service::{DocumentFilter, DocumentService, NewDocument};
pub use event_bus::{DocumentEvent, EventBus};
pub use orchestrator::{
    DocumentPage, PresignedUrl, StorageOrchestrator, UploadPolicy, UploadRequest,
};
