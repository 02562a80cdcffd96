//! Database entity models.

pub mod document;

pub use document::{Document, DocumentStats, DocumentUpdate};
