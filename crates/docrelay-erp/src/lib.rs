//! ERP forwarding for processed documents
//!
//! Turns a callback payload into an ERP document, applies the configured
//! field mapping and posts it to the ERP HTTP service. Forwarding is optional
//! and never fails result ingestion: callers await it so the outcome can be
//! attached to the stored record, bounded by `erp.timeout_secs`.

pub mod client;
pub mod document;
pub mod error;
pub mod service;

pub use client::{ErpClient, ErpResponse};
pub use document::{apply_field_mapping, parse_document, DocumentData, DocumentMetadata};
pub use error::ErpError;
pub use service::{ConnectionState, ErpService, ErpStatus};
