// docrelay-core - Platform-agnostic core logic
//
// This crate contains the PURE result-shaping logic: callback bytes from the
// automation webhook become one canonical ResultRecord. No I/O, no async, no
// runtime dependencies. The HTTP transport and the store live elsewhere.

pub mod normalizer;
pub mod text;
pub mod types;

// Re-export commonly used types
pub use normalizer::{normalize, WebhookPayload, EXCLUDED_FIELDS, PLACEHOLDER_TEXT};
pub use text::truncate_for_log;
pub use types::{ApiResponse, IntegrationResult, ResultRecord, DEFAULT_STATUS};
