//! Shared types used across the store, ERP and server crates
//!
//! These types are defined here to avoid circular dependencies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status assigned when the callback payload does not carry one.
pub const DEFAULT_STATUS: &str = "completed";

/// One processing result as stored and served to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Server-generated identifier, never taken from the payload
    pub id: String,
    /// Human-readable output, never empty once normalized
    pub text: String,
    /// Ingestion time (serialized as RFC 3339)
    pub timestamp: DateTime<Utc>,
    /// Short status tag, `completed` unless the payload says otherwise
    pub status: String,
    /// Outcome of the optional ERP forwarding for this result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erp_status: Option<IntegrationResult>,
}

impl ResultRecord {
    /// Build a record with a fresh id and the current time.
    pub fn new(text: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: generate_result_id(),
            text: text.into(),
            timestamp: Utc::now(),
            status: status.into(),
            erp_status: None,
        }
    }

    pub fn with_erp_status(mut self, erp_status: IntegrationResult) -> Self {
        self.erp_status = Some(erp_status);
        self
    }
}

fn generate_result_id() -> String {
    format!("res_{}", Uuid::new_v4().simple())
}

/// Outcome of forwarding one document to the ERP system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationResult {
    pub success: bool,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erp_ref: Option<String>,
    /// Informational note for successful results that were not sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// JSON envelope used by every HTTP endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            data: None,
        }
    }
}

impl ApiResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_ids_are_unique() {
        let a = ResultRecord::new("a", DEFAULT_STATUS);
        let b = ResultRecord::new("b", DEFAULT_STATUS);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("res_"));
    }

    #[test]
    fn test_record_serializes_expected_fields() {
        let record = ResultRecord::new("hello", "completed");
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 4);
        assert_eq!(obj["text"], "hello");
        assert_eq!(obj["status"], "completed");
        let ts = obj["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn test_record_with_erp_status_serializes_it() {
        let record = ResultRecord::new("hello", "completed").with_erp_status(IntegrationResult {
            success: true,
            document_id: "doc_1".into(),
            erp_ref: Some("ref-9".into()),
            ..Default::default()
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["erp_status"]["erp_ref"], "ref-9");
        assert!(value["erp_status"].get("error_message").is_none());
    }

    #[test]
    fn test_api_response_envelopes() {
        let ok = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(ok, json!({"status": "success", "data": [1, 2]}));

        let err = serde_json::to_value(ApiResponse::<()>::error("boom")).unwrap();
        assert_eq!(err, json!({"status": "error", "message": "boom"}));

        let msg = serde_json::to_value(ApiResponse::message("stored")).unwrap();
        assert_eq!(msg, json!({"status": "success", "message": "stored"}));
    }
}
