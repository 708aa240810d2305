// Callback payload -> ERP document
//
// The workflow returns loosely structured JSON. Only a handful of keys matter
// to the ERP side; missing keys fall back to defaults.

use chrono::{DateTime, Utc};
use docrelay_config::DocumentTypeMapping;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;
use uuid::Uuid;

const PROCESSED_BY: &str = "docrelay";
const UNKNOWN: &str = "unknown";
const TARGET_OBJECT_FIELD: &str = "_target_object";

/// Top-level payload keys copied into the document fields as-is
const PASSTHROUGH_FIELDS: &[&str] = &["dates", "amounts", "contacts"];

/// Document as posted to the ERP CreateDocument endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    pub id: String,
    pub document_type: String,
    pub created_at: DateTime<Utc>,
    pub fields: Map<String, JsonValue>,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub original_name: String,
    pub file_size: i64,
    pub processed_by: String,
    pub confidence: f64,
}

/// Build an ERP document from a callback payload object.
pub fn parse_document(payload: &Map<String, JsonValue>) -> DocumentData {
    let mut fields = Map::new();

    if let Some(JsonValue::Object(extracted)) = payload.get("extracted_data") {
        fields.extend(extracted.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    for key in PASSTHROUGH_FIELDS {
        if let Some(value) = payload.get(*key) {
            fields.insert(key.to_string(), value.clone());
        }
    }

    DocumentData {
        id: string_value(payload, "id").unwrap_or_else(generate_document_id),
        document_type: string_value(payload, "document_type").unwrap_or_else(|| UNKNOWN.into()),
        created_at: Utc::now(),
        fields,
        metadata: DocumentMetadata {
            original_name: string_value(payload, "original_name")
                .unwrap_or_else(|| UNKNOWN.into()),
            file_size: payload
                .get("file_size")
                .and_then(JsonValue::as_f64)
                .map(|size| size as i64)
                .unwrap_or(0),
            processed_by: PROCESSED_BY.to_string(),
            confidence: payload
                .get("confidence")
                .and_then(JsonValue::as_f64)
                .unwrap_or(0.0),
        },
    }
}

/// Rename mapped fields to their ERP names, keep the rest, and tag the
/// document with its ERP target object.
pub fn apply_field_mapping(mut document: DocumentData, mapping: &DocumentTypeMapping) -> DocumentData {
    let mut mapped = Map::new();

    for (source, value) in std::mem::take(&mut document.fields) {
        match mapping.fields.get(&source) {
            Some(target) => {
                debug!(source = %source, target = %target, "Mapped ERP field");
                mapped.insert(target.clone(), value);
            }
            None => {
                // Mapped targets take precedence over same-named raw fields
                mapped.entry(source).or_insert(value);
            }
        }
    }

    mapped.insert(
        TARGET_OBJECT_FIELD.to_string(),
        JsonValue::String(mapping.target_object.clone()),
    );
    document.fields = mapped;
    document
}

fn string_value(payload: &Map<String, JsonValue>, key: &str) -> Option<String> {
    payload.get(key).and_then(JsonValue::as_str).map(str::to_string)
}

fn generate_document_id() -> String {
    format!("doc_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_parse_document_full_payload() {
        let payload = object(json!({
            "id": "exec-1",
            "document_type": "invoice",
            "extracted_data": {"number": "INV-7", "total": 99.9},
            "dates": ["2024-05-01"],
            "amounts": [99.9],
            "original_name": "scan.pdf",
            "file_size": 2048.0,
            "confidence": 0.93
        }));

        let doc = parse_document(&payload);
        assert_eq!(doc.id, "exec-1");
        assert_eq!(doc.document_type, "invoice");
        assert_eq!(doc.fields["number"], "INV-7");
        assert_eq!(doc.fields["dates"], json!(["2024-05-01"]));
        assert!(!doc.fields.contains_key("contacts"));
        assert_eq!(doc.metadata.original_name, "scan.pdf");
        assert_eq!(doc.metadata.file_size, 2048);
        assert_eq!(doc.metadata.confidence, 0.93);
        assert_eq!(doc.metadata.processed_by, "docrelay");
    }

    #[test]
    fn test_parse_document_defaults() {
        let doc = parse_document(&object(json!({"text": "plain"})));
        assert!(doc.id.starts_with("doc_"));
        assert_eq!(doc.document_type, "unknown");
        assert!(doc.fields.is_empty());
        assert_eq!(doc.metadata.original_name, "unknown");
        assert_eq!(doc.metadata.file_size, 0);
        assert_eq!(doc.metadata.confidence, 0.0);
    }

    #[test]
    fn test_apply_field_mapping() {
        let doc = parse_document(&object(json!({
            "document_type": "invoice",
            "extracted_data": {"number": "INV-7", "supplier": "ACME"}
        })));
        let mapping = DocumentTypeMapping {
            target_object: "Document.Invoice".into(),
            fields: HashMap::from([("number".to_string(), "Number".to_string())]),
        };

        let mapped = apply_field_mapping(doc, &mapping);
        assert_eq!(mapped.fields["Number"], "INV-7");
        assert_eq!(mapped.fields["supplier"], "ACME");
        assert!(!mapped.fields.contains_key("number"));
        assert_eq!(mapped.fields["_target_object"], "Document.Invoice");
    }
}
