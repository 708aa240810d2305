// Webhook payload normalization
//
// Converts whatever the automation system posts back into exactly one
// ResultRecord. Normalization is total: malformed, empty or non-JSON bodies
// still produce a record, they are never rejected.
//
// Text selection:
// - non-empty string `text`
// - non-empty string `message`
// - "<key>: <value>" lines for every other field (keys sorted)
// - raw body when the payload is not a JSON object
// - PLACEHOLDER_TEXT when all of the above come out empty

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::text::truncate_for_log;
use crate::types::{ResultRecord, DEFAULT_STATUS};

/// Stored when nothing usable could be extracted from the payload.
pub const PLACEHOLDER_TEXT: &str = "no content extracted";

/// Service fields that never contribute to the synthesized text.
pub const EXCLUDED_FIELDS: &[&str] = &["status", "webhookUrl", "executionMode", "timestamp", "id"];

const TEXT_FIELD: &str = "text";
const MESSAGE_FIELD: &str = "message";
const STATUS_FIELD: &str = "status";

/// A callback body after the best-effort structural interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookPayload {
    /// Body decoded as a JSON object
    Structured(Map<String, JsonValue>),
    /// Anything else, kept as (lossy UTF-8) text
    Raw(String),
}

impl WebhookPayload {
    /// Interpret raw callback bytes. Invalid UTF-8 is replaced with U+FFFD
    /// before decoding. A JSON object is structured and a bare `null` is an
    /// empty object; scalars, arrays and invalid JSON fall back to raw text.
    pub fn parse(body: &[u8]) -> Self {
        let decoded = String::from_utf8_lossy(body);
        match serde_json::from_str::<JsonValue>(&decoded) {
            Ok(JsonValue::Object(map)) => WebhookPayload::Structured(map),
            Ok(JsonValue::Null) => WebhookPayload::Structured(Map::new()),
            Ok(_) | Err(_) => WebhookPayload::Raw(decoded.into_owned()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, WebhookPayload::Structured(_))
    }

    /// Primary text for the record, possibly empty.
    pub fn extract_text(&self) -> String {
        match self {
            WebhookPayload::Structured(map) => {
                if let Some(text) = non_empty_str(map, TEXT_FIELD) {
                    text.to_string()
                } else if let Some(message) = non_empty_str(map, MESSAGE_FIELD) {
                    message.to_string()
                } else {
                    render_fields(map)
                }
            }
            WebhookPayload::Raw(raw) => raw.clone(),
        }
    }

    /// Status carried by the payload, or `completed`.
    pub fn status(&self) -> &str {
        match self {
            WebhookPayload::Structured(map) => {
                non_empty_str(map, STATUS_FIELD).unwrap_or(DEFAULT_STATUS)
            }
            WebhookPayload::Raw(_) => DEFAULT_STATUS,
        }
    }

    /// Build the canonical record. Any upstream `id`/`timestamp` is ignored.
    pub fn to_record(&self) -> ResultRecord {
        let mut text = self.extract_text();
        if text.is_empty() {
            warn!(
                structured = self.is_structured(),
                payload = %truncate_for_log(&self.to_string(), 200),
                "Empty result text, storing placeholder"
            );
            text = PLACEHOLDER_TEXT.to_string();
        }

        let record = ResultRecord::new(text, self.status());
        debug!(
            id = %record.id,
            status = %record.status,
            text = %truncate_for_log(&record.text, 50),
            "Normalized webhook payload"
        );
        record
    }

    /// Object view handed to downstream integrations. Raw bodies become
    /// `{"text": <raw>}`.
    pub fn into_object(self) -> Map<String, JsonValue> {
        match self {
            WebhookPayload::Structured(map) => map,
            WebhookPayload::Raw(raw) => {
                let mut map = Map::new();
                map.insert(TEXT_FIELD.to_string(), JsonValue::String(raw));
                map
            }
        }
    }
}

impl std::fmt::Display for WebhookPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookPayload::Structured(map) => {
                let rendered = serde_json::to_string(map).map_err(|_| std::fmt::Error)?;
                f.write_str(&rendered)
            }
            WebhookPayload::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Normalize callback bytes straight into a record.
pub fn normalize(body: &[u8]) -> ResultRecord {
    WebhookPayload::parse(body).to_record()
}

fn non_empty_str<'a>(map: &'a Map<String, JsonValue>, key: &str) -> Option<&'a str> {
    match map.get(key) {
        Some(JsonValue::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn render_fields(map: &Map<String, JsonValue>) -> String {
    let mut keys: Vec<&String> = map
        .keys()
        .filter(|key| !EXCLUDED_FIELDS.contains(&key.as_str()))
        .collect();
    keys.sort();

    keys.into_iter()
        .filter_map(|key| render_value(&map[key.as_str()]).map(|value| format!("{key}: {value}")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(format!("{:.2}", n.as_f64().unwrap_or_default())),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Object(_) | JsonValue::Array(_) => serde_json::to_string(value).ok(),
        JsonValue::Null => Some("null".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn lines(text: &str) -> HashSet<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_text_field_used_verbatim() {
        let record = normalize(br#"{"text":"  Invoice #42 \n total 10 ","message":"ignored"}"#);
        assert_eq!(record.text, "  Invoice #42 \n total 10 ");
        assert_eq!(record.status, "completed");
    }

    #[test]
    fn test_message_used_when_text_missing_or_empty() {
        let record = normalize(br#"{"text":"","message":"from message"}"#);
        assert_eq!(record.text, "from message");

        let record = normalize(br#"{"text":17,"message":"typed text is ignored"}"#);
        assert_eq!(record.text, "typed text is ignored");
    }

    #[test]
    fn test_fields_rendered_one_line_each() {
        let record = normalize(
            br#"{
                "supplier": "ACME",
                "total": 1234.5,
                "count": 3,
                "paid": false,
                "lines": [1, 2],
                "meta": {"pages": 2},
                "note": "",
                "nothing": null,
                "status": "done",
                "webhookUrl": "https://hook",
                "executionMode": "production",
                "timestamp": "2024-01-01",
                "id": "upstream-1"
            }"#,
        );

        assert_eq!(
            lines(&record.text),
            HashSet::from([
                "supplier: ACME",
                "total: 1234.50",
                "count: 3.00",
                "paid: false",
                "lines: [1,2]",
                "meta: {\"pages\":2}",
                "nothing: null",
            ])
        );
        for reserved in EXCLUDED_FIELDS {
            assert!(!record.text.contains(&format!("{reserved}:")));
        }
        assert_eq!(record.status, "done");
        assert_ne!(record.id, "upstream-1");
    }

    #[test]
    fn test_rendered_fields_are_sorted() {
        let record = normalize(br#"{"zeta":"z","alpha":"a","mid":true}"#);
        assert_eq!(record.text, "alpha: a\nmid: true\nzeta: z");
    }

    #[test]
    fn test_only_reserved_fields_yields_placeholder() {
        let record = normalize(br#"{"status":"error"}"#);
        assert_eq!(record.text, PLACEHOLDER_TEXT);
        assert_eq!(record.status, "error");
    }

    #[test]
    fn test_empty_status_falls_back_to_default() {
        let record = normalize(br#"{"text":"ok","status":""}"#);
        assert_eq!(record.status, DEFAULT_STATUS);

        let record = normalize(br#"{"text":"ok","status":5}"#);
        assert_eq!(record.status, DEFAULT_STATUS);
    }

    #[test]
    fn test_raw_text_payload() {
        let record = normalize(b"Hello");
        assert_eq!(record.text, "Hello");
        assert_eq!(record.status, "completed");
    }

    #[test]
    fn test_non_object_json_is_raw_text() {
        assert_eq!(normalize(b"[1,2,3]").text, "[1,2,3]");
        assert_eq!(normalize(b"\"quoted\"").text, "\"quoted\"");
        assert_eq!(normalize(b"{\"text\": \"unterminated").text, "{\"text\": \"unterminated");
    }

    #[test]
    fn test_empty_body_yields_placeholder() {
        let record = normalize(b"");
        assert_eq!(record.text, PLACEHOLDER_TEXT);
        assert_eq!(record.status, DEFAULT_STATUS);

        let record = normalize(b"{}");
        assert_eq!(record.text, PLACEHOLDER_TEXT);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let record = normalize(&[0x66, 0x6f, 0xff, 0x6f]);
        assert_eq!(record.text, "fo\u{fffd}o");
    }

    #[test]
    fn test_invalid_utf8_inside_json_string_stays_structured() {
        let payload = WebhookPayload::parse(b"{\"text\":\"a\xffb\",\"status\":\"done\"}");
        assert!(payload.is_structured());

        let record = payload.to_record();
        assert_eq!(record.text, "a\u{fffd}b");
        assert_eq!(record.status, "done");
    }

    #[test]
    fn test_json_null_is_empty_object() {
        let payload = WebhookPayload::parse(b"null");
        assert_eq!(payload, WebhookPayload::Structured(Map::new()));
        assert_eq!(payload.to_record().text, PLACEHOLDER_TEXT);

        let payload = WebhookPayload::parse(b" null \n");
        assert!(payload.is_structured());
    }

    #[test]
    fn test_into_object_wraps_raw_text() {
        let object = WebhookPayload::parse(b"plain").into_object();
        assert_eq!(object.get("text"), Some(&JsonValue::String("plain".into())));

        let object = WebhookPayload::parse(br#"{"document_type":"invoice"}"#).into_object();
        assert_eq!(object.get("document_type"), Some(&JsonValue::String("invoice".into())));
    }
}
