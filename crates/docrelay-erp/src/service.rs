use docrelay_config::{DocumentTypeMapping, ErpConfig};
use docrelay_core::IntegrationResult;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::client::ErpClient;
use crate::document::{apply_field_mapping, parse_document, DocumentData};
use crate::error::ErpError;

const DISABLED_NOTE: &str = "integration disabled";
const PREPARED_NOTE: &str = "prepared, auto-send disabled";

/// Reachability of the ERP system as reported by `/erp/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Ok,
    Error,
    Disabled,
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErpStatus {
    pub enabled: bool,
    pub auto_send: bool,
    pub connection: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErpStatus {
    /// Status reported when no ERP service was configured at all
    pub fn not_configured() -> Self {
        Self {
            enabled: false,
            auto_send: false,
            connection: ConnectionState::NotConfigured,
            error: None,
        }
    }
}

/// ErpService turns callback payloads into ERP documents and sends them
pub struct ErpService {
    client: Option<ErpClient>,
    auto_send: bool,
    mapping: HashMap<String, DocumentTypeMapping>,
}

impl ErpService {
    /// Build the service and check the ERP endpoint.
    ///
    /// An unreachable ERP system does not stop startup: the service logs a
    /// warning and runs disabled.
    pub async fn connect(config: &ErpConfig) -> Self {
        let mut service = Self::disabled(config);
        if !config.enabled {
            info!("ERP integration disabled");
            return service;
        }

        let client = match ErpClient::new(config) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Failed to build ERP client, integration disabled");
                return service;
            }
        };

        match client.test_connection().await {
            Ok(()) => {
                info!(
                    base_url = %client.base_url(),
                    auto_send = config.auto_send,
                    mappings = config.mapping.len(),
                    "ERP integration enabled"
                );
                service.client = Some(client);
            }
            Err(e) => {
                warn!(
                    base_url = %client.base_url(),
                    error = %e,
                    "ERP connection test failed, integration disabled"
                );
            }
        }
        service
    }

    /// Service with a client but without the startup connection check
    pub fn with_client(client: ErpClient, config: &ErpConfig) -> Self {
        Self {
            client: Some(client),
            ..Self::disabled(config)
        }
    }

    fn disabled(config: &ErpConfig) -> Self {
        Self {
            client: None,
            auto_send: config.auto_send,
            mapping: config.mapping.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn auto_send(&self) -> bool {
        self.auto_send
    }

    /// Process one callback payload. Failures end up in the result's
    /// `error_message`, never as an error.
    pub async fn process(&self, payload: &Map<String, JsonValue>, force_send: bool) -> IntegrationResult {
        let document = self.prepare(payload);
        let document_id = document.id.clone();

        match self.dispatch(document, force_send).await {
            Ok(result) => result,
            Err(e) => {
                warn!(document_id = %document_id, error = %e, "ERP forwarding failed");
                IntegrationResult {
                    success: false,
                    document_id,
                    error_message: Some(e.to_string()),
                    ..Default::default()
                }
            }
        }
    }

    /// Send a document on explicit request, ignoring `auto_send`.
    ///
    /// A non-empty `document_id` replaces whatever id the payload carries.
    pub async fn send_manually(
        &self,
        document_id: &str,
        data: &Map<String, JsonValue>,
    ) -> Result<IntegrationResult, ErpError> {
        if !self.is_enabled() {
            return Err(ErpError::Disabled);
        }

        let mut document = self.prepare(data);
        if !document_id.is_empty() {
            document.id = document_id.to_string();
        }
        self.dispatch(document, true).await
    }

    /// Current configuration plus a live connection check
    pub async fn status(&self) -> ErpStatus {
        let Some(client) = &self.client else {
            return ErpStatus {
                enabled: false,
                auto_send: self.auto_send,
                connection: ConnectionState::Disabled,
                error: None,
            };
        };

        let (connection, error) = match client.test_connection().await {
            Ok(()) => (ConnectionState::Ok, None),
            Err(e) => (ConnectionState::Error, Some(e.to_string())),
        };
        ErpStatus {
            enabled: true,
            auto_send: self.auto_send,
            connection,
            error,
        }
    }

    fn prepare(&self, payload: &Map<String, JsonValue>) -> DocumentData {
        let document = parse_document(payload);
        match self.mapping.get(&document.document_type) {
            Some(mapping) => apply_field_mapping(document, mapping),
            None => {
                debug!(document_type = %document.document_type, "No ERP mapping for document type");
                document
            }
        }
    }

    async fn dispatch(&self, document: DocumentData, force_send: bool) -> Result<IntegrationResult, ErpError> {
        let Some(client) = &self.client else {
            return Ok(noted(document.id, DISABLED_NOTE));
        };
        if !self.auto_send && !force_send {
            debug!(document_id = %document.id, "ERP document prepared, auto-send disabled");
            return Ok(noted(document.id, PREPARED_NOTE));
        }

        let response = client.send_document(&document).await?;
        if !response.success {
            let message = response.error.unwrap_or(response.message);
            return Ok(IntegrationResult {
                success: false,
                document_id: document.id,
                error_message: Some(message),
                ..Default::default()
            });
        }

        info!(
            document_id = %document.id,
            erp_ref = response.reference.as_deref().unwrap_or(""),
            "Document sent to ERP"
        );
        Ok(IntegrationResult {
            success: true,
            document_id: document.id,
            erp_ref: response.reference,
            message: Some(response.message).filter(|m| !m.is_empty()),
            error_message: None,
        })
    }
}

fn noted(document_id: String, note: &str) -> IntegrationResult {
    IntegrationResult {
        success: true,
        document_id,
        message: Some(note.to_string()),
        ..Default::default()
    }
}
