// ERP HTTP client
//
// Talks to the ERP HTTP service published under `<base_url>/hs/DocumentAI`.
// Every request carries basic auth credentials from the ERP configuration.

use docrelay_config::ErpConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::DocumentData;
use crate::error::ErpError;

const CREATE_DOCUMENT_PATH: &str = "/hs/DocumentAI/CreateDocument";
const TEST_PATH: &str = "/hs/DocumentAI/Test";

/// Reply of the ERP CreateDocument endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// Reference to the object created on the ERP side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// ErpClient posts documents to the ERP system
#[derive(Clone)]
pub struct ErpClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ErpClient {
    /// Create a new client from the ERP configuration
    pub fn new(config: &ErpConfig) -> Result<Self, ErpError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Post one document. Non-2xx replies become `ErpError::Rejected`.
    pub async fn send_document(&self, document: &DocumentData) -> Result<ErpResponse, ErpError> {
        let url = format!("{}{}", self.base_url, CREATE_DOCUMENT_PATH);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .json(document)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(
            url = %url,
            status = %status,
            bytes = body.len(),
            document_id = %document.id,
            "ERP CreateDocument replied"
        );

        if !status.is_success() {
            // Prefer the structured error, fall back to the raw body
            let message = serde_json::from_slice::<ErpResponse>(&body)
                .ok()
                .and_then(|r| r.error.or(Some(r.message)).filter(|m| !m.is_empty()))
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            return Err(ErpError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Check that the ERP service answers 200 on its test endpoint
    pub async fn test_connection(&self) -> Result<(), ErpError> {
        let url = format!("{}{}", self.base_url, TEST_PATH);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(ErpError::Unavailable {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}
