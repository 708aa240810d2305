// Upload relay
//
// Validates a browser upload and forwards it as multipart to the automation
// webhook. The file only lives in memory for the duration of the request.

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::StatusCode;
use docrelay_config::RelayConfig;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use docrelay_core::truncate_for_log;

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("message is required")]
    MissingMessage,

    #[error("file is required")]
    MissingFile,

    #[error("unsupported file type '{0}', allowed: pdf, jpg, jpeg, png")]
    UnsupportedFileType(String),

    #[error("invalid multipart request: {0}")]
    Multipart(String),

    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned error {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl RelayError {
    /// Client mistakes are 400, anything past validation is 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingMessage
            | RelayError::MissingFile
            | RelayError::UnsupportedFileType(_)
            | RelayError::Multipart(_) => StatusCode::BAD_REQUEST,
            RelayError::Transport(_) | RelayError::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Whether the file name carries one of the accepted document extensions
pub fn is_valid_file_type(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// A validated upload
#[derive(Debug, Clone)]
pub struct Upload {
    pub message: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    /// Read `message` and `file` from a multipart body. Other fields are ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, RelayError> {
        let mut message = None;
        let mut file = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| RelayError::Multipart(e.body_text()))?
        {
            match field.name() {
                Some("message") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| RelayError::Multipart(e.body_text()))?;
                    message = Some(text.trim().to_string());
                }
                Some("file") => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| RelayError::Multipart(e.body_text()))?;
                    file = Some((file_name, content_type, bytes));
                }
                other => {
                    debug!(field = ?other, "Ignoring multipart field");
                }
            }
        }

        let message = message
            .filter(|m| !m.is_empty())
            .ok_or(RelayError::MissingMessage)?;
        let (file_name, content_type, bytes) = file.ok_or(RelayError::MissingFile)?;
        if file_name.is_empty() {
            return Err(RelayError::MissingFile);
        }
        if !is_valid_file_type(&file_name) {
            return Err(RelayError::UnsupportedFileType(file_name));
        }

        Ok(Self {
            message,
            file_name,
            content_type,
            bytes,
        })
    }
}

/// Forwards uploads to the automation webhook
#[derive(Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
    webhook_url: String,
    execution_mode: String,
}

impl WebhookRelay {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            execution_mode: config.execution_mode.clone(),
        })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Post the upload to the webhook. Any non-2xx reply is an error.
    pub async fn forward(&self, upload: Upload) -> Result<(), RelayError> {
        let size = upload.bytes.len();
        let mut part = Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name.clone());
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }

        let form = Form::new()
            .text("message", upload.message)
            .text("fileName", upload.file_name.clone())
            .text("webhookUrl", self.webhook_url.clone())
            .text("executionMode", self.execution_mode.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.webhook_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!(
            url = %self.webhook_url,
            status = %status,
            file_name = %upload.file_name,
            bytes = size,
            "Webhook replied"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body = %truncate_for_log(&body, 200),
                "Webhook rejected upload"
            );
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_file_type() {
        let cases = [
            ("invoice.pdf", true),
            ("scan.JPG", true),
            ("photo.jpeg", true),
            ("receipt.Png", true),
            ("archive.pdf.zip", false),
            ("notes.txt", false),
            ("pdf", false),
            ("", false),
        ];
        for (name, expected) in cases {
            assert_eq!(is_valid_file_type(name), expected, "{name}");
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayError::MissingMessage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::UnsupportedFileType("a.txt".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        let upstream = RelayError::Upstream {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.to_string(), "webhook returned error 502: bad gateway");
    }
}
