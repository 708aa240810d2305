/// Failures talking to the ERP system
#[derive(Debug, thiserror::Error)]
pub enum ErpError {
    #[error("ERP integration is disabled")]
    Disabled,

    #[error("request to ERP failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ERP returned error {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("ERP is unavailable, status {status}")]
    Unavailable { status: u16 },

    #[error("invalid ERP response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl ErpError {
    /// Whether the error came from the remote side rather than local state
    pub fn is_remote(&self) -> bool {
        !matches!(self, ErpError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ErpError::Rejected {
            status: 422,
            message: "unknown counterparty".into(),
        };
        assert_eq!(err.to_string(), "ERP returned error 422: unknown counterparty");
        assert!(err.is_remote());

        let err = ErpError::Unavailable { status: 503 };
        assert!(err.to_string().contains("503"));

        assert!(!ErpError::Disabled.is_remote());
    }
}
