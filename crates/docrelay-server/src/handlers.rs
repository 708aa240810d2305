// HTTP request handlers for server mode
//
// Upload relay, result ingestion/retrieval, health and ERP endpoints

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use docrelay_core::{truncate_for_log, ApiResponse, IntegrationResult, ResultRecord, WebhookPayload};
use docrelay_erp::ErpStatus;
use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::relay::{RelayError, Upload};
use crate::{AppError, AppState};

const LOG_PREVIEW_CHARS: usize = 120;

/// POST /upload - validate a document upload and relay it to the webhook
pub(crate) async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse>, AppError> {
    let upload = Upload::from_multipart(multipart)
        .await
        .map_err(relay_error)?;

    info!(
        file_name = %upload.file_name,
        bytes = upload.bytes.len(),
        message = %truncate_for_log(&upload.message, LOG_PREVIEW_CHARS),
        "Relaying upload"
    );

    if let Err(e) = state.relay.forward(upload).await {
        counter!("docrelay.upload.failed", 1);
        return Err(relay_error(e));
    }
    counter!("docrelay.upload.relayed", 1);

    Ok(Json(ApiResponse::message("document submitted for processing")))
}

fn relay_error(err: RelayError) -> AppError {
    AppError::with_status(err.status_code(), err.into())
}

/// POST /webhook, /webhook-test - processing result callback
///
/// Always answers 200: whatever the body, a record is stored. With ERP
/// forwarding enabled the answer waits for the ERP outcome, which is stored
/// on the record.
pub(crate) async fn webhook(State(state): State<AppState>, body: Bytes) -> Json<ApiResponse> {
    counter!("docrelay.webhook.received", 1);
    debug!(bytes = body.len(), "Received webhook callback");

    let payload = WebhookPayload::parse(&body);
    let mut record = payload.to_record();
    if record.text == docrelay_core::PLACEHOLDER_TEXT {
        counter!("docrelay.webhook.placeholder", 1);
    }

    if let Some(erp) = &state.erp {
        let result = erp.process(&payload.into_object(), false).await;
        record_erp_outcome(&result);
        record = record.with_erp_status(result);
    }

    log_stored(&record);
    state.store.append(record);

    Json(ApiResponse::message("result stored"))
}

fn log_stored(record: &ResultRecord) {
    info!(
        id = %record.id,
        status = %record.status,
        text = %truncate_for_log(&record.text, LOG_PREVIEW_CHARS),
        "Stored result"
    );
}

fn record_erp_outcome(result: &IntegrationResult) {
    if result.success {
        if result.erp_ref.is_some() {
            counter!("docrelay.erp.sent", 1);
        }
    } else {
        counter!("docrelay.erp.failed", 1);
        warn!(
            document_id = %result.document_id,
            error = result.error_message.as_deref().unwrap_or(""),
            "ERP forwarding did not succeed"
        );
    }
}

/// GET /results - stored results, oldest first
pub(crate) async fn results(State(state): State<AppState>) -> Json<ApiResponse<Vec<ResultRecord>>> {
    Json(ApiResponse::success(state.store.snapshot()))
}

/// GET /health - Basic health check
pub(crate) async fn health_check(State(state): State<AppState>) -> Json<ApiResponse> {
    let erp_integration = state.erp.as_ref().is_some_and(|erp| erp.is_enabled());
    Json(ApiResponse::success(json!({
        "status": "healthy",
        "message": "docrelay is running",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "erp_integration": erp_integration,
    })))
}

/// GET /erp/status - ERP configuration and connectivity
pub(crate) async fn erp_status(State(state): State<AppState>) -> Json<ApiResponse<ErpStatus>> {
    let status = match &state.erp {
        Some(erp) => erp.status().await,
        None => ErpStatus::not_configured(),
    };
    Json(ApiResponse::success(status))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErpSendRequest {
    #[serde(default)]
    document_id: String,
    data: Map<String, JsonValue>,
}

/// POST /erp/send - send a document to the ERP system on demand
pub(crate) async fn erp_send(
    State(state): State<AppState>,
    request: Result<Json<ErpSendRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<IntegrationResult>>, AppError> {
    let Json(request) = request.map_err(|rejection| {
        AppError::with_status(
            StatusCode::BAD_REQUEST,
            anyhow::anyhow!("invalid request body: {}", rejection.body_text()),
        )
    })?;
    let Some(erp) = &state.erp else {
        return Err(AppError::with_status(
            StatusCode::SERVICE_UNAVAILABLE,
            anyhow::anyhow!("ERP integration is not configured"),
        ));
    };

    match erp.send_manually(&request.document_id, &request.data).await {
        Ok(result) => {
            record_erp_outcome(&result);
            Ok(Json(ApiResponse::success(result)))
        }
        Err(e) => {
            counter!("docrelay.erp.failed", 1);
            let status = if e.is_remote() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            Err(AppError::with_status(status, e.into()))
        }
    }
}
