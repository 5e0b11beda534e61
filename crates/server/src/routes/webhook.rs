//! Inbound settlement webhook handler.
//!
//! The body is taken as raw bytes; signature verification must see the
//! payload exactly as the processor sent it.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::error::{AppError, Result};
use crate::services::settlement::{RawPayload, SIGNATURE_HEADER, SettlementError};
use crate::state::AppState;

/// `POST /webhook`
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Settlement(SettlementError::SignatureMismatch))?;

    state
        .settlement()
        .reconcile(&RawPayload::from(body), signature)
        .await?;

    Ok(StatusCode::OK)
}
