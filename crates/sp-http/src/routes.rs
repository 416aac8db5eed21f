use crate::dto::{ProofStatusDto, ProofSubmissionDto};
use crate::error::AppError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use sp_superblock::ProofCollector;
use std::sync::Arc;

#[derive(Clone)]
pub struct HttpState {
    pub collector: Arc<ProofCollector>,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/proofs/op-succinct", post(submit_proof))
        .route("/v1/proofs/status/:sb_hash", get(proof_status))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "OK"
}

async fn submit_proof(
    State(state): State<HttpState>,
    Json(payload): Json<ProofSubmissionDto>,
) -> Result<StatusCode, AppError> {
    let (submission, superblock_number) = payload.into_submission()?;
    state
        .collector
        .submit(submission, superblock_number)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(StatusCode::ACCEPTED)
}

async fn proof_status(
    State(state): State<HttpState>,
    Path(sb_hash): Path<String>,
) -> Result<Json<ProofStatusDto>, AppError> {
    let bytes = hex::decode(sb_hash.trim_start_matches("0x"))
        .map_err(|e| AppError::BadRequest(format!("sbHash: invalid hex: {e}")))?;
    let hash: [u8; 32] = bytes
        .try_into()
        .map_err(|v: Vec<u8>| AppError::BadRequest(format!("sbHash: expected 32 bytes, got {}", v.len())))?;
    let status = state
        .collector
        .status(hash)
        .await
        .ok_or_else(|| AppError::NotFound("no status tracked for this superblock hash".to_string()))?;
    Ok(Json(status.into()))
}
