//! Thin HTTP adapter onto `sp-superblock`: proof submission (§6.3), proof
//! status, and a health check. No business logic beyond argument
//! marshalling and status-code mapping.

pub mod dto;
pub mod error;
pub mod routes;
pub mod serve;

pub use error::AppError;
pub use routes::{router, HttpState};
pub use serve::run;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sp_superblock::ProofCollector;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> axum::Router {
        router(HttpState {
            collector: Arc::new(ProofCollector::new()),
        })
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let response = test_app()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn submit_proof_with_bad_hex_is_bad_request() {
        let body = serde_json::json!({
            "superblockNumber": 1,
            "superblockHash": "not-hex",
            "chainID": "A",
            "proverAddress": hex::encode([1u8; 20]),
            "l1Head": hex::encode([1u8; 32]),
            "preRoot": hex::encode([1u8; 32]),
            "postRoot": hex::encode([1u8; 32]),
            "l2StartBlock": 1,
            "l2BlockNumber": 2,
            "rollupConfigHash": hex::encode([1u8; 32]),
            "aggregationOutputs": {
                "l1Head": hex::encode([1u8; 32]),
                "proverAddress": hex::encode([1u8; 20]),
                "l2BlockNumber": 2
            },
            "aggVk": "aabb",
            "proof": "ccdd"
        });
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/proofs/op-succinct")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submit_then_fetch_status_round_trips() {
        let app = test_app();
        let superblock_hash = [7u8; 32];
        let body = serde_json::json!({
            "superblockNumber": 1,
            "superblockHash": hex::encode(superblock_hash),
            "chainID": "A",
            "proverAddress": hex::encode([9u8; 20]),
            "l1Head": hex::encode([3u8; 32]),
            "preRoot": hex::encode([1u8; 32]),
            "postRoot": hex::encode([2u8; 32]),
            "l2StartBlock": 1,
            "l2BlockNumber": 2,
            "rollupConfigHash": hex::encode([4u8; 32]),
            "aggregationOutputs": {
                "l1Head": hex::encode([3u8; 32]),
                "proverAddress": hex::encode([9u8; 20]),
                "l2BlockNumber": 2
            },
            "aggVk": "aabb",
            "proof": "ccdd"
        });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/proofs/op-succinct")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let status_response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/v1/proofs/status/{}", hex::encode(superblock_hash)))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(status_response.status(), StatusCode::OK);
    }
}
