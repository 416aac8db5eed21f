//! Client for the external zero-knowledge prover service (§6.2). Transient
//! failures (network errors, 429, 5xx) are retried with capped exponential
//! backoff; any other 4xx is fatal for the job and returned immediately.

use crate::error::ProverError;
use crate::types::{ProofJobAccepted, ProofJobStatus, ProofRequestBody};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

const MAX_RETRIES: usize = 6;
const BASE_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

fn retry_delay(attempt: usize) -> Duration {
    let millis = BASE_BACKOFF.as_millis() as u64 * (1u64 << attempt.min(10));
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

#[derive(Clone)]
pub struct ProverClient {
    base_url: String,
    http: Client,
}

impl ProverClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    pub async fn submit_proof(
        &self,
        proof_type: impl Into<String>,
        input: serde_json::Value,
    ) -> Result<ProofJobAccepted, ProverError> {
        let url = format!("{}/proof", self.base_url);
        let body = ProofRequestBody {
            proof_type: proof_type.into(),
            input,
        };
        self.with_retries(|| self.http.post(&url).json(&body).send())
            .await
    }

    pub async fn poll_status(&self, request_id: &str) -> Result<ProofJobStatus, ProverError> {
        let url = format!("{}/proof/{}", self.base_url, request_id);
        self.with_retries(|| self.http.get(&url).send()).await
    }

    async fn with_retries<F, Fut, T>(&self, make_request: F) -> Result<T, ProverError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;
        loop {
            let response = match make_request().await {
                Ok(resp) => resp,
                Err(e) => {
                    if attempt >= MAX_RETRIES {
                        return Err(ProverError::RetriesExhausted(e.to_string()));
                    }
                    debug!(attempt, error = %e, "prover transport error, retrying");
                    tokio::time::sleep(retry_delay(attempt)).await;
                    attempt += 1;
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response.json::<T>().await?);
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            let body = response.text().await.unwrap_or_default();
            if retryable && attempt < MAX_RETRIES {
                debug!(attempt, %status, "prover returned retryable status, backing off");
                tokio::time::sleep(retry_delay(attempt)).await;
                attempt += 1;
                continue;
            }
            if retryable {
                return Err(ProverError::RetriesExhausted(format!(
                    "status {status}: {body}"
                )));
            }
            return Err(ProverError::Fatal {
                status: status.as_u16(),
                body,
            });
        }
    }
}
