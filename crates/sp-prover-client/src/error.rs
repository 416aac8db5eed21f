use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error("prover rejected the request ({status}): {body}")]
    Fatal { status: u16, body: String },
    #[error("prover request failed after exhausting retries: {0}")]
    RetriesExhausted(String),
    #[error("i/o or transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed prover response: {0}")]
    Decode(#[from] serde_json::Error),
}
