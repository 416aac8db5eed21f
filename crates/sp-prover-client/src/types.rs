use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
pub(crate) struct ProofRequestBody {
    #[serde(rename = "proofType")]
    pub proof_type: String,
    pub input: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProofJobAccepted {
    pub success: bool,
    pub message: String,
    pub request_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofJobState {
    Queued,
    Running,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProofResult {
    pub proof: String,
    #[serde(rename = "provingTimeMs")]
    pub proving_time_ms: u64,
    pub cycles: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProofJobStatus {
    pub success: bool,
    pub status: ProofJobState,
    pub result: Option<ProofResult>,
}
