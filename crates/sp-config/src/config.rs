//! The node's TOML configuration, one struct per §6.4 section. Durations
//! are expressed in seconds/milliseconds rather than `humantime` strings to
//! keep this plain-TOML.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::ConfigError;

fn default_listen_addr() -> String {
    "0.0.0.0:7420".to_string()
}
fn default_http_listen_addr() -> String {
    "0.0.0.0:7421".to_string()
}
fn default_max_connections() -> usize {
    1000
}
fn default_read_timeout_secs() -> u64 {
    20
}
fn default_write_timeout_secs() -> u64 {
    20
}
fn default_max_message_size() -> usize {
    10 * 1024 * 1024
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Address for the HTTP proof-submission ingress (§6.3), distinct from
    /// the sequencer-facing wire protocol's `listen_addr`.
    pub http_listen_addr: String,
    pub max_connections: usize,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            http_listen_addr: default_http_listen_addr(),
            max_connections: default_max_connections(),
            read_timeout_secs: default_read_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub timeout_secs: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self { timeout_secs: 180 }
    }
}

impl ConsensusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSectionConfig {
    pub duration_ms: u64,
    pub seal_cutover: f64,
    /// Unix timestamp (seconds) of slot 0's start.
    pub genesis_time_unix: u64,
}

impl Default for SlotSectionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 12_000,
            seal_cutover: 0.90,
            genesis_time_unix: 0,
        }
    }
}

impl SlotSectionConfig {
    pub fn to_slot_config(&self) -> sp_types::SlotConfig {
        sp_types::SlotConfig {
            genesis_time: UNIX_EPOCH + Duration::from_secs(self.genesis_time_unix),
            slot_duration: Duration::from_millis(self.duration_ms),
            seal_cutover: self.seal_cutover,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodSectionConfig {
    pub slots_per_epoch: u64,
    pub epochs_per_period: u64,
}

impl Default for PeriodSectionConfig {
    fn default() -> Self {
        Self {
            slots_per_epoch: 32,
            epochs_per_period: 10,
        }
    }
}

impl PeriodSectionConfig {
    pub fn to_period_config(&self) -> sp_types::PeriodConfig {
        sp_types::PeriodConfig {
            slots_per_epoch: self.slots_per_epoch,
            epochs_per_period: self.epochs_per_period,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub max_size: usize,
    pub request_expiration_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_size: 10_000,
            request_expiration_secs: 600,
        }
    }
}

impl QueueConfig {
    pub fn request_expiration(&self) -> Duration {
        Duration::from_secs(self.request_expiration_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrustedSequencerConfig {
    pub id: String,
    /// Hex-encoded compressed secp256k1 public key.
    pub public_key: String,
}

impl TrustedSequencerConfig {
    pub fn to_identity(&self) -> Result<sp_types::SequencerIdentity, ConfigError> {
        let bytes = hex::decode(&self.public_key)?;
        let pubkey: [u8; sp_types::PUBKEY_LEN] =
            bytes
                .try_into()
                .map_err(|v: Vec<u8>| ConfigError::BadPublicKeyLength {
                    expected: sp_types::PUBKEY_LEN,
                    actual: v.len(),
                })?;
        Ok(sp_types::SequencerIdentity::new(self.id.clone(), pubkey))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether the handshake additionally requires the peer's pubkey to be
    /// in `trusted_sequencers`. The signature check itself is never
    /// skipped; disabling this only loosens trusted-set membership.
    pub enabled: bool,
    /// Hex-encoded secp256k1 private key identifying this node. Validated
    /// eagerly at startup via `Config::node_keypair`; left empty if this
    /// node never needs to prove its own identity.
    pub private_key: String,
    pub trusted_sequencers: Vec<TrustedSequencerConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            private_key: String::new(),
            trusted_sequencers: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofsConfig {
    pub enabled: bool,
    pub prover_base_url: String,
}

impl Default for ProofsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prover_base_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// The rollups this publisher coordinates for. The superblock controller
/// needs a registered chain set, separate from per-sequencer trust, to
/// validate inbound `Block` submissions against.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChainsConfig {
    pub registered: Vec<String>,
}

impl ChainsConfig {
    pub fn registered_set(&self) -> std::collections::BTreeSet<sp_types::ChainId> {
        self.registered
            .iter()
            .map(|s| sp_types::ChainId::from(s.as_str()))
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9617,
        }
    }
}

/// The node's complete configuration (§6.4), loaded from a TOML file with
/// every section defaulted so a minimal file only needs to override what
/// it cares about.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub consensus: ConsensusConfig,
    pub slot: SlotSectionConfig,
    pub period: PeriodSectionConfig,
    pub queue: QueueConfig,
    pub auth: AuthConfig,
    pub proofs: ProofsConfig,
    pub metrics: MetricsConfig,
    pub chains: ChainsConfig,
}

impl Config {
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let raw = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn trusted_set(&self) -> Result<sp_types::TrustedSet, ConfigError> {
        let identities = self
            .auth
            .trusted_sequencers
            .iter()
            .map(TrustedSequencerConfig::to_identity)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sp_types::TrustedSet::new(identities))
    }

    /// Parses `auth.private_key` into a usable keypair, or `None` if the
    /// field was left unset (§6.4).
    pub fn node_keypair(&self) -> Result<Option<sp_crypto::KeyPair>, ConfigError> {
        if self.auth.private_key.is_empty() {
            return Ok(None);
        }
        let bytes = hex::decode(&self.auth.private_key)?;
        Ok(Some(sp_crypto::KeyPair::from_secret_bytes(&bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.server.max_connections, 1000);
        assert_eq!(parsed.period.slots_per_epoch, 32);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let text = r#"
            [server]
            listen_addr = "0.0.0.0:9000"

            [metrics]
            port = 9999
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.metrics.port, 9999);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn trusted_sequencer_with_bad_key_length_is_rejected() {
        let mut config = Config::default();
        config.auth.trusted_sequencers.push(TrustedSequencerConfig {
            id: "seq-a".to_string(),
            public_key: "aabbcc".to_string(),
        });
        let err = config.trusted_set().unwrap_err();
        assert!(matches!(err, ConfigError::BadPublicKeyLength { .. }));
    }

    #[test]
    fn node_keypair_is_none_when_unset() {
        let config = Config::default();
        assert!(config.node_keypair().unwrap().is_none());
    }

    #[test]
    fn node_keypair_parses_valid_hex_secret() {
        let mut config = Config::default();
        config.auth.private_key = hex::encode([7u8; 32]);
        let keypair = config.node_keypair().unwrap().unwrap();
        assert_eq!(keypair.public_key_compressed().len(), sp_types::PUBKEY_LEN);
    }

    #[test]
    fn node_keypair_rejects_bad_hex() {
        let mut config = Config::default();
        config.auth.private_key = "not-hex".to_string();
        assert!(config.node_keypair().is_err());
    }

    #[test]
    fn trusted_sequencer_with_valid_key_parses() {
        let mut config = Config::default();
        let hex_key = hex::encode([3u8; sp_types::PUBKEY_LEN]);
        config.auth.trusted_sequencers.push(TrustedSequencerConfig {
            id: "seq-a".to_string(),
            public_key: hex_key,
        });
        let trusted = config.trusted_set().unwrap();
        assert_eq!(trusted.len(), 1);
    }
}
