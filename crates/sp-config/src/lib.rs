//! TOML configuration for the publisher node, covering every option in
//! §6.4: `server`, `consensus`, `slot`, `period`, `queue`, `auth`,
//! `proofs`, `metrics`.

pub mod config;
pub mod error;

pub use config::{
    AuthConfig, ChainsConfig, Config, ConsensusConfig, MetricsConfig, PeriodSectionConfig,
    ProofsConfig, QueueConfig, ServerConfig, SlotSectionConfig, TrustedSequencerConfig,
};
pub use error::ConfigError;
