//! Egress delivery configuration.

use serde::{Deserialize, Serialize};

/// Transport spool/outbox locations and egress limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Directory the spool transport reads inbound file references from.
    #[serde(default = "default_spool_root")]
    pub spool_root: String,
    /// Directory the spool transport delivers finished artifacts into.
    #[serde(default = "default_outbox_root")]
    pub outbox_root: String,
    /// Hard size limit of the low-overhead egress channel. Artifacts above
    /// this are not handed off; a warning is emitted instead.
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            spool_root: default_spool_root(),
            outbox_root: default_outbox_root(),
            max_artifact_bytes: default_max_artifact_bytes(),
        }
    }
}

fn default_spool_root() -> String {
    "data/spool".to_string()
}

fn default_outbox_root() -> String {
    "data/outbox".to_string()
}

fn default_max_artifact_bytes() -> u64 {
    // 2 GiB, the upload ceiling of the default transport channel.
    2 * 1024 * 1024 * 1024
}
