use std::path::Path;

use relay_client::ClientConfig;
use serde::{Deserialize, Serialize};

/// On-disk demo configuration.
///
/// ```toml
/// [relay]
/// endpoint = "tcp://192.168.1.20:8899"
/// client_id = "random_data_generator_2"
///
/// [demo]
/// interval_secs = 5
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub relay: ClientConfig,
    #[serde(default)]
    pub demo: SamplingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Seconds between telemetry samples.
    #[serde(default = "d_5")]
    pub interval_secs: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { interval_secs: d_5() }
    }
}

impl DemoConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

fn d_5() -> u64 {
    5
}
