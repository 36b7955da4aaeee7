//! Network configuration.
//!
//! All tunables of a [`Network`](crate::network::Network) that are not part
//! of the wiring itself. Use with `Network::from_config()`.

use serde::{Deserialize, Serialize};
use xng_core::error::{Result, XngError};
use xng_core::profile::IntegrationProfile;
use xng_core::types::{Duration, DEFAULT_PLASTICITY};

/// Configuration for network simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Plasticity given to every new posterior cluster (default: 0.1).
    pub default_plasticity: f32,
    /// How long node traces keep their impulses, in ticks. Must cover the
    /// longest profile traces are queried under (default: TWOGRAM support).
    pub trace_retention: Duration,
    /// Re-check the safe-conjunction bound when a junction is built (default: false).
    pub strict_conjunction: bool,
    /// Decay of the reinforcement statistics on new edges (default: 0.1).
    pub smoothing_alpha: f32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            default_plasticity: DEFAULT_PLASTICITY,
            trace_retention: IntegrationProfile::TWOGRAM.support(),
            strict_conjunction: false,
            smoothing_alpha: xng_core::distribution::SMOOTHING_ALPHA,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_plasticity) {
            return Err(XngError::PlasticityOutOfRange(self.default_plasticity));
        }
        if self.trace_retention <= 0 {
            return Err(XngError::invalid_config(
                "trace_retention",
                self.trace_retention,
                "must be positive",
            ));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(XngError::invalid_config(
                "smoothing_alpha",
                self.smoothing_alpha,
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = NetworkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trace_retention, 120);
        assert!(!config.strict_conjunction);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = NetworkConfig {
            default_plasticity: 1.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(XngError::PlasticityOutOfRange(1.5)));

        let config = NetworkConfig {
            smoothing_alpha: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(XngError::Config { .. })));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: NetworkConfig = serde_json::from_str(r#"{"strict_conjunction": true}"#).unwrap();
        assert!(config.strict_conjunction);
        assert_eq!(config.default_plasticity, DEFAULT_PLASTICITY);
    }
}
