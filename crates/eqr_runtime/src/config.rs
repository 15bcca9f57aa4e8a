use crate::error::Result;
use eqr_codec::DecoderConfig;
use eqr_vm::VmConfig;
use serde::{Deserialize, Serialize};

/// Everything a session needs to decode and run a payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub decoder: DecoderConfig,
    pub vm: VmConfig,
}

impl SessionConfig {
    /// Missing keys keep their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = SessionConfig::from_json(r#"{"vm": {"step_limit": 50}}"#).unwrap();
        assert_eq!(cfg.vm.step_limit, 50);
        assert_eq!(cfg.vm.tolerance, 1e-4);
        assert_eq!(cfg.decoder, DecoderConfig::default());
        assert_eq!(SessionConfig::from_json("{}").unwrap(), SessionConfig::default());
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(SessionConfig::from_json("{").is_err());
    }
}
