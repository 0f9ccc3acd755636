use serde::{Deserialize, Serialize};

use crate::error::{RevealError, RevealResult};

use super::EngineConfig;

pub const ENGINE_CONFIG_JSON_SCHEMA_V1: u32 = 1;

/// Versioned envelope for persisted engine configs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfigJsonContractV1 {
    pub schema_version: u32,
    pub config: EngineConfig,
}

impl EngineConfig {
    pub fn to_json_contract_v1_pretty(self) -> RevealResult<String> {
        let payload = EngineConfigJsonContractV1 {
            schema_version: ENGINE_CONFIG_JSON_SCHEMA_V1,
            config: self,
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            RevealError::InvalidConfig(format!("failed to serialize config contract v1: {e}"))
        })
    }

    /// Accepts either the versioned envelope or a bare config.
    pub fn from_json_compat_str(input: &str) -> RevealResult<Self> {
        let value: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| RevealError::InvalidConfig(format!("failed to parse config json: {e}")))?;
        if value.get("schema_version").is_none() {
            return Self::from_json_str(input);
        }
        let payload: EngineConfigJsonContractV1 = serde_json::from_value(value).map_err(|e| {
            RevealError::InvalidConfig(format!("failed to parse config contract payload: {e}"))
        })?;
        if payload.schema_version != ENGINE_CONFIG_JSON_SCHEMA_V1 {
            return Err(RevealError::InvalidConfig(format!(
                "unsupported config schema version: {}",
                payload.schema_version
            )));
        }
        payload.config.validate()
    }
}
