//! Contract interface schemas (JSON ABI).

use std::path::Path;

use alloy::json_abi::{Event, Function, JsonAbi};

use crate::error::{SdkError, SdkResult};

const TOKEN_ABI: &str = include_str!("../../abi/ParityToken.json");
const STAKE_ABI: &str = include_str!("../../abi/StakeWallet.json");

/// Parsed interface of one contract. Built once per binding.
#[derive(Debug, Clone)]
pub struct ContractSchema {
    name: String,
    abi: JsonAbi,
}

impl ContractSchema {
    /// Parse a JSON ABI document.
    pub fn from_json_str(name: impl Into<String>, json: &str) -> SdkResult<Self> {
        let name = name.into();
        let abi: JsonAbi = serde_json::from_str(json)
            .map_err(|e| SdkError::Abi(format!("malformed {name} ABI: {e}")))?;

        tracing::debug!(
            contract = %name,
            functions = abi.functions().count(),
            events = abi.events().count(),
            "Contract schema loaded"
        );

        Ok(Self { name, abi })
    }

    /// Read and parse a JSON ABI file.
    pub fn from_path(name: impl Into<String>, path: &Path) -> SdkResult<Self> {
        let name = name.into();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SdkError::Abi(format!("cannot read {name} ABI from {}: {e}", path.display()))
        })?;
        Self::from_json_str(name, &json)
    }

    /// Bundled ParityToken interface.
    pub fn token_default() -> SdkResult<Self> {
        Self::from_json_str("ParityToken", TOKEN_ABI)
    }

    /// Bundled StakeWallet interface.
    pub fn stake_default() -> SdkResult<Self> {
        Self::from_json_str("StakeWallet", STAKE_ABI)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Function by name. Overloads resolve to the first declaration.
    pub fn function(&self, name: &str) -> SdkResult<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| SdkError::Abi(format!("{} has no method {name}", self.name)))
    }

    /// Event by name.
    pub fn event(&self, name: &str) -> SdkResult<&Event> {
        self.abi
            .event(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| SdkError::Abi(format!("{} has no event {name}", self.name)))
    }
}
