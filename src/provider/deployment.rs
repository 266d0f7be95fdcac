//! Deployment artifact produced by the contract deploy script.
//!
//! The script exports `{ address, abi }` per network to
//! `abis/<network>/MultitokenLoan.json`; the service reads the address
//! from the same file the web client imports. The ABI itself is bound at
//! compile time, so only its presence is checked here.

use std::{fs, path::Path};

use alloy::primitives::Address;
use serde::Deserialize;
use serde_json::Value;

use crate::{error::Error, helpers::parse_address};

pub const ARTIFACT_FILE: &str = "MultitokenLoan.json";

#[derive(Debug, Deserialize)]
pub struct DeploymentArtifact {
    pub address: String,
    pub abi: Value,
}

pub fn load_contract_address(
    abis_dir: &Path,
    network: &str,
) -> Result<Address, Error> {
    let path = abis_dir.join(network).join(ARTIFACT_FILE);

    let raw = fs::read_to_string(&path).map_err(|e| {
        Error::ConfigurationError(format!(
            "Deployment artifact {}: {}",
            path.display(),
            e
        ))
    })?;

    let artifact: DeploymentArtifact =
        serde_json::from_str(&raw).map_err(|e| {
            Error::ConfigurationError(format!(
                "Deployment artifact {}: {}",
                path.display(),
                e
            ))
        })?;

    if !artifact.abi.is_array() {
        return Err(Error::FieldNotExist(String::from("abi")));
    }

    parse_address(&artifact.address).map_err(|e| {
        Error::ConfigurationError(format!(
            "Deployment artifact {}: bad address: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn artifact_dir(name: &str, content: Option<&str>) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("karmalend_abis_{}", name));
        let network_dir = dir.join("sepolia");
        fs::create_dir_all(&network_dir).unwrap();
        if let Some(content) = content {
            fs::write(network_dir.join(ARTIFACT_FILE), content).unwrap();
        } else {
            let _ = fs::remove_file(network_dir.join(ARTIFACT_FILE));
        }
        dir
    }

    #[test]
    fn loads_exported_address() {
        let dir = artifact_dir(
            "ok",
            Some(
                r#"{"address":"0x5FbDB2315678afecb367f032d93F642f64180aa3","abi":[]}"#,
            ),
        );

        let address = load_contract_address(&dir, "sepolia").unwrap();
        assert_eq!(
            format!("{:#x}", address),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
    }

    #[test]
    fn missing_artifact_is_configuration_error() {
        let dir = artifact_dir("missing", None);
        let result = load_contract_address(&dir, "sepolia");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn malformed_artifact_is_configuration_error() {
        let dir = artifact_dir("malformed", Some("{not json"));
        let result = load_contract_address(&dir, "sepolia");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn artifact_without_abi_is_rejected() {
        let dir = artifact_dir(
            "noabi",
            Some(
                r#"{"address":"0x5FbDB2315678afecb367f032d93F642f64180aa3","abi":{}}"#,
            ),
        );
        let result = load_contract_address(&dir, "sepolia");
        assert!(matches!(result, Err(Error::FieldNotExist(_))));
    }
}
