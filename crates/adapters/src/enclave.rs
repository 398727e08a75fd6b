// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `EnclaveManager`: create/inspect/destroy the enclave (the isolated network
//! namespace + service group) that hosts one EL/CL pair for the duration of a
//! run.
//!
//! Real implementations shell out to the enclave engine's CLI using
//! [`crate::subprocess::run_with_timeout`]; this module only defines the
//! trait and a fake for orchestrator/recovery tests.

use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Timeout for a single `kurtosis` CLI call; enclave creation pulls images
/// and can take longer than a plain inspect.
const ENCLAVE_CALL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum EnclaveError {
    #[error("enclave {0} not found")]
    NotFound(String),
    #[error("enclave {0} already exists")]
    AlreadyExists(String),
    #[error("service {service} not found in enclave {enclave}")]
    ServiceNotFound { enclave: String, service: String },
    #[error("enclave engine call failed: {0}")]
    CallFailed(String),
}

/// Image/entrypoint/cmd/ports details about a running service, as reported by
/// the enclave engine's inspect call. Feeds `ClientInfo` at Start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceInfo {
    pub image: String,
    pub entrypoint: Vec<String>,
    pub cmd: Vec<String>,
    pub public_ports: HashMap<String, u16>,
}

#[async_trait]
pub trait EnclaveManager: Send + Sync {
    /// Create the enclave if it does not already exist. Idempotent: calling
    /// `run` twice for the same name with the same spec succeeds both times.
    async fn run(&self, enclave: &str) -> Result<(), EnclaveError>;

    async fn exists(&self, enclave: &str) -> Result<bool, EnclaveError>;

    async fn inspect_service(
        &self,
        enclave: &str,
        service: &str,
    ) -> Result<ServiceInfo, EnclaveError>;

    async fn destroy(&self, enclave: &str) -> Result<(), EnclaveError>;

    /// List enclaves currently known to the engine, for the recovery
    /// subsystem's orphan scan.
    async fn list(&self) -> Result<Vec<String>, EnclaveError>;
}

#[derive(Debug, Deserialize)]
struct KurtosisPort {
    number: u16,
}

#[derive(Debug, Deserialize)]
struct KurtosisService {
    image: String,
    #[serde(default)]
    entrypoint: Vec<String>,
    #[serde(default)]
    cmd: Vec<String>,
    #[serde(default)]
    ports: HashMap<String, KurtosisPort>,
}

#[derive(Debug, Deserialize)]
struct KurtosisInspect {
    #[serde(default)]
    services: HashMap<String, KurtosisService>,
}

#[derive(Debug, Deserialize)]
struct KurtosisEnclaveListing {
    name: String,
}

/// Real `EnclaveManager` backed by the `kurtosis` CLI.
pub struct KurtosisEnclaveManager {
    binary: String,
}

impl KurtosisEnclaveManager {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd
    }
}

impl Default for KurtosisEnclaveManager {
    fn default() -> Self {
        Self::new("kurtosis")
    }
}

#[async_trait]
impl EnclaveManager for KurtosisEnclaveManager {
    async fn run(&self, enclave: &str) -> Result<(), EnclaveError> {
        let output = run_with_timeout(
            self.command(&["enclave", "add", "--name", enclave]),
            ENCLAVE_CALL_TIMEOUT,
            "kurtosis enclave add",
        )
        .await
        .map_err(EnclaveError::CallFailed)?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("already exists") {
            Ok(())
        } else {
            Err(EnclaveError::CallFailed(stderr.trim().to_string()))
        }
    }

    async fn exists(&self, enclave: &str) -> Result<bool, EnclaveError> {
        let output = run_with_timeout(
            self.command(&["enclave", "inspect", enclave]),
            ENCLAVE_CALL_TIMEOUT,
            "kurtosis enclave inspect",
        )
        .await
        .map_err(EnclaveError::CallFailed)?;
        Ok(output.status.success())
    }

    async fn inspect_service(
        &self,
        enclave: &str,
        service: &str,
    ) -> Result<ServiceInfo, EnclaveError> {
        let output = run_with_timeout(
            self.command(&["enclave", "inspect", enclave, "--full-uuids", "--output", "json"]),
            ENCLAVE_CALL_TIMEOUT,
            "kurtosis enclave inspect",
        )
        .await
        .map_err(EnclaveError::CallFailed)?;
        if !output.status.success() {
            return Err(EnclaveError::NotFound(enclave.to_string()));
        }
        let parsed: KurtosisInspect = serde_json::from_slice(&output.stdout).map_err(|e| {
            EnclaveError::CallFailed(format!("malformed inspect output for {enclave}: {e}"))
        })?;
        let found = parsed
            .services
            .get(service)
            .ok_or_else(|| EnclaveError::ServiceNotFound {
                enclave: enclave.to_string(),
                service: service.to_string(),
            })?;
        Ok(ServiceInfo {
            image: found.image.clone(),
            entrypoint: found.entrypoint.clone(),
            cmd: found.cmd.clone(),
            public_ports: found
                .ports
                .iter()
                .map(|(name, port)| (name.clone(), port.number))
                .collect(),
        })
    }

    async fn destroy(&self, enclave: &str) -> Result<(), EnclaveError> {
        let output = run_with_timeout(
            self.command(&["enclave", "rm", "-f", enclave]),
            ENCLAVE_CALL_TIMEOUT,
            "kurtosis enclave rm",
        )
        .await
        .map_err(EnclaveError::CallFailed)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(EnclaveError::NotFound(enclave.to_string()))
        }
    }

    async fn list(&self) -> Result<Vec<String>, EnclaveError> {
        let output = run_with_timeout(
            self.command(&["enclave", "ls", "--output", "json"]),
            ENCLAVE_CALL_TIMEOUT,
            "kurtosis enclave ls",
        )
        .await
        .map_err(EnclaveError::CallFailed)?;
        if !output.status.success() {
            return Err(EnclaveError::CallFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let listing: Vec<KurtosisEnclaveListing> = serde_json::from_slice(&output.stdout)
            .map_err(|e| EnclaveError::CallFailed(format!("malformed ls output: {e}")))?;
        Ok(listing.into_iter().map(|e| e.name).collect())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct FakeEnclaveManager {
    pub enclaves: parking_lot::Mutex<HashMap<String, HashMap<String, ServiceInfo>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeEnclaveManager {
    pub fn seed_service(&self, enclave: &str, service: &str, info: ServiceInfo) {
        self.enclaves
            .lock()
            .entry(enclave.to_string())
            .or_default()
            .insert(service.to_string(), info);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl EnclaveManager for FakeEnclaveManager {
    async fn run(&self, enclave: &str) -> Result<(), EnclaveError> {
        self.enclaves
            .lock()
            .entry(enclave.to_string())
            .or_default();
        Ok(())
    }

    async fn exists(&self, enclave: &str) -> Result<bool, EnclaveError> {
        Ok(self.enclaves.lock().contains_key(enclave))
    }

    async fn inspect_service(
        &self,
        enclave: &str,
        service: &str,
    ) -> Result<ServiceInfo, EnclaveError> {
        let enclaves = self.enclaves.lock();
        let services = enclaves
            .get(enclave)
            .ok_or_else(|| EnclaveError::NotFound(enclave.to_string()))?;
        services
            .get(service)
            .cloned()
            .ok_or_else(|| EnclaveError::ServiceNotFound {
                enclave: enclave.to_string(),
                service: service.to_string(),
            })
    }

    async fn destroy(&self, enclave: &str) -> Result<(), EnclaveError> {
        self.enclaves
            .lock()
            .remove(enclave)
            .ok_or_else(|| EnclaveError::NotFound(enclave.to_string()))?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, EnclaveError> {
        Ok(self.enclaves.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
#[path = "enclave_tests.rs"]
mod tests;
