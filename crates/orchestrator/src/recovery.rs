// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery subsystem: decide whether an existing enclave can be adopted
//! instead of provisioning a fresh one.

use std::collections::HashSet;
use syncoor_adapters::{EnclaveError, EnclaveManager, ServiceInfo};
use syncoor_core::RunContext;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error(transparent)]
    Enclave(#[from] EnclaveError),
    #[error("enclave {enclave} is missing required service {service}")]
    ServiceMissing { enclave: String, service: String },
    #[error("existing enclave {0}'s service configuration does not match the requested run")]
    ConfigMismatch(String),
}

/// Points at an enclave the caller believes can be adopted; produced by
/// [`check_recoverable`] and consumed by [`validate_enclave`].
#[derive(Debug, Clone)]
pub struct RecoveryState {
    pub enclave_name: String,
}

/// `sync-test-<network>-<el>-<cl>` — lossy if any segment itself contains
/// a `-`. Provided for introspection/listing tooling; the live recovery path
/// below never needs to parse a name back into its parts, since it already
/// holds the `RunContext` the name was derived from.
pub fn parse_enclave_name(name: &str) -> Option<(String, String, String)> {
    let re = regex::Regex::new(r"^sync-test-([^-]+)-([^-]+)-(.+)$").ok()?;
    let caps = re.captures(name)?;
    Some((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()))
}

/// Ask the enclave manager whether `ctx.enclave_name` already exists.
/// `Ok(None)` means no adoption candidate; provision a fresh enclave.
pub async fn check_recoverable(
    enclave_mgr: &dyn EnclaveManager,
    ctx: &RunContext,
) -> Result<Option<RecoveryState>, RecoveryError> {
    if enclave_mgr.exists(&ctx.enclave_name).await? {
        Ok(Some(RecoveryState {
            enclave_name: ctx.enclave_name.clone(),
        }))
    } else {
        Ok(None)
    }
}

fn service_compatible(desired_image: Option<&str>, desired_extra_args: &[String], existing: &ServiceInfo) -> bool {
    if let Some(image) = desired_image {
        if existing.image != image {
            return false;
        }
    }
    let existing_args: HashSet<&str> = existing.cmd.iter().map(|arg| arg.trim()).collect();
    desired_extra_args
        .iter()
        .all(|arg| existing_args.contains(arg.trim()))
}

/// Verify that the EL, CL, and metrics-exporter services of `state.enclave_name`
/// all respond to inspection and that EL/CL images and extra args are
/// compatible with what `ctx` requests. Returns the three inspected
/// [`ServiceInfo`] records (EL, CL, metrics exporter) for the caller to fold
/// into the report's client-info fields.
pub async fn validate_enclave(
    enclave_mgr: &dyn EnclaveManager,
    state: &RecoveryState,
    ctx: &RunContext,
) -> Result<(ServiceInfo, ServiceInfo, ServiceInfo), RecoveryError> {
    let el = inspect_required(enclave_mgr, &state.enclave_name, &ctx.el_type).await?;
    let cl = inspect_required(enclave_mgr, &state.enclave_name, &ctx.cl_type).await?;
    let metrics_service = ctx.metrics_exporter_service();
    let metrics = inspect_required(enclave_mgr, &state.enclave_name, &metrics_service).await?;

    if !service_compatible(ctx.el_image.as_deref(), &ctx.el_extra_args, &el) {
        return Err(RecoveryError::ConfigMismatch(state.enclave_name.clone()));
    }
    if !service_compatible(ctx.cl_image.as_deref(), &ctx.cl_extra_args, &cl) {
        return Err(RecoveryError::ConfigMismatch(state.enclave_name.clone()));
    }
    Ok((el, cl, metrics))
}

async fn inspect_required(
    enclave_mgr: &dyn EnclaveManager,
    enclave: &str,
    service: &str,
) -> Result<ServiceInfo, RecoveryError> {
    enclave_mgr
        .inspect_service(enclave, service)
        .await
        .map_err(|_| RecoveryError::ServiceMissing {
            enclave: enclave.to_string(),
            service: service.to_string(),
        })
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
