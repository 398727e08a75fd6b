// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `syncoor`: run a single Ethereum node sync-benchmark and exit with a
//! status reflecting the outcome (0 success, 1 timeout, 2 error).

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use syncoor_adapters::{
    CliContainerRuntime, HttpClClient, HttpElClient, HttpMetricsClient, KurtosisEnclaveManager,
};
use syncoor_core::{RunContext, RunContextConfig, RunId, SystemClock};
use syncoor_orchestrator::{OrchestratorDeps, OrchestratorError, SyncOrchestrator};
use syncoor_report::ReportStore;
use syncoor_reportclient::ReportingClient;

/// Execution/consensus RPC timeout for every adapter HTTP call.
const ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "syncoor", about = "Run a single execution/consensus sync benchmark")]
struct RunArgs {
    #[arg(long)]
    network: String,

    #[arg(long)]
    el: String,

    #[arg(long)]
    cl: String,

    #[arg(long)]
    el_image: Option<String>,

    #[arg(long)]
    cl_image: Option<String>,

    #[arg(long = "el-extra-arg")]
    el_extra_arg: Vec<String>,

    #[arg(long = "cl-extra-arg")]
    cl_extra_arg: Vec<String>,

    /// `key=value`, may be repeated.
    #[arg(long = "label")]
    label: Vec<String>,

    /// Seconds; no deadline if omitted.
    #[arg(long = "run-timeout")]
    run_timeout: Option<u64>,

    #[arg(long = "check-interval", default_value_t = 30)]
    check_interval: u64,

    #[arg(long = "report-dir", default_value = "./reports")]
    report_dir: PathBuf,

    #[arg(long = "coordinator-url")]
    coordinator_url: Option<String>,

    #[arg(long = "coordinator-token", env = "SYNCOOR_COORDINATOR_TOKEN")]
    coordinator_token: Option<String>,

    /// Adopt a matching pre-existing enclave instead of always provisioning.
    #[arg(long = "recover", default_value_t = false)]
    recover: bool,

    #[arg(long = "container-runtime-bin", default_value = "docker")]
    container_runtime_bin: String,

    #[arg(long = "kurtosis-bin", default_value = "kurtosis")]
    kurtosis_bin: String,
}

fn parse_labels(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut labels = HashMap::new();
    for item in raw {
        let (key, value) = item
            .split_once('=')
            .with_context(|| format!("label {item:?} is not in key=value form"))?;
        labels.insert(key.to_string(), value.to_string());
    }
    Ok(labels)
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = RunArgs::parse();
    match run(args).await {
        RunOutcome::Success => std::process::exit(0),
        RunOutcome::Timeout => std::process::exit(1),
        RunOutcome::Error(err) => {
            tracing::error!(error = %err, "run failed");
            std::process::exit(2)
        }
    }
}

enum RunOutcome {
    Success,
    Timeout,
    Error(anyhow::Error),
}

async fn run(args: RunArgs) -> RunOutcome {
    match run_inner(args).await {
        Ok(RunOutcome::Success) => RunOutcome::Success,
        Ok(RunOutcome::Timeout) => RunOutcome::Timeout,
        Ok(RunOutcome::Error(err)) => RunOutcome::Error(err),
        Err(err) => RunOutcome::Error(err),
    }
}

async fn run_inner(args: RunArgs) -> Result<RunOutcome> {
    let run_id = RunId::new(uuid::Uuid::new_v4().to_string());
    let labels = parse_labels(&args.label)?;

    let ctx = RunContext::new(RunContextConfig {
        run_id: run_id.clone(),
        network: args.network.clone(),
        el_type: args.el.clone(),
        cl_type: args.cl.clone(),
        el_image: args.el_image.clone(),
        cl_image: args.cl_image.clone(),
        el_extra_args: args.el_extra_arg.clone(),
        cl_extra_args: args.cl_extra_arg.clone(),
        el_env: HashMap::new(),
        cl_env: HashMap::new(),
        labels,
        run_timeout: args.run_timeout.map(Duration::from_secs),
        report_dir: args.report_dir.clone(),
        check_interval: Duration::from_secs(args.check_interval),
    });

    let enclave_mgr = Arc::new(KurtosisEnclaveManager::new(args.kurtosis_bin.clone()));
    enclave_mgr
        .run(&ctx.enclave_name)
        .await
        .context("provisioning enclave")?;
    let el_service = enclave_mgr
        .inspect_service(&ctx.enclave_name, &ctx.el_type)
        .await
        .context("inspecting execution-layer service")?;
    let cl_service = enclave_mgr
        .inspect_service(&ctx.enclave_name, &ctx.cl_type)
        .await
        .context("inspecting consensus-layer service")?;
    let metrics_service = enclave_mgr
        .inspect_service(&ctx.enclave_name, &ctx.metrics_exporter_service())
        .await
        .context("inspecting metrics-exporter service")?;

    let el_port = *el_service
        .public_ports
        .get("rpc")
        .context("execution-layer service has no rpc port")?;
    let cl_port = *cl_service
        .public_ports
        .get("http")
        .context("consensus-layer service has no http port")?;
    let metrics_port = *metrics_service
        .public_ports
        .get("metrics")
        .context("metrics-exporter service has no metrics port")?;

    let el_client = Arc::new(HttpElClient::with_default_client(
        format!("http://localhost:{el_port}"),
        ADAPTER_TIMEOUT,
    ));
    let cl_client = Arc::new(HttpClClient::with_default_client(
        format!("http://localhost:{cl_port}"),
        ADAPTER_TIMEOUT,
    ));
    let metrics_client = Arc::new(HttpMetricsClient::with_default_client(
        format!("http://localhost:{metrics_port}"),
        ADAPTER_TIMEOUT,
    ));
    let container_runtime = Arc::new(CliContainerRuntime::new(args.container_runtime_bin.clone()));

    let reporting_client = match &args.coordinator_url {
        Some(url) => {
            let http = reqwest::Client::builder()
                .timeout(ADAPTER_TIMEOUT)
                .build()
                .context("building coordinator HTTP client")?;
            Some(Arc::new(ReportingClient::new(
                http,
                url.clone(),
                args.coordinator_token.clone(),
            )))
        }
        None => None,
    };

    let deps = OrchestratorDeps {
        enclave_mgr,
        container_runtime,
        el_client,
        cl_client,
        metrics_client,
        report_store: Arc::new(ReportStore::new(args.report_dir.clone())),
        reporting_client,
        clock: Arc::new(SystemClock),
        recovery_enabled: args.recover,
    };

    let orchestrator = SyncOrchestrator::new(ctx, deps);
    orchestrator.start().await.context("starting run")?;

    match orchestrator.wait_for_sync().await {
        Ok(()) => {
            tracing::info!(%run_id, "sync completed successfully");
            Ok(RunOutcome::Success)
        }
        Err(OrchestratorError::Timeout { elapsed_secs }) => {
            tracing::warn!(%run_id, elapsed_secs, "sync run timed out");
            Ok(RunOutcome::Timeout)
        }
        Err(err) => Err(anyhow::Error::new(err).context("sync run failed")),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("SYNCOOR_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
