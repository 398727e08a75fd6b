use super::*;
use std::collections::HashMap;
use std::path::PathBuf;
use syncoor_adapters::{
    ClSyncState, ConsMetrics, ContainerStatus, ExecMetrics, FakeClClient, FakeContainerRuntime,
    FakeElClient, FakeEnclaveManager, FakeMetricsClient, MetricsRecord, ServiceInfo,
};
use syncoor_core::{FakeClock, RunContextConfig, RunId};
use tempfile::tempdir;

fn running_status() -> ContainerStatus {
    ContainerStatus {
        running: true,
        healthy: true,
        exit_code: None,
    }
}

struct Harness {
    orchestrator: SyncOrchestrator,
    el: Arc<FakeElClient>,
    cl: Arc<FakeClClient>,
    metrics: Arc<FakeMetricsClient>,
    container_runtime: Arc<FakeContainerRuntime>,
}

fn build_harness(report_dir: PathBuf, run_timeout: Option<Duration>) -> Harness {
    let ctx = RunContext::new(RunContextConfig {
        run_id: RunId::new("run-1"),
        network: "hoodi".to_string(),
        el_type: "geth".to_string(),
        cl_type: "teku".to_string(),
        el_image: None,
        cl_image: None,
        el_extra_args: vec![],
        cl_extra_args: vec![],
        el_env: HashMap::new(),
        cl_env: HashMap::new(),
        labels: HashMap::new(),
        run_timeout,
        report_dir: report_dir.clone(),
        check_interval: Duration::from_millis(10),
    });

    let enclave_mgr = Arc::new(FakeEnclaveManager::default());
    enclave_mgr.seed_service(&ctx.enclave_name, "geth", ServiceInfo::default());
    enclave_mgr.seed_service(&ctx.enclave_name, "teku", ServiceInfo::default());

    let container_runtime = Arc::new(FakeContainerRuntime::default());
    container_runtime.set_status("geth", running_status());
    container_runtime.set_status("teku", running_status());

    let el = Arc::new(FakeElClient::default());
    let cl = Arc::new(FakeClClient::default());
    let metrics = Arc::new(FakeMetricsClient::default());
    metrics.set_record(MetricsRecord {
        exec: ExecMetrics {
            disk_usage_bytes: 10,
            ..Default::default()
        },
        cons: ConsMetrics {
            disk_usage_bytes: 20,
            ..Default::default()
        },
        ..Default::default()
    });

    let clock = Arc::new(FakeClock::new(chrono::Utc::now()));
    let report_store = Arc::new(ReportStore::new(report_dir));

    let deps = OrchestratorDeps {
        enclave_mgr: enclave_mgr.clone(),
        container_runtime: container_runtime.clone(),
        el_client: el.clone(),
        cl_client: cl.clone(),
        metrics_client: metrics.clone(),
        report_store,
        reporting_client: None,
        clock: clock.clone(),
        recovery_enabled: false,
    };

    Harness {
        orchestrator: SyncOrchestrator::new(ctx, deps),
        el,
        cl,
        metrics,
        container_runtime,
    }
}

#[tokio::test(start_paused = true)]
async fn wait_for_sync_succeeds_once_both_layers_report_synced() {
    let dir = tempdir().unwrap();
    let harness = build_harness(dir.path().to_path_buf(), None);
    harness.el.set_syncing(ElSyncState::NotSyncing);
    harness.cl.set_syncing(ClSyncState {
        head_slot: 50,
        sync_distance: 0,
        is_syncing: false,
        is_optimistic: false,
    });
    harness.metrics.set_record(MetricsRecord {
        exec: ExecMetrics {
            block_number: 100,
            ..Default::default()
        },
        cons: ConsMetrics {
            head_slot: 50,
            ..Default::default()
        },
        ..Default::default()
    });

    harness.orchestrator.start().await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), harness.orchestrator.wait_for_sync())
        .await
        .expect("wait_for_sync did not finish in time");
    assert!(result.is_ok());

    let main_path = dir.path().join("run-1-hoodi_geth_teku.main.json");
    assert!(main_path.exists());
}

#[tokio::test(start_paused = true)]
async fn wait_for_sync_times_out_when_never_synced() {
    let dir = tempdir().unwrap();
    let harness = build_harness(dir.path().to_path_buf(), Some(Duration::from_millis(50)));
    harness.el.set_syncing(ElSyncState::Syncing {
        current_block: 10,
        highest_block: 1000,
    });
    harness.cl.set_syncing(ClSyncState {
        head_slot: 5,
        sync_distance: 100,
        is_syncing: true,
        is_optimistic: true,
    });

    harness.orchestrator.start().await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), harness.orchestrator.wait_for_sync())
        .await
        .expect("wait_for_sync did not finish in time");
    assert!(matches!(result, Err(OrchestratorError::Timeout { .. })));
}

#[tokio::test(start_paused = true)]
async fn wait_for_sync_reports_container_crash() {
    let dir = tempdir().unwrap();
    let harness = build_harness(dir.path().to_path_buf(), None);
    harness.el.set_syncing(ElSyncState::Syncing {
        current_block: 10,
        highest_block: 1000,
    });

    harness.orchestrator.start().await.unwrap();
    harness.container_runtime.set_status(
        "geth",
        ContainerStatus {
            running: false,
            healthy: false,
            exit_code: Some(137),
        },
    );

    let result = tokio::time::timeout(Duration::from_secs(5), harness.orchestrator.wait_for_sync())
        .await
        .expect("wait_for_sync did not finish in time");
    assert!(matches!(
        result,
        Err(OrchestratorError::ContainerCrashed { exit_code: Some(137), .. })
    ));
}
