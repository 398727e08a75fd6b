use super::*;
use std::collections::HashMap;

fn config() -> RunContextConfig {
    RunContextConfig {
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
        run_timeout: None,
        report_dir: PathBuf::from("/tmp/reports"),
        check_interval: Duration::from_secs(30),
    }
}

#[test]
fn enclave_name_follows_sync_test_naming_convention() {
    assert_eq!(enclave_name("hoodi", "geth", "teku"), "sync-test-hoodi-geth-teku");
}

#[test]
fn run_context_derives_enclave_name_from_config() {
    let ctx = RunContext::new(config());
    assert_eq!(ctx.enclave_name, "sync-test-hoodi-geth-teku");
}

#[test]
fn metrics_exporter_service_name_is_deterministic() {
    let ctx = RunContext::new(config());
    assert_eq!(
        ctx.metrics_exporter_service(),
        "ethereum-metrics-exporter-1-teku-geth"
    );
}

#[test]
fn report_base_joins_network_el_cl_with_underscores() {
    let ctx = RunContext::new(config());
    assert_eq!(ctx.report_base(), "hoodi_geth_teku");
}
