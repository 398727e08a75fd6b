use super::*;
use crate::store::StoreConfig;
use syncoor_core::{ClientInfo, FakeClock, Keepalive};

fn sample_keepalive(run_id: &str) -> Keepalive {
    Keepalive {
        run_id: syncoor_core::RunId::new(run_id),
        network: "hoodi".to_string(),
        labels: Default::default(),
        enclave_name: "sync-test-hoodi-geth-teku".to_string(),
        execution_client_info: ClientInfo::default(),
        consensus_client_info: ClientInfo::default(),
        system_info: None,
    }
}

#[test]
fn run_tick_orphans_then_evicts_stale_tests_across_two_ticks() {
    let clock = Arc::new(FakeClock::new(chrono::Utc::now()));
    let store = Arc::new(CoordinatorStore::new(StoreConfig::default(), clock.clone()));
    store.create_test(sample_keepalive("run-1")).unwrap();

    clock.advance(chrono::Duration::minutes(11).to_std().unwrap());
    run_tick(&store);
    assert!(!store.get(&syncoor_core::RunId::new("run-1")).unwrap().is_running);

    clock.advance(chrono::Duration::minutes(10).to_std().unwrap());
    run_tick(&store);
    assert!(store.get(&syncoor_core::RunId::new("run-1")).is_err());
}
