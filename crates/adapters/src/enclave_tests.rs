use super::*;

#[tokio::test]
async fn run_is_idempotent() {
    let manager = FakeEnclaveManager::default();
    manager.run("sync-test-hoodi-geth-teku").await.unwrap();
    manager.run("sync-test-hoodi-geth-teku").await.unwrap();
    assert!(manager.exists("sync-test-hoodi-geth-teku").await.unwrap());
}

#[tokio::test]
async fn exists_false_for_unknown_enclave() {
    let manager = FakeEnclaveManager::default();
    assert!(!manager.exists("nope").await.unwrap());
}

#[tokio::test]
async fn inspect_service_returns_seeded_info() {
    let manager = FakeEnclaveManager::default();
    manager.run("enc-1").await.unwrap();
    manager.seed_service(
        "enc-1",
        "el",
        ServiceInfo {
            image: "geth:latest".into(),
            entrypoint: vec!["geth".into()],
            cmd: vec!["--http".into()],
            public_ports: HashMap::from([("rpc".into(), 8545)]),
        },
    );
    let info = manager.inspect_service("enc-1", "el").await.unwrap();
    assert_eq!(info.image, "geth:latest");
    assert_eq!(info.public_ports.get("rpc"), Some(&8545));
}

#[tokio::test]
async fn inspect_service_missing_enclave_errors() {
    let manager = FakeEnclaveManager::default();
    let err = manager.inspect_service("enc-1", "el").await.unwrap_err();
    assert!(matches!(err, EnclaveError::NotFound(_)));
}

#[tokio::test]
async fn inspect_service_missing_service_errors() {
    let manager = FakeEnclaveManager::default();
    manager.run("enc-1").await.unwrap();
    let err = manager.inspect_service("enc-1", "el").await.unwrap_err();
    assert!(matches!(err, EnclaveError::ServiceNotFound { .. }));
}

#[tokio::test]
async fn destroy_removes_enclave() {
    let manager = FakeEnclaveManager::default();
    manager.run("enc-1").await.unwrap();
    manager.destroy("enc-1").await.unwrap();
    assert!(!manager.exists("enc-1").await.unwrap());
}

#[tokio::test]
async fn destroy_unknown_enclave_errors() {
    let manager = FakeEnclaveManager::default();
    let err = manager.destroy("enc-1").await.unwrap_err();
    assert!(matches!(err, EnclaveError::NotFound(_)));
}

#[tokio::test]
async fn list_returns_all_known_enclaves() {
    let manager = FakeEnclaveManager::default();
    manager.run("enc-1").await.unwrap();
    manager.run("enc-2").await.unwrap();
    let mut enclaves = manager.list().await.unwrap();
    enclaves.sort();
    assert_eq!(enclaves, vec!["enc-1".to_string(), "enc-2".to_string()]);
}

#[test]
fn kurtosis_inspect_parses_service_image_and_ports() {
    let raw = r#"{"services":{"geth":{"image":"geth:latest","entrypoint":["geth"],"cmd":["--http"],"ports":{"rpc":{"number":8545}}}}}"#;
    let parsed: KurtosisInspect = serde_json::from_str(raw).unwrap();
    let geth = parsed.services.get("geth").unwrap();
    assert_eq!(geth.image, "geth:latest");
    assert_eq!(geth.ports.get("rpc").unwrap().number, 8545);
}

#[test]
fn kurtosis_enclave_listing_parses_name() {
    let raw = r#"[{"name":"sync-test-hoodi-geth-teku"}]"#;
    let parsed: Vec<KurtosisEnclaveListing> = serde_json::from_str(raw).unwrap();
    assert_eq!(parsed[0].name, "sync-test-hoodi-geth-teku");
}
