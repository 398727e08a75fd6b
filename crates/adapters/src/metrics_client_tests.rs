use super::*;
use httpmock::prelude::*;

const SAMPLE_BODY: &str = r#"{
    "exec": {
        "syncPercentage": 98.5,
        "currentBlock": 100,
        "highestBlock": 200,
        "blockNumber": 150,
        "peers": 12,
        "diskUsageBytes": 1048576,
        "chainId": 1
    },
    "cons": {
        "syncPercentage": 99.1,
        "headSlot": 9000,
        "highestSlot": 9100,
        "peers": 8,
        "diskUsageBytes": 2097152
    },
    "execVersion": "geth/v1.0.0",
    "consVersion": "teku/v1.0.0"
}"#;

#[tokio::test]
async fn fetch_decodes_exec_and_cons_halves() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/metrics");
        then.status(200).body(SAMPLE_BODY);
    });
    let client =
        HttpMetricsClient::with_default_client(server.url("/metrics"), Duration::from_secs(1));
    let record = client.fetch().await.unwrap();
    assert_eq!(record.block(), 150);
    assert_eq!(record.slot(), 9000);
    assert_eq!(record.exec.peers, 12);
    assert_eq!(record.cons.peers, 8);
    assert_eq!(record.exec.disk_usage_bytes, 1_048_576);
    assert_eq!(record.cons.disk_usage_bytes, 2_097_152);
    assert_eq!(record.exec_version.as_deref(), Some("geth/v1.0.0"));
}

#[tokio::test]
async fn fetch_prefers_sync_progress_current_block_when_higher() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/metrics");
        then.status(200).body(
            r#"{"exec":{"syncPercentage":0,"currentBlock":500,"highestBlock":600,"blockNumber":150,"peers":0,"diskUsageBytes":0,"chainId":1},"cons":{"syncPercentage":0,"headSlot":1,"highestSlot":1,"peers":0,"diskUsageBytes":0}}"#,
        );
    });
    let client =
        HttpMetricsClient::with_default_client(server.url("/metrics"), Duration::from_secs(1));
    let record = client.fetch().await.unwrap();
    assert_eq!(record.block(), 500);
}

#[tokio::test]
async fn fetch_errors_on_malformed_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/metrics");
        then.status(200).body("not json");
    });
    let client =
        HttpMetricsClient::with_default_client(server.url("/metrics"), Duration::from_secs(1));
    let err = client.fetch().await.unwrap_err();
    assert!(matches!(err, MetricsClientError::MalformedResponse { .. }));
}

#[tokio::test]
async fn fake_client_reports_seeded_record() {
    let fake = FakeMetricsClient::default();
    fake.set_record(MetricsRecord {
        exec: ExecMetrics {
            current_block: 10,
            block_number: 20,
            ..Default::default()
        },
        cons: ConsMetrics {
            head_slot: 30,
            ..Default::default()
        },
        ..Default::default()
    });
    let record = fake.fetch().await.unwrap();
    assert_eq!(record.block(), 20);
    assert_eq!(record.slot(), 30);
}
