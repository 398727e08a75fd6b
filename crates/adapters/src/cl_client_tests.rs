use super::*;
use httpmock::prelude::*;

#[tokio::test]
async fn syncing_parses_stringly_typed_slots() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/eth/v1/node/syncing");
        then.status(200).json_body(serde_json::json!({
            "data": {
                "head_slot": "100",
                "sync_distance": "5",
                "is_syncing": true,
                "is_optimistic": false
            }
        }));
    });
    let client = HttpClClient::with_default_client(server.base_url(), Duration::from_secs(1));
    let state = client.syncing().await.unwrap();
    assert_eq!(
        state,
        ClSyncState {
            head_slot: 100,
            sync_distance: 5,
            is_syncing: true,
            is_optimistic: false,
        }
    );
}

#[tokio::test]
async fn fake_client_reports_seeded_values() {
    let fake = FakeClClient::default();
    fake.set_syncing(ClSyncState {
        head_slot: 42,
        sync_distance: 0,
        is_syncing: false,
        is_optimistic: false,
    });
    assert_eq!(client_head_slot(&fake).await, 42);
}

async fn client_head_slot(client: &impl ClClient) -> u64 {
    client.syncing().await.unwrap().head_slot
}
