use super::*;

#[tokio::test]
async fn start_then_inspect_reports_running() {
    let runtime = FakeContainerRuntime::default();
    runtime.start("el-1").await.unwrap();
    let status = runtime.inspect("el-1").await.unwrap();
    assert!(status.running);
    assert!(status.healthy);
    assert_eq!(status.exit_code, None);
}

#[tokio::test]
async fn stop_marks_not_running_with_exit_code() {
    let runtime = FakeContainerRuntime::default();
    runtime.start("el-1").await.unwrap();
    runtime.stop("el-1", false).await.unwrap();
    let status = runtime.inspect("el-1").await.unwrap();
    assert!(!status.running);
    assert_eq!(status.exit_code, Some(0));
}

#[tokio::test]
async fn inspect_unknown_container_errors() {
    let runtime = FakeContainerRuntime::default();
    let err = runtime.inspect("missing").await.unwrap_err();
    assert!(matches!(err, ContainerError::NotFound(_)));
}

#[tokio::test]
async fn pull_image_records_the_image() {
    let runtime = FakeContainerRuntime::default();
    runtime.pull_image("geth:latest").await.unwrap();
    assert_eq!(runtime.pulled_images.lock().as_slice(), ["geth:latest"]);
}

#[tokio::test]
async fn stream_logs_returns_none_without_seeded_lines() {
    let runtime = FakeContainerRuntime::default();
    let stream = runtime.stream_logs("el-1").await.unwrap();
    assert!(stream.is_none());
}

#[tokio::test]
async fn stream_logs_replays_seeded_lines_in_order() {
    let runtime = FakeContainerRuntime::default();
    runtime.set_log_lines("el-1", vec!["a".into(), "b".into()]);
    let mut rx = runtime.stream_logs("el-1").await.unwrap().unwrap();
    assert_eq!(rx.recv().await, Some("a".to_string()));
    assert_eq!(rx.recv().await, Some("b".to_string()));
    assert_eq!(rx.recv().await, None);
}

#[yare::parameterized(
    read_only = { "ro" },
    read_write = { "rw" },
)]
fn serialize_bind_mount_appends_ro_suffix_only_when_read_only(case: &str) {
    let read_only = case == "ro";
    let mount = serialize_bind_mount("/host/data", "/data", read_only);
    if read_only {
        assert_eq!(mount, "/host/data:/data:ro");
    } else {
        assert_eq!(mount, "/host/data:/data");
    }
}

#[test]
fn docker_state_parses_running_container() {
    let raw = r#"{"Running":true,"ExitCode":0,"Health":{"Status":"healthy"}}"#;
    let state: DockerState = serde_json::from_str(raw).unwrap();
    assert!(state.running);
    assert_eq!(state.health.unwrap().status, "healthy");
}

#[test]
fn docker_mount_parses_bind_and_volume_kinds() {
    let raw = r#"[
        {"Type":"bind","Source":"/host/data","Destination":"/data","RW":true,"Name":null},
        {"Type":"volume","Source":"","Destination":"/var/lib","RW":true,"Name":"geth-data"}
    ]"#;
    let mounts: Vec<DockerMount> = serde_json::from_str(raw).unwrap();
    assert_eq!(mounts[0].kind, "bind");
    assert_eq!(mounts[1].name.as_deref(), Some("geth-data"));
}
