//! Process bridge against throwaway shell engines

#![cfg(unix)]

use serde_json::json;
use sniperfi_bridge::{commands, BridgeConfig, EngineBinary, Error, ExecutionBridge, ProcessBridge};
use std::time::Duration;

/// Bridge whose engine is `sh -c <script>`; the command lands in `$0`
fn shell_bridge(script: &str, timeout: Duration) -> ProcessBridge {
    ProcessBridge::new(BridgeConfig {
        binary: EngineBinary::new("sh").with_leading_args(["-c", script]),
        request_timeout: timeout,
        rpc_endpoint: "http://127.0.0.1:8899".to_string(),
        wallet_dir: std::env::temp_dir(),
    })
}

#[tokio::test]
async fn test_single_document_success() {
    let bridge = shell_bridge(
        r#"echo "{\"success\": true, \"command\": \"$0\", \"arg\": \"$1\"}""#,
        Duration::from_secs(10),
    );
    let value = bridge.invoke("balance", &["abc".to_string()]).await.unwrap();
    assert_eq!(value["command"], json!("balance"));
    assert_eq!(value["arg"], json!("abc"));
}

#[tokio::test]
async fn test_environment_carries_rpc_endpoint() {
    let bridge = shell_bridge(
        r#"echo "{\"rpc\": \"$SNIPERFI_RPC_URL\"}""#,
        Duration::from_secs(10),
    );
    let value = bridge.invoke("info", &[]).await.unwrap();
    assert_eq!(value["rpc"], json!("http://127.0.0.1:8899"));

    commands::set_rpc(&bridge, "http://localhost:9999")
        .await
        .unwrap();
    let value = bridge.invoke("info", &[]).await.unwrap();
    assert_eq!(value["rpc"], json!("http://localhost:9999"));
}

#[tokio::test]
async fn test_zero_documents_is_protocol_error() {
    let bridge = shell_bridge("true", Duration::from_secs(10));
    let err = bridge.invoke("info", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "{:?}", err);
}

#[tokio::test]
async fn test_two_documents_is_protocol_error() {
    let bridge = shell_bridge(r#"echo '{"a":1}'; echo '{"b":2}'"#, Duration::from_secs(10));
    let err = bridge.invoke("info", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "{:?}", err);
}

#[tokio::test]
async fn test_non_json_is_protocol_error() {
    let bridge = shell_bridge("echo 'Traceback: oops'", Duration::from_secs(10));
    let err = bridge.invoke("info", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "{:?}", err);
}

#[tokio::test]
async fn test_failure_envelope_is_process_error() {
    let bridge = shell_bridge(
        r#"echo '{"success": false, "error": {"type": "RPCError", "message": "node unhealthy"}}'"#,
        Duration::from_secs(10),
    );
    let err = bridge.invoke("balance", &[]).await.unwrap_err();
    match err {
        Error::Process(message) => assert!(message.contains("node unhealthy")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_zero_exit_is_process_error() {
    let bridge = shell_bridge("echo 'fatal' >&2; exit 3", Duration::from_secs(10));
    let err = bridge.invoke("info", &[]).await.unwrap_err();
    match err {
        Error::Process(message) => assert!(message.contains("fatal")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_deadline_is_timeout_error() {
    let bridge = shell_bridge("sleep 5; echo '{}'", Duration::from_millis(200));
    let started = std::time::Instant::now();
    let err = bridge.invoke("list", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { ref command, .. } if command == "list"));
    assert!(started.elapsed() < Duration::from_secs(4));
}
