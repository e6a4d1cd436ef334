//! Application context over a real engine process sharing the wallet directory

#![cfg(unix)]

mod common;

use common::{config, keypair};
use sniperfi_bridge::EngineBinary;
use sniperfi_core::{AppContext, FleetConfig};

/// Engine that keeps its own `parent_wallet.json` next to the store, the
/// way the Python engine does
fn engine_config(dir: &tempfile::TempDir, public_key: &str, private_key: &str) -> FleetConfig {
    let script = format!(
        r#"case "$0" in
  generate)
    printf '{{"public_key": "{pk}", "private_key": "{sk}"}}' > "$SNIPERFI_WALLET_DIR/parent_wallet.json"
    echo '{{"success": true, "public_key": "{pk}", "private_key": "{sk}"}}' ;;
  info)
    echo '{{"public_key": "{pk}"}}' ;;
  *)
    echo '{{"success": false, "error": "unsupported"}}' ;;
esac"#,
        pk = public_key,
        sk = private_key
    );
    FleetConfig {
        engine: EngineBinary::new("sh").with_leading_args(["-c".to_string(), script]),
        ..config(dir)
    }
}

#[tokio::test]
async fn test_generate_alongside_engine_parent_file() {
    let dir = tempfile::tempdir().unwrap();
    let (public_key, private_key) = keypair(11);
    let config = engine_config(&dir, &public_key, &private_key);
    let engine_file = config.wallet_dir.join("parent_wallet.json");
    let ctx = AppContext::new(config).unwrap();

    let generated = ctx.service().generate_parent(None).await.unwrap();
    assert_eq!(generated.wallet.public_key, public_key);
    assert!(engine_file.exists());

    let record = ctx.store().load_parent().unwrap().unwrap();
    assert_eq!(record.public_key, public_key);
}

#[tokio::test]
async fn test_startup_with_engine_parent_file() {
    let dir = tempfile::tempdir().unwrap();
    let (public_key, private_key) = keypair(12);
    let config = engine_config(&dir, &public_key, &private_key);
    std::fs::create_dir_all(&config.wallet_dir).unwrap();
    std::fs::write(
        config.wallet_dir.join("parent_wallet.json"),
        format!(r#"{{"public_key": "{}", "private_key": "{}"}}"#, public_key, private_key),
    )
    .unwrap();

    let ctx = AppContext::new(config).unwrap();
    assert!(ctx.store().load_parent().unwrap().is_none());

    let parent = ctx.registry().get_parent().await.unwrap().unwrap();
    assert_eq!(parent.public_key, public_key);
}
