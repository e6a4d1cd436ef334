//! Parent generation, backup and restore through the application context

mod common;

use common::{context, keypair};
use serde_json::json;
use sniperfi_bridge::{commands, MockBridge};
use sniperfi_core::{AppContext, Error, Lamports};
use sniperfi_vault::{BackupBlob, CipherAlgorithm};
use std::sync::Arc;

fn generating_bridge(seed: u8) -> (Arc<MockBridge>, String, String) {
    let (public_key, private_key) = keypair(seed);
    let bridge = Arc::new(MockBridge::new());
    bridge.on(
        commands::GENERATE,
        Ok(json!({"success": true, "public_key": public_key, "private_key": private_key})),
    );
    (bridge, public_key, private_key)
}

async fn with_parent(dir: &tempfile::TempDir, seed: u8) -> (AppContext, String, String) {
    let (bridge, public_key, private_key) = generating_bridge(seed);
    let ctx = context(dir, &bridge);
    let generated = ctx.service().generate_parent(None).await.unwrap();
    assert_eq!(generated.wallet.public_key, public_key);
    assert_eq!(generated.private_key.as_str(), private_key);
    (ctx, public_key, private_key)
}

#[tokio::test]
async fn test_generated_parent_is_persisted_sealed() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, public_key, private_key) = with_parent(&dir, 7).await;

    let record = ctx.store().load_parent().unwrap().unwrap();
    assert_eq!(record.public_key, public_key);
    assert!(!record.sealed_key.contains(&private_key));

    // A fresh context over the same directory picks the parent up without the engine
    let bridge = Arc::new(MockBridge::new());
    let reopened = context(&dir, &bridge);
    let parent = reopened.registry().get_parent().await.unwrap().unwrap();
    assert_eq!(parent.public_key, public_key);
    assert!(bridge.calls().is_empty());
}

#[tokio::test]
async fn test_password_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, public_key, private_key) = with_parent(&dir, 1).await;

    let path = ctx.backup().backup_to_file(Some("s3cret")).await.unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("wallet_backup_"));
    assert_eq!(ctx.backup().list_backups().unwrap(), vec![path.clone()]);

    // Restore into an empty installation
    let other = tempfile::tempdir().unwrap();
    let restored_ctx = context(&other, &Arc::new(MockBridge::new()));
    let wallet = restored_ctx
        .backup()
        .restore_from_file(&path, Some("s3cret"))
        .await
        .unwrap();
    assert_eq!(wallet.public_key, public_key);

    let (stored_key, material) = restored_ctx.store().parent_key_material().unwrap().unwrap();
    assert_eq!(stored_key, public_key);
    assert_eq!(bs58::encode(&material[..]).into_string(), private_key);
    assert!(restored_ctx.store().load_parent().unwrap().unwrap().restored_at.is_some());

    let parent = restored_ctx.registry().get_parent().await.unwrap().unwrap();
    assert_eq!(parent.public_key, public_key);
}

#[tokio::test]
async fn test_wrong_password_and_missing_password() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _, _) = with_parent(&dir, 2).await;
    let blob = ctx.backup().backup(Some("right")).await.unwrap();
    assert_eq!(blob.cipher_algorithm, CipherAlgorithm::Aes256Gcm);

    assert!(matches!(
        ctx.backup().restore(&blob, Some("wrong")).await,
        Err(Error::DecryptionFailed)
    ));
    assert!(matches!(
        ctx.backup().restore(&blob, None).await,
        Err(Error::PasswordRequired)
    ));
}

#[tokio::test]
async fn test_unencrypted_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, public_key, _) = with_parent(&dir, 3).await;

    let blob = ctx.backup().backup(None).await.unwrap();
    assert_eq!(blob.cipher_algorithm, CipherAlgorithm::Unencrypted);
    assert!(!blob.is_encrypted());

    let json = blob.to_json().unwrap();
    let parsed = BackupBlob::from_json(&json).unwrap();
    let wallet = ctx.backup().restore(&parsed, None).await.unwrap();
    assert_eq!(wallet.public_key, public_key);
}

#[tokio::test]
async fn test_restore_replaces_parent() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, first_key, _) = with_parent(&dir, 4).await;

    let other = tempfile::tempdir().unwrap();
    let (other_ctx, second_key, _) = with_parent(&other, 5).await;
    let blob = other_ctx.backup().backup(Some("pw")).await.unwrap();

    ctx.backup().restore(&blob, Some("pw")).await.unwrap();
    let parent = ctx.registry().get_parent().await.unwrap().unwrap();
    assert_ne!(parent.public_key, first_key);
    assert_eq!(parent.public_key, second_key);
}

#[tokio::test]
async fn test_backup_without_parent() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = Arc::new(MockBridge::new());
    bridge.on(commands::INFO, Ok(json!({"public_key": null})));
    let ctx = context(&dir, &bridge);

    assert!(matches!(ctx.backup().backup(Some("pw")).await, Err(Error::NoParent)));
}

#[tokio::test]
async fn test_backup_without_key_material() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = Arc::new(MockBridge::new());
    bridge.on(commands::INFO, Ok(json!({"public_key": "EngineOnlyParent"})));
    let ctx = context(&dir, &bridge);

    assert!(matches!(
        ctx.backup().backup(None).await,
        Err(Error::MissingKeyMaterial(_))
    ));
}

#[tokio::test]
async fn test_corrupt_backup_file() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir, &Arc::new(MockBridge::new()));
    let path = ctx.store().backup_dir().join("wallet_backup_1.json");
    std::fs::write(&path, "{\"version\": 1}").unwrap();

    assert!(matches!(
        ctx.backup().restore_from_file(&path, Some("pw")).await,
        Err(Error::CorruptBackup(_))
    ));
}

#[tokio::test]
async fn test_distribution_after_restore_names_restored_parent() {
    let dir = tempfile::tempdir().unwrap();
    let (bridge, first_key, _) = generating_bridge(8);
    bridge
        .on(
            commands::LIST,
            Ok(json!({"success": true, "wallets": [{"public_key": "A"}, {"public_key": "B"}]})),
        )
        .on(commands::TRANSFER, Ok(json!({"success": true, "signature": "sig"})));
    let ctx = context(&dir, &bridge);
    ctx.service().generate_parent(None).await.unwrap();

    let other = tempfile::tempdir().unwrap();
    let (other_ctx, restored_key, _) = with_parent(&other, 9).await;
    let blob = other_ctx.backup().backup(Some("pw")).await.unwrap();
    ctx.backup().restore(&blob, Some("pw")).await.unwrap();

    let batch = ctx.distribution().distribute(Lamports(1_000)).await.unwrap();
    assert_eq!(batch.source.as_deref(), Some(restored_key.as_str()));

    let senders: Vec<String> = bridge
        .calls()
        .into_iter()
        .filter(|c| c.command == commands::TRANSFER)
        .map(|c| c.args[0].clone())
        .collect();
    assert_eq!(senders, vec![restored_key.clone(), restored_key]);
    assert!(!senders.contains(&first_key));
}
