//! Backup blob tests: round trips through the store and corrupt inputs

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sniperfi_vault::{BackupBlob, BackupOptions, CipherAlgorithm, Error, SecretStore};

fn keypair() -> (String, Vec<u8>) {
    let mut bytes: Vec<u8> = (0u8..32).collect();
    bytes.extend((100u8..132).collect::<Vec<_>>());
    (bs58::encode(&bytes[32..]).into_string(), bytes)
}

fn options() -> BackupOptions {
    BackupOptions {
        iterations: 2_000,
        ..Default::default()
    }
}

fn encrypted_blob() -> (Vec<u8>, BackupBlob) {
    let (public_key, material) = keypair();
    let blob = BackupBlob::create(&public_key, &material, Some("correct horse"), &options()).unwrap();
    (material, blob)
}

#[test]
fn test_file_round_trip_with_password() {
    let dir = tempfile::tempdir().unwrap();
    let store = SecretStore::open(dir.path().join("w"), dir.path().join("w/backups")).unwrap();
    let (material, blob) = encrypted_blob();

    let path = store.write_backup(&blob).unwrap();
    let read = store.read_backup(&path).unwrap();

    assert_eq!(&read.open(Some("correct horse")).unwrap()[..], &material[..]);
    assert!(matches!(read.open(Some("wrong")), Err(Error::DecryptionFailed)));
    assert!(matches!(read.open(None), Err(Error::PasswordRequired)));
}

#[test]
fn test_default_parameters() {
    let (public_key, material) = keypair();
    let blob = BackupBlob::create(&public_key, &material, Some("pw"), &BackupOptions::default()).unwrap();
    assert_eq!(blob.iterations, 100_000);
    assert_eq!(BASE64.decode(blob.salt.unwrap()).unwrap().len(), 16);
    assert_eq!(blob.cipher_algorithm, CipherAlgorithm::Aes256Gcm);
}

#[test]
fn test_unknown_algorithm_is_corrupt() {
    let (_, blob) = encrypted_blob();
    let json = blob.to_json().unwrap().replace("aes-256-gcm", "rot13");
    assert!(matches!(BackupBlob::from_json(&json), Err(Error::CorruptBackup(_))));
}

#[test]
fn test_not_json_is_corrupt() {
    assert!(matches!(
        BackupBlob::from_json("definitely not a backup"),
        Err(Error::CorruptBackup(_))
    ));
}

#[test]
fn test_bad_base64_is_corrupt() {
    let (_, mut blob) = encrypted_blob();
    blob.ciphertext = "%%%".to_string();
    assert!(matches!(blob.open(Some("correct horse")), Err(Error::CorruptBackup(_))));
}

#[test]
fn test_missing_salt_is_corrupt() {
    let (_, mut blob) = encrypted_blob();
    blob.salt = None;
    assert!(matches!(blob.open(Some("correct horse")), Err(Error::CorruptBackup(_))));
}

#[test]
fn test_zero_iterations_is_corrupt() {
    let (_, mut blob) = encrypted_blob();
    blob.iterations = 0;
    assert!(matches!(blob.open(Some("correct horse")), Err(Error::CorruptBackup(_))));
}

#[test]
fn test_excessive_iterations_are_corrupt() {
    let (_, mut blob) = encrypted_blob();
    blob.iterations = u32::MAX;
    assert!(matches!(blob.open(Some("correct horse")), Err(Error::CorruptBackup(_))));
}

#[test]
fn test_truncated_ciphertext_is_corrupt() {
    let (_, mut blob) = encrypted_blob();
    let raw = BASE64.decode(&blob.ciphertext).unwrap();
    blob.ciphertext = BASE64.encode(&raw[..8]);
    assert!(matches!(blob.open(Some("correct horse")), Err(Error::CorruptBackup(_))));
}

#[test]
fn test_tampered_ciphertext_fails_decryption() {
    let (_, mut blob) = encrypted_blob();
    let mut raw = BASE64.decode(&blob.ciphertext).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    blob.ciphertext = BASE64.encode(&raw);
    assert!(matches!(blob.open(Some("correct horse")), Err(Error::DecryptionFailed)));
}

#[test]
fn test_unsupported_version_is_corrupt() {
    let (_, mut blob) = encrypted_blob();
    blob.version = 99;
    assert!(matches!(blob.open(Some("correct horse")), Err(Error::CorruptBackup(_))));
}
