// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Encrypted on-disk store.
//!
//! The store is one JSON document mapping entry names to sealed values.
//! Each value is sealed with AES-256-GCM using the entry name as associated
//! data, so a ciphertext copied under another name fails to open.
//! Layout of a sealed value: base64(nonce || ciphertext || tag).
//!
//! Writes replace the whole document through a temp file and a rename, so a
//! crash mid-write leaves either the old or the new document.

use super::{SecureStore, StoreError, StoreKey};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Length of the AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

const STORE_FILE: &str = "session.json";
const KEY_FILE: &str = "session.key";

/// File-backed, encrypted [`SecureStore`].
pub struct FileStore {
    path: PathBuf,
    key: LessSafeKey,
    rng: SystemRandom,
    /// Serializes read-modify-write cycles on the document.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) the store at `dir/session.json`.
    pub fn open(dir: impl AsRef<Path>, key: &[u8]) -> Result<Self, StoreError> {
        let unbound = UnboundKey::new(&AES_256_GCM, key).map_err(|_| {
            StoreError::Unavailable(format!("store key must be {} bytes", KEY_LEN))
        })?;

        Ok(Self {
            path: dir.as_ref().join(STORE_FILE),
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
            write_lock: Mutex::new(()),
        })
    }

    /// Open the store using `key` if given, otherwise the key file kept next
    /// to the store (generated on first use).
    pub async fn open_with_key_file(
        dir: impl AsRef<Path>,
        key: Option<&[u8]>,
    ) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        match key {
            Some(key) => Self::open(dir, key),
            None => {
                let key = load_or_create_key(&dir.join(KEY_FILE)).await?;
                Self::open(dir, &key)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                key: self.path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, doc: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(doc).map_err(|e| StoreError::Corrupt {
            key: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn seal(&self, key: StoreKey, plaintext: &str) -> Result<String, StoreError> {
        let mut nonce = [0u8; NONCE_LEN];
        self.rng.fill(&mut nonce).map_err(|_| StoreError::Crypto)?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce),
                Aad::from(key.as_str().as_bytes()),
                &mut in_out,
            )
            .map_err(|_| StoreError::Crypto)?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&in_out);
        Ok(BASE64.encode(sealed))
    }

    fn open_sealed(&self, key: StoreKey, sealed_b64: &str) -> Result<String, StoreError> {
        let corrupt = |reason: &str| StoreError::Corrupt {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        let sealed = BASE64
            .decode(sealed_b64)
            .map_err(|_| corrupt("invalid base64"))?;
        if sealed.len() < NONCE_LEN {
            return Err(corrupt("truncated"));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce).map_err(|_| corrupt("bad nonce"))?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::from(key.as_str().as_bytes()), &mut in_out)
            .map_err(|_| corrupt("authentication failed"))?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| corrupt("not UTF-8"))
    }
}

#[async_trait]
impl SecureStore for FileStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        let doc = self.read_document().await?;
        doc.get(key.as_str())
            .map(|sealed| self.open_sealed(key, sealed))
            .transpose()
    }

    async fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_document().await?;
        doc.insert(key.as_str().to_string(), self.seal(key, value)?);
        self.write_document(&doc).await
    }

    async fn delete(&self, key: StoreKey) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_document().await?;
        if doc.remove(key.as_str()).is_none() {
            return Ok(());
        }
        self.write_document(&doc).await
    }
}

/// Read a base64 key file, or generate a fresh key and write it with
/// owner-only permissions.
pub async fn load_or_create_key(path: &Path) -> Result<Vec<u8>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(encoded) => {
            let key = BASE64
                .decode(encoded.trim())
                .map_err(|e| StoreError::Corrupt {
                    key: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            if key.len() != KEY_LEN {
                return Err(StoreError::Corrupt {
                    key: path.display().to_string(),
                    reason: format!("expected {} key bytes, found {}", KEY_LEN, key.len()),
                });
            }
            Ok(key)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut key = vec![0u8; KEY_LEN];
            SystemRandom::new()
                .fill(&mut key)
                .map_err(|_| StoreError::Crypto)?;

            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            write_private(path, BASE64.encode(&key).as_bytes()).await?;
            tracing::info!(path = %path.display(), "Generated new secure store key");
            Ok(key)
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_private(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    tokio::io::AsyncWriteExt::write_all(&mut file, bytes).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_are_bound_to_their_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), &[7u8; KEY_LEN]).unwrap();

        let sealed = store.seal(StoreKey::Token, "abc123").unwrap();
        assert_eq!(store.open_sealed(StoreKey::Token, &sealed).unwrap(), "abc123");
        assert!(matches!(
            store.open_sealed(StoreKey::Profile, &sealed),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_rejects_short_key() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FileStore::open(dir.path(), b"short"),
            Err(StoreError::Unavailable(_))
        ));
    }
}
