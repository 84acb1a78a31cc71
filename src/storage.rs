use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use pbkdf2::pbkdf2_hmac;
use rand_core::OsRng;
use rand_core::TryRngCore;
use rpassword::prompt_password;
use sha2::Sha256;

use crate::model::{
    ConnectionConfig, EncryptedBlob, MasterConfig, Settings, StoreFile, StoredConnection,
};

const APP_DIR: &str = "geo-deck";
const MASTER_CHECK: &str = "geo-deck-check";
const PBKDF2_ROUNDS: u32 = 100_000;

pub(crate) struct LoadedStore {
    pub(crate) master: MasterConfig,
    pub(crate) master_key: Vec<u8>,
    pub(crate) connections: Vec<ConnectionConfig>,
    pub(crate) settings: Settings,
}

pub(crate) fn config_path() -> Result<PathBuf> {
    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_DIR);
        dir.push("config.json");
        return Ok(dir);
    }
    let mut fallback = std::env::current_dir().context("current dir")?;
    fallback.push("geo-deck-config.json");
    Ok(fallback)
}

pub(crate) fn log_path() -> Result<PathBuf> {
    if let Some(mut dir) = dirs::data_local_dir() {
        dir.push(APP_DIR);
        dir.push("geo-deck.log");
        return Ok(dir);
    }
    let mut fallback = std::env::current_dir().context("current dir")?;
    fallback.push("geo-deck.log");
    Ok(fallback)
}

pub(crate) fn load_or_init_store(path: &Path) -> Result<LoadedStore> {
    if path.exists() {
        let store = load_store(path)?;
        let master_key = prompt_existing_master(&store.master)?;
        let connections = store
            .connections
            .into_iter()
            .map(|conn| decrypt_connection(conn, &master_key))
            .collect::<Result<Vec<_>>>()?;
        return Ok(LoadedStore {
            master: store.master,
            master_key,
            connections,
            settings: store.settings,
        });
    }

    let (master, master_key) = setup_master()?;
    let store = StoreFile {
        master: master.clone(),
        connections: vec![],
        settings: Settings::default(),
    };
    save_store(path, &store)?;
    Ok(LoadedStore {
        master,
        master_key,
        connections: vec![],
        settings: store.settings,
    })
}

pub(crate) fn load_store(path: &Path) -> Result<StoreFile> {
    let content = fs::read_to_string(path).context("read config file")?;
    let store = serde_json::from_str(&content).context("parse config file")?;
    Ok(store)
}

pub(crate) fn save_store(path: &Path, store: &StoreFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let content = serde_json::to_string_pretty(store).context("serialize config")?;
    fs::write(path, content).context("write config file")?;
    Ok(())
}

pub(crate) fn build_store_file(
    master: &MasterConfig,
    key: &[u8],
    connections: &[ConnectionConfig],
    settings: &Settings,
) -> Result<StoreFile> {
    Ok(StoreFile {
        master: master.clone(),
        connections: connections
            .iter()
            .map(|conn| encrypt_connection(conn, key))
            .collect::<Result<Vec<_>>>()?,
        settings: settings.clone(),
    })
}

fn prompt_existing_master(master: &MasterConfig) -> Result<Vec<u8>> {
    loop {
        let password = prompt_password("Master password: ").context("read master password")?;
        match unlock_master(master, &password) {
            Ok(key) => return Ok(key),
            Err(_) => eprintln!("Invalid master password."),
        }
    }
}

fn setup_master() -> Result<(MasterConfig, Vec<u8>)> {
    loop {
        let password = prompt_password("Set master password: ").context("read master password")?;
        let confirm =
            prompt_password("Confirm master password: ").context("read confirm password")?;
        if password != confirm {
            eprintln!("Passwords do not match.");
            continue;
        }
        if password.is_empty() {
            eprintln!("Master password cannot be empty.");
            continue;
        }
        return create_master_from_password(&password);
    }
}

pub(crate) fn unlock_master(master: &MasterConfig, password: &str) -> Result<Vec<u8>> {
    let salt = Base64.decode(&master.salt_b64).context("decode salt")?;
    let key = derive_key(password, &salt);
    let check = Vault::new(&key).open(&master.check)?;
    if check != MASTER_CHECK {
        anyhow::bail!("master check mismatch");
    }
    Ok(key)
}

pub(crate) fn create_master_from_password(password: &str) -> Result<(MasterConfig, Vec<u8>)> {
    let mut salt = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|err| anyhow::anyhow!("random salt failed: {err:?}"))?;
    let key = derive_key(password, &salt);
    let check = Vault::new(&key).seal(MASTER_CHECK)?;
    let master = MasterConfig {
        salt_b64: Base64.encode(salt),
        check,
    };
    Ok((master, key))
}

fn derive_key(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut key = vec![0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}

const NONCE_LEN: usize = 12;

/// AES-256-GCM sealing under the derived master key.
struct Vault(Aes256Gcm);

impl Vault {
    fn new(key: &[u8]) -> Self {
        Self(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)))
    }

    fn seal(&self, plaintext: &str) -> Result<EncryptedBlob> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|err| anyhow::anyhow!("random nonce failed: {err:?}"))?;
        let ciphertext = self
            .0
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|err| anyhow::anyhow!("encrypt failed: {err:?}"))?;
        Ok(EncryptedBlob {
            nonce: Base64.encode(nonce),
            ciphertext: Base64.encode(ciphertext),
        })
    }

    fn open(&self, blob: &EncryptedBlob) -> Result<String> {
        let nonce = Base64.decode(&blob.nonce).context("decode nonce")?;
        if nonce.len() != NONCE_LEN {
            anyhow::bail!("invalid nonce length {}", nonce.len());
        }
        let ciphertext = Base64
            .decode(&blob.ciphertext)
            .context("decode ciphertext")?;
        let plaintext = self
            .0
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|err| anyhow::anyhow!("decrypt failed: {err:?}"))?;
        String::from_utf8(plaintext).context("decode utf8")
    }
}

fn encrypt_connection(conn: &ConnectionConfig, key: &[u8]) -> Result<StoredConnection> {
    Ok(StoredConnection {
        id: conn.id.clone(),
        name: conn.name.clone(),
        url: conn.url.clone(),
        user: conn.user.clone(),
        password: Vault::new(key).seal(&conn.password)?,
    })
}

fn decrypt_connection(conn: StoredConnection, key: &[u8]) -> Result<ConnectionConfig> {
    let password = Vault::new(key)
        .open(&conn.password)
        .with_context(|| format!("decrypt password for {}", conn.url))?;
    Ok(ConnectionConfig {
        id: conn.id,
        name: conn.name,
        url: conn.url,
        user: conn.user,
        password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_connection() -> ConnectionConfig {
        ConnectionConfig {
            id: "conn-1".to_string(),
            name: "local".to_string(),
            url: "http://localhost:8080/geoserver".to_string(),
            user: "admin".to_string(),
            password: "geoserver".to_string(),
        }
    }

    #[test]
    fn unlock_master_rejects_wrong_password() {
        let (master, key) = create_master_from_password("correct horse").unwrap();
        assert_eq!(unlock_master(&master, "correct horse").unwrap(), key);
        assert!(unlock_master(&master, "battery staple").is_err());
    }

    #[test]
    fn stored_file_keeps_password_encrypted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let (master, key) = create_master_from_password("pw").unwrap();
        let settings = Settings {
            poll_interval_secs: 12,
            last_local_dir: Some("/data".to_string()),
        };
        let store = build_store_file(&master, &key, &[sample_connection()], &settings).unwrap();
        save_store(&path, &store).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"geoserver\""));

        let loaded = load_store(&path).unwrap();
        assert_eq!(loaded.settings.poll_interval_secs, 12);
        let decrypted = loaded
            .connections
            .into_iter()
            .map(|conn| decrypt_connection(conn, &key))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(decrypted, vec![sample_connection()]);
    }

    #[test]
    fn decrypt_connection_fails_with_other_key() {
        let (_, key) = create_master_from_password("one").unwrap();
        let (_, other) = create_master_from_password("two").unwrap();
        let stored = encrypt_connection(&sample_connection(), &key).unwrap();
        let err = decrypt_connection(stored, &other).unwrap_err();
        assert!(format!("{err:#}").contains("decrypt password"));
    }
}
