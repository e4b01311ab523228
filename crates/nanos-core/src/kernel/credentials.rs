//! Credential material loaded on demand.
//!
//! The [`KeyStore`] binding is a factory: the first lookup reads the
//! properties file for the store password, then opens and verifies the
//! credential store with it. Every failure surfaces as the single
//! [`Error::CredentialLoad`].
//!
//! The store file is not encrypted. Entries are kept in the clear and the
//! password only keys an HMAC-SHA256 over them, so a wrong password or an
//! edited entry fails verification. Protect the file with filesystem
//! permissions.
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::io::Read;
use std::path::{Path, PathBuf};

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error as ThisError;

use crate::kernel::constants::KEYSTORE_PASSWORD_PROPERTY;
use crate::kernel::context::Context;
use crate::kernel::error::{Error, Result};
use crate::kernel::factory::SingletonFactory;
use crate::storage::{Storage, StorageProvider};

const KEYSTORE_VERSION: u32 = 1;
const MAC_DOMAIN: &[u8] = b"nanos-keystore:v1\0";

type KeyStoreMac = Hmac<Sha256>;

/// Plain `key=value` text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    /// Accepts `key=value`, `key: value` and `key value`; lines starting with
    /// `#` or `!` are comments.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = match line.find(['=', ':']) {
                Some(at) => (&line[..at], &line[at + 1..]),
                None => line.split_once(char::is_whitespace).unwrap_or((line, "")),
            };
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Secret,
    Certificate,
    PrivateKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub kind: EntryKind,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
}

impl CredentialEntry {
    pub fn new(kind: EntryKind, data: impl Into<Vec<u8>>) -> Self {
        Self { kind, data: data.into() }
    }
}

#[derive(Serialize, Deserialize)]
struct KeyStoreFile {
    version: u32,
    entries: BTreeMap<String, CredentialEntry>,
    mac: String,
}

#[derive(Debug, ThisError)]
enum CredentialError {
    #[error("property '{key}' missing from '{path}'")]
    MissingProperty { key: String, path: PathBuf },
    #[error("credential store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("unsupported credential store version {0}")]
    UnsupportedVersion(u32),
    #[error("credential store integrity check failed; wrong password?")]
    IntegrityCheckFailed,
    #[error("credential store password cannot key the MAC")]
    InvalidKey,
}

/// An opened, verified set of credentials keyed by alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyStore {
    entries: BTreeMap<String, CredentialEntry>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, entry: CredentialEntry) -> Option<CredentialEntry> {
        self.entries.insert(alias.into(), entry)
    }

    pub fn get(&self, alias: &str) -> Option<&CredentialEntry> {
        self.entries.get(alias)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the store with an integrity tag keyed by `password`.
    /// Entries are written in the clear.
    pub fn to_bytes(&self, password: &str) -> Result<Vec<u8>> {
        let tag = Self::mac(password, &self.entries).map_err(Error::credential_load)?;
        let file = KeyStoreFile {
            version: KEYSTORE_VERSION,
            mac: hex::encode(tag.finalize().into_bytes()),
            entries: self.entries.clone(),
        };
        serde_json::to_vec_pretty(&file).map_err(Error::credential_load)
    }

    /// Decode and verify a store written by [`KeyStore::to_bytes`].
    pub fn open(bytes: &[u8], password: &str) -> Result<Self> {
        Self::decode(bytes, password).map_err(Error::credential_load)
    }

    fn decode(bytes: &[u8], password: &str) -> std::result::Result<Self, CredentialError> {
        let file: KeyStoreFile = serde_json::from_slice(bytes)?;
        if file.version != KEYSTORE_VERSION {
            return Err(CredentialError::UnsupportedVersion(file.version));
        }
        let expected = hex::decode(&file.mac).map_err(|_| CredentialError::IntegrityCheckFailed)?;
        Self::mac(password, &file.entries)?
            .verify_slice(&expected)
            .map_err(|_| CredentialError::IntegrityCheckFailed)?;
        Ok(Self { entries: file.entries })
    }

    // HMAC-SHA256 keyed by the password over the domain tag and the entries.
    fn mac(password: &str, entries: &BTreeMap<String, CredentialEntry>) -> std::result::Result<KeyStoreMac, CredentialError> {
        let body = serde_json::to_vec(entries)?;
        let mut mac = KeyStoreMac::new_from_slice(password.as_bytes()).map_err(|_| CredentialError::InvalidKey)?;
        mac.update(MAC_DOMAIN);
        mac.update(&body);
        Ok(mac)
    }
}

/// Factory binding the credential store. Paths resolve against the bound
/// [`Storage`].
pub fn key_store_factory(properties_file: PathBuf, key_store_file: PathBuf) -> SingletonFactory {
    SingletonFactory::of(move |context: &Context| {
        let storage = context.instance::<Storage>().map_err(Error::credential_load)?;
        load_key_store(&*storage, &properties_file, &key_store_file)
    })
}

/// Read the password from `properties_file` and open `key_store_file` with it.
pub fn load_key_store(storage: &dyn StorageProvider, properties_file: &Path, key_store_file: &Path) -> Result<KeyStore> {
    read_key_store(storage, properties_file, key_store_file).map_err(|source| Error::CredentialLoad { source })
}

fn read_key_store(
    storage: &dyn StorageProvider,
    properties_file: &Path,
    key_store_file: &Path,
) -> std::result::Result<KeyStore, Box<dyn StdError + Send + Sync>> {
    let properties = Properties::parse(&String::from_utf8(read_file(storage, properties_file)?)?);
    let password = properties
        .get(KEYSTORE_PASSWORD_PROPERTY)
        .ok_or_else(|| CredentialError::MissingProperty {
            key: KEYSTORE_PASSWORD_PROPERTY.to_string(),
            path: properties_file.to_path_buf(),
        })?;

    let bytes = read_file(storage, key_store_file)?;
    Ok(KeyStore::decode(&bytes, password)?)
}

// The handle is dropped when this returns, on success or failure.
fn read_file(storage: &dyn StorageProvider, path: &Path) -> Result<Vec<u8>> {
    let mut reader = storage.open_read(path)?;
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(e, "read", path.to_path_buf()))?;
    Ok(bytes)
}
