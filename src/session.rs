//! Wallet role resolution with contract-first precedence.
//!
//! The contract owns the role; the file-backed store is a fallback for
//! when the contract cannot be reached or still reports `unknown`. A
//! concrete on-chain role always overwrites the cached one.

use std::{
    collections::HashMap,
    fs,
    future::Future,
    path::{Path, PathBuf},
    sync::RwLock,
};

use tracing::warn;

use crate::{error::Error, types::UserRole};

fn cache_key(address: &str) -> String {
    format!("userRole_{}", address.to_lowercase())
}

/// File-backed role cache, one JSON object of `userRole_<address>` keys.
#[derive(Debug)]
pub struct RoleStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, UserRole>>,
}

impl RoleStore {
    /// Load the store; a missing file starts empty, a corrupt one is
    /// discarded with a warning (it is a cache, not a ledger).
    pub fn load(path: &Path) -> Result<RoleStore, Error> {
        let entries = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(
                &raw,
            ) {
                Ok(map) => map
                    .into_iter()
                    .map(|(key, value)| (key, UserRole::parse(&value)))
                    .collect(),
                Err(e) => {
                    warn!("discarding corrupt role store: {}", e);
                    HashMap::new()
                },
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                HashMap::new()
            },
            Err(e) => return Err(Error::Io(e)),
        };

        Ok(RoleStore {
            path: path.to_owned(),
            entries: RwLock::new(entries),
        })
    }

    pub fn get(&self, address: &str) -> Option<UserRole> {
        let entries =
            self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&cache_key(address)).copied()
    }

    pub fn put(&self, address: &str, role: UserRole) -> Result<(), Error> {
        let serialized = {
            let mut entries =
                self.entries.write().unwrap_or_else(|e| e.into_inner());
            entries.insert(cache_key(address), role);

            let map: HashMap<&String, &str> = entries
                .iter()
                .map(|(key, value)| (key, value.as_str()))
                .collect();
            serde_json::to_string_pretty(&map)?
        };

        fs::write(&self.path, serialized)?;
        Ok(())
    }
}

/// Resolve a wallet's role. `fetch` performs the contract read; its
/// result wins whenever it is concrete.
pub async fn resolve_role<F, Fut>(
    store: &RoleStore,
    address: &str,
    fetch: F,
) -> UserRole
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<UserRole, Error>>,
{
    match fetch().await {
        Ok(role) if role.is_known() => {
            if let Err(e) = store.put(address, role) {
                warn!(address, "could not persist role cache: {}", e);
            }
            role
        },
        Ok(_) => store.get(address).unwrap_or(UserRole::Unknown),
        Err(e) => {
            warn!(address, "role lookup failed, using cached value: {}", e);
            store.get(address).unwrap_or(UserRole::Unknown)
        },
    }
}
