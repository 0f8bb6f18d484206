//! Database types and global state
//!
//! Storage layout:
//! - `users`: user name → JSON `User`
//! - `entities`: entity id → JSON `Entity`
//! - `anchors`: [anchor][user] → () (which users hold rights on an anchor)
//! - `children`: [parent][child] → () (direct children of an entity)

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use heed::types::{Bytes, Str, Unit};
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{err, AnchorAuthError, Result};
use crate::keys::get_part;

// Database type aliases
pub type DbJson = Database<Str, Str>;
pub type DbIndex = Database<Bytes, Unit>;

/// All database handles
pub struct Dbs {
    pub users: DbJson,
    pub entities: DbJson,
    pub anchors: DbIndex,
    pub children: DbIndex,
}

// Global state
pub static ENV: OnceLock<Env> = OnceLock::new();
pub static DBS: OnceLock<Dbs> = OnceLock::new();
pub static TEST_LOCK: Mutex<()> = Mutex::new(());
pub static INIT_PATH: OnceLock<String> = OnceLock::new();

fn not_initialized() -> AnchorAuthError {
    AnchorAuthError::Storage("not initialized".into())
}

/// Get the database handles, or error if not initialized
#[inline]
pub fn dbs() -> Result<&'static Dbs> {
    DBS.get().ok_or_else(not_initialized)
}

/// Get the environment, or error if not initialized
#[inline]
pub fn env() -> Result<&'static Env> {
    ENV.get().ok_or_else(not_initialized)
}

/// Execute a read-only operation
#[inline]
pub fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(f: F) -> Result<T> {
    f(dbs()?, &env()?.read_txn().map_err(err)?)
}

/// Initialize the database
pub fn init(path: &str) -> Result<()> {
    if let Some(p) = INIT_PATH.get() {
        return if p == path {
            Ok(())
        } else {
            Err(AnchorAuthError::Storage(format!("already initialized at {}", p)))
        };
    }
    std::fs::create_dir_all(path).map_err(err)?;
    // SAFETY: LMDB requires no other processes access this path concurrently during open.
    let e = unsafe {
        EnvOpenOptions::new()
            .map_size(1 << 30)
            .max_dbs(4)
            .open(Path::new(path))
            .map_err(err)?
    };
    let mut tx = e.write_txn().map_err(err)?;
    let d = Dbs {
        users: e.create_database(&mut tx, Some("users")).map_err(err)?,
        entities: e.create_database(&mut tx, Some("entities")).map_err(err)?,
        anchors: e.create_database(&mut tx, Some("anchors")).map_err(err)?,
        children: e.create_database(&mut tx, Some("children")).map_err(err)?,
    };
    tx.commit().map_err(err)?;
    let _ = (ENV.set(e), DBS.set(d), INIT_PATH.set(path.to_string()));
    tracing::info!(path, "registry opened");
    Ok(())
}

/// Clear all databases (for testing)
pub fn clear_all() -> Result<()> {
    crate::tx::transact(|tx| {
        tx.dbs().users.clear(tx.tx()).map_err(err)?;
        tx.dbs().entities.clear(tx.tx()).map_err(err)?;
        tx.dbs().anchors.clear(tx.tx()).map_err(err)?;
        tx.dbs().children.clear(tx.tx()).map_err(err)
    })
}

/// Get the test lock (for single-threaded tests)
pub fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}

// ============================================================================
// Record encoding
// ============================================================================

#[inline]
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(err)
}

#[inline]
pub(crate) fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(err)
}

/// Fetch and decode one JSON record
pub(crate) fn get_json<T: DeserializeOwned>(db: &DbJson, tx: &RoTxn, key: &str) -> Result<Option<T>> {
    db.get(tx, key).map_err(err)?.map(decode).transpose()
}

/// Decode every record of a JSON table, in key order
pub(crate) fn list_json<T: DeserializeOwned>(db: &DbJson, tx: &RoTxn) -> Result<Vec<T>> {
    let mut r = Vec::new();
    for item in db.iter(tx).map_err(err)? {
        let (_, v) = item.map_err(err)?;
        r.push(decode(v)?);
    }
    Ok(r)
}

/// Second key part of every index entry under `prefix`, in key order
pub(crate) fn index_members(db: &DbIndex, tx: &RoTxn, prefix: &[u8]) -> Result<Vec<String>> {
    let mut r = Vec::new();
    for item in db.prefix_iter(tx, prefix).map_err(err)? {
        let (k, _) = item.map_err(err)?;
        if let Some(member) = get_part(k, 1) {
            r.push(member.to_string());
        }
    }
    Ok(r)
}
