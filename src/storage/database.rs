// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! Embedded user database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser (JSON bytes)
//! - `users_by_email`: lowercase email → user_id (uniqueness index)
//! - `claim_locks`: composite key (user_id_be | claim_day_be) → created_at
//! - `meta`: key → u64 (id sequence)

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user_id → serialized StoredUser (JSON bytes).
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Index: lowercase email → user_id. Enforces email uniqueness.
const USERS_BY_EMAIL: TableDefinition<&str, u64> = TableDefinition::new("users_by_email");

/// Claim locks: composite key `user_id_be_bytes | claim_day_be_bytes` →
/// created-at Unix timestamp.
const CLAIM_LOCKS: TableDefinition<&[u8], i64> = TableDefinition::new("claim_locks");

/// Meta: key → counter value (e.g., "next_user_id").
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_USER_ID_KEY: &str = "next_user_id";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Records
// =============================================================================

/// Persisted user record.
///
/// The private key is stored AES-GCM-wrapped; only the user's password can
/// recover it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    /// Sequential user id
    pub user_id: u64,
    /// User email (stored as registered; indexed lowercase)
    pub email: String,
    /// On-chain address derived from the custodial key (0x-prefixed hex)
    pub address: String,
    /// Wrapped private key (base64: nonce || AES-GCM ciphertext)
    pub enc_priv_key_b64: String,
    /// KDF salt for the key-wrapping key (base64)
    pub enc_salt_b64: String,
    /// KDF salt for the password hash (base64)
    pub pass_salt_b64: String,
    /// argon2id password hash (base64)
    pub password_hash_b64: String,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a user; the id is allocated by the database.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub address: String,
    pub enc_priv_key_b64: String,
    pub enc_salt_b64: String,
    pub pass_salt_b64: String,
    pub password_hash_b64: String,
}

// =============================================================================
// Key Helpers
// =============================================================================

/// Build the composite claim-lock key: `user_id_be | claim_day_be`.
fn claim_lock_key(user_id: u64, claim_day: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&user_id.to_be_bytes());
    key[8..].copy_from_slice(&claim_day.to_be_bytes());
    key
}

// =============================================================================
// GatewayDb
// =============================================================================

/// Embedded ACID database for users and claim locks.
pub struct GatewayDb {
    db: Database,
}

impl GatewayDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(CLAIM_LOCKS)?;
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Create a new user, allocating the next sequential id.
    ///
    /// Email uniqueness is enforced inside the same write transaction;
    /// a duplicate (case-insensitive) returns [`DbError::AlreadyExists`].
    pub fn create_user(&self, new_user: NewUser) -> DbResult<StoredUser> {
        let email_key = new_user.email.to_lowercase();

        let write_txn = self.db.begin_write()?;
        let user = {
            let mut email_table = write_txn.open_table(USERS_BY_EMAIL)?;
            if email_table.get(email_key.as_str())?.is_some() {
                return Err(DbError::AlreadyExists(format!(
                    "email {} already registered",
                    new_user.email
                )));
            }

            let mut meta_table = write_txn.open_table(META)?;
            let user_id = match meta_table.get(NEXT_USER_ID_KEY)? {
                Some(v) => v.value(),
                None => 1,
            };
            meta_table.insert(NEXT_USER_ID_KEY, user_id + 1)?;

            let user = StoredUser {
                user_id,
                email: new_user.email,
                address: new_user.address,
                enc_priv_key_b64: new_user.enc_priv_key_b64,
                enc_salt_b64: new_user.enc_salt_b64,
                pass_salt_b64: new_user.pass_salt_b64,
                password_hash_b64: new_user.password_hash_b64,
                created_at: Utc::now(),
            };

            let json = serde_json::to_vec(&user)?;
            let mut users_table = write_txn.open_table(USERS)?;
            users_table.insert(user_id, json.as_slice())?;
            email_table.insert(email_key.as_str(), user_id)?;

            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Look up a user by id.
    pub fn get_user(&self, user_id: u64) -> DbResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(user_id)? {
            Some(value) => {
                let user: StoredUser = serde_json::from_slice(value.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Look up a user by email (case-insensitive).
    pub fn get_user_by_email(&self, email: &str) -> DbResult<Option<StoredUser>> {
        let email_key = email.to_lowercase();
        let read_txn = self.db.begin_read()?;
        let email_table = read_txn.open_table(USERS_BY_EMAIL)?;

        let user_id = match email_table.get(email_key.as_str())? {
            Some(v) => v.value(),
            None => return Ok(None),
        };

        let users_table = read_txn.open_table(USERS)?;
        match users_table.get(user_id)? {
            Some(value) => {
                let user: StoredUser = serde_json::from_slice(value.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    // =========================================================================
    // Claim Locks
    // =========================================================================

    /// Check whether a claim lock is held for the given user and day.
    pub fn is_claim_locked(&self, user_id: u64, claim_day: u64) -> DbResult<bool> {
        let key = claim_lock_key(user_id, claim_day);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CLAIM_LOCKS)?;
        Ok(table.get(key.as_slice())?.is_some())
    }

    /// Atomically acquire the claim lock for a user and day.
    ///
    /// Insert-if-absent inside a single write transaction: returns `true` if
    /// this call took the lock, `false` if it was already held.
    pub fn try_acquire_claim_lock(&self, user_id: u64, claim_day: u64) -> DbResult<bool> {
        let key = claim_lock_key(user_id, claim_day);
        let write_txn = self.db.begin_write()?;
        let acquired = {
            let mut table = write_txn.open_table(CLAIM_LOCKS)?;
            if table.get(key.as_slice())?.is_some() {
                false
            } else {
                table.insert(key.as_slice(), Utc::now().timestamp())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(acquired)
    }

    /// Release a claim lock (failure rollback path).
    pub fn release_claim_lock(&self, user_id: u64, claim_day: u64) -> DbResult<()> {
        let key = claim_lock_key(user_id, claim_day);
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CLAIM_LOCKS)?;
            table.remove(key.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (GatewayDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = GatewayDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn sample_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            address: "0x405e2ea956ea490bf3d4bd734dc334a1d42b35b9".to_string(),
            enc_priv_key_b64: "Y2lwaGVydGV4dA==".to_string(),
            enc_salt_b64: "ZW5jc2FsdA==".to_string(),
            pass_salt_b64: "cGFzc3NhbHQ=".to_string(),
            password_hash_b64: "aGFzaA==".to_string(),
        }
    }

    #[test]
    fn create_and_get_user() {
        let (db, _dir) = temp_db();

        let created = db.create_user(sample_user("alice@example.com")).unwrap();
        assert_eq!(created.user_id, 1);

        let by_id = db.get_user(1).unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");
        assert_eq!(by_id.address, created.address);

        let by_email = db.get_user_by_email("alice@example.com").unwrap().unwrap();
        assert_eq!(by_email.user_id, 1);
    }

    #[test]
    fn user_ids_are_sequential() {
        let (db, _dir) = temp_db();

        let a = db.create_user(sample_user("a@example.com")).unwrap();
        let b = db.create_user(sample_user("b@example.com")).unwrap();
        let c = db.create_user(sample_user("c@example.com")).unwrap();

        assert_eq!((a.user_id, b.user_id, c.user_id), (1, 2, 3));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (db, _dir) = temp_db();

        db.create_user(sample_user("dup@example.com")).unwrap();
        let result = db.create_user(sample_user("dup@example.com"));
        assert!(matches!(result, Err(DbError::AlreadyExists(_))));
    }

    #[test]
    fn email_lookup_is_case_insensitive() {
        let (db, _dir) = temp_db();

        db.create_user(sample_user("Mixed@Example.Com")).unwrap();

        assert!(db.get_user_by_email("mixed@example.com").unwrap().is_some());
        assert!(db.get_user_by_email("MIXED@EXAMPLE.COM").unwrap().is_some());

        // Duplicate differing only in case is still rejected
        let result = db.create_user(sample_user("mixed@example.com"));
        assert!(matches!(result, Err(DbError::AlreadyExists(_))));
    }

    #[test]
    fn unknown_user_returns_none() {
        let (db, _dir) = temp_db();
        assert!(db.get_user(999).unwrap().is_none());
        assert!(db.get_user_by_email("ghost@example.com").unwrap().is_none());
    }

    #[test]
    fn claim_lock_acquire_is_exclusive() {
        let (db, _dir) = temp_db();

        assert!(!db.is_claim_locked(1, 19723).unwrap());
        assert!(db.try_acquire_claim_lock(1, 19723).unwrap());
        assert!(db.is_claim_locked(1, 19723).unwrap());

        // Second acquisition for the same (user, day) fails
        assert!(!db.try_acquire_claim_lock(1, 19723).unwrap());

        // Different day or user is independent
        assert!(db.try_acquire_claim_lock(1, 19724).unwrap());
        assert!(db.try_acquire_claim_lock(2, 19723).unwrap());
    }

    #[test]
    fn claim_lock_release_allows_reacquire() {
        let (db, _dir) = temp_db();

        assert!(db.try_acquire_claim_lock(5, 100).unwrap());
        db.release_claim_lock(5, 100).unwrap();
        assert!(!db.is_claim_locked(5, 100).unwrap());
        assert!(db.try_acquire_claim_lock(5, 100).unwrap());
    }

    #[test]
    fn release_of_unheld_lock_is_a_noop() {
        let (db, _dir) = temp_db();
        db.release_claim_lock(9, 9).unwrap();
        assert!(!db.is_claim_locked(9, 9).unwrap());
    }

    #[test]
    fn claim_lock_keys_do_not_collide() {
        // (1, 2) and (2, 1) must map to distinct keys
        assert_ne!(claim_lock_key(1, 2), claim_lock_key(2, 1));
    }

    #[test]
    fn users_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.redb");

        {
            let db = GatewayDb::open(&path).unwrap();
            db.create_user(sample_user("persist@example.com")).unwrap();
            db.try_acquire_claim_lock(1, 42).unwrap();
        }

        let db = GatewayDb::open(&path).unwrap();
        assert!(db.get_user_by_email("persist@example.com").unwrap().is_some());
        assert!(db.is_claim_locked(1, 42).unwrap());

        // Id sequence continues after reopen
        let next = db.create_user(sample_user("next@example.com")).unwrap();
        assert_eq!(next.user_id, 2);
    }
}
