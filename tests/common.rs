#![allow(dead_code)]

use account_store::{db, AccountStore, Config, PasswordHasher};
use tempfile::TempDir;

/// An account store over a throwaway on-disk database.
pub struct TestDb {
    pub dir: TempDir,
    pub store: AccountStore,
}

pub fn config_in(dir: &TempDir) -> Config {
    let path = dir.path().join("accounts.db");
    Config::default().with_database_url(path.to_string_lossy())
}

/// Minimum Argon2 cost, so tests that hash many passwords stay quick.
pub fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new()
        .with_cost(8, 1, 1)
        .expect("argon2 cost")
}

pub fn open() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let pool = db::establish(&config_in(&dir)).expect("open database");
    let store = AccountStore::new(pool, cheap_hasher());
    TestDb { dir, store }
}
