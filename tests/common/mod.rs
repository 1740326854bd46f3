#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use orfi::config::{Config, ConfigManager};
use orfi::core::{LedgerStore, StoreOptions};
use orfi::storage::{JsonLedgerStorage, StoragePaths};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Fresh data root with the sample month disabled.
pub fn data_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let config = Config {
        seed_sample_data: false,
        ..Config::default()
    };
    ConfigManager::with_base_dir(base.clone())
        .expect("create config manager for temp dir")
        .save(&config)
        .expect("write test config");
    base
}

pub fn open_store(root: &Path) -> LedgerStore {
    let paths = StoragePaths::under(root.to_path_buf());
    let storage = JsonLedgerStorage::with_retention(paths, 3).expect("json storage");
    LedgerStore::open(Box::new(storage), StoreOptions::default())
}
