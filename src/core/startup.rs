use anyhow::{Context, Result};
use tracing::info;

use crate::core::config::Config;
use crate::security::admin_policy::AdminPolicy;
use crate::stores::durable_kv::DurableKv;
use crate::stores::record_store::{RecordStore, StorageKeys};
use crate::wal::wal::Wal;

// this runs at boot time
pub fn open_store(config: &Config) -> Result<RecordStore<DurableKv>> {
    let wal_path = config.storage.wal_path.clone();
    let wal = Wal::new(wal_path.clone()).context("Failed to initialize WAL")?;

    let kv = DurableKv::open(wal)
        .context("Failed to replay WAL")?
        .with_compact_every(config.storage.compact_every);

    if config.storage.compact_on_start {
        let keys = kv.compact().context("Failed to compact WAL")?;
        info!(wal_path = %wal_path.display(), live_keys = keys, "WAL compacted");
    }

    let admins = AdminPolicy::new(&config.admin.usernames);
    let store = RecordStore::new(
        kv,
        StorageKeys::with_prefix(&config.storage.key_prefix),
        admins,
    );

    // Decoding both collections here surfaces a corrupt slot at boot, not on first request
    let users = store.load_users()?.len();
    let applications = store.load_applications()?.len();
    let session = store.current_user()?;

    info!(
        wal_path = %wal_path.display(),
        users = users,
        applications = applications,
        session = ?session,
        admins = store.admins().len(),
        "Record store opened"
    );

    Ok(store)
}
