//! File-backed mirror: the snapshot lives in a single JSON file that every
//! process on the machine shares.
//!
//! Writes land in a temporary sibling and are renamed over the slot, so a
//! reader never sees a half-written snapshot. A watcher task compares the
//! file against what it last saw and announces changes made by other
//! processes; our own writes are recognised by content hash and skipped.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{LocalMirror, SlotChange, SlotSubscription, EXTERNAL_CONTEXT};
use crate::error::SyncError;

const SLOT_FILE_NAME: &str = "polls.json";
const SIGNAL_CAPACITY: usize = 16;

pub struct FileMirror {
    path: PathBuf,
    /// Hash of the last value this mirror wrote.
    own_write: Arc<Mutex<Option<u64>>>,
    tx: broadcast::Sender<SlotChange>,
    watcher: Option<JoinHandle<()>>,
}

impl FileMirror {
    pub fn new(path: PathBuf) -> Result<Self, SyncError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SyncError::cache)?;
        }
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        Ok(Self {
            path,
            own_write: Arc::new(Mutex::new(None)),
            tx,
            watcher: None,
        })
    }

    /// `<cache_dir>/pollsync/polls.json`
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .context("Failed to get cache directory")?
            .join("pollsync");
        Ok(cache_dir.join(SLOT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start announcing changes made by other processes. Must be called
    /// from within a tokio runtime. Restarting replaces the old watcher.
    pub fn watch(&mut self, interval: Duration) {
        if let Some(old) = self.watcher.take() {
            old.abort();
        }
        let path = self.path.clone();
        let own_write = Arc::clone(&self.own_write);
        let tx = self.tx.clone();
        self.watcher = Some(tokio::spawn(watch_slot(path, interval, own_write, tx)));
    }

}

impl Drop for FileMirror {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

fn hash_value(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

async fn read_slot(path: &Path) -> Result<Option<String>, SyncError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SyncError::cache(e)),
    }
}

async fn watch_slot(
    path: PathBuf,
    interval: Duration,
    own_write: Arc<Mutex<Option<u64>>>,
    tx: broadcast::Sender<SlotChange>,
) {
    let mut last_seen = read_slot(&path).await.ok().flatten();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let current = match read_slot(&path).await {
            Ok(current) => current,
            Err(e) => {
                tracing::debug!("Slot watcher read failed: {}", e);
                continue;
            }
        };
        if current == last_seen {
            continue;
        }

        let is_own = {
            let own = own_write.lock().map(|h| *h).unwrap_or(None);
            own.is_some() && current.as_deref().map(hash_value) == own
        };
        let old = std::mem::replace(&mut last_seen, current.clone());
        if is_own {
            continue;
        }

        tracing::debug!("Slot {} changed by another process", path.display());
        // No receivers is fine: nobody is listening yet.
        let _ = tx.send(SlotChange {
            origin: EXTERNAL_CONTEXT,
            old,
            new: current,
        });
    }
}

#[async_trait]
impl LocalMirror for FileMirror {
    fn backend_name(&self) -> &str {
        "file"
    }

    async fn read_raw(&self) -> Result<Option<String>, SyncError> {
        read_slot(&self.path).await
    }

    async fn write_raw(&self, value: String) -> Result<(), SyncError> {
        if let Ok(mut own) = self.own_write.lock() {
            *own = Some(hash_value(&value));
        }
        let tmp = self
            .path
            .with_extension(format!("json.{}.tmp", std::process::id()));
        tokio::fs::write(&tmp, value.as_bytes())
            .await
            .map_err(SyncError::cache)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(SyncError::cache)?;
        Ok(())
    }

    fn subscribe(&self) -> SlotSubscription {
        SlotSubscription::new(self.tx.subscribe(), None)
    }
}
