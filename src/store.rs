use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use tracing::warn;

use crate::status::{parse_status_payload, StatusRecord};

pub const STATUS_FILE_NAME: &str = "monster_status.json";

pub struct StatusStore {
    path: PathBuf,
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    current: Option<StatusRecord>,
    subscribers: Vec<(u64, Sender<StatusRecord>)>,
    next_token: u64,
}

pub struct StatusSubscription {
    token: u64,
    updates: Receiver<StatusRecord>,
    store: Arc<StatusStore>,
}

impl StatusStore {
    pub fn open(path: PathBuf) -> Arc<Self> {
        let current = match load_record(&path) {
            Ok(record) => record,
            Err(err) => {
                warn!(path = %path.display(), ?err, "ignoring unreadable persisted status");
                None
            }
        };
        Arc::new(Self {
            path,
            inner: Mutex::new(StoreInner {
                current,
                subscribers: Vec::new(),
                next_token: 0,
            }),
        })
    }

    pub fn get(&self) -> Option<StatusRecord> {
        self.lock().current
    }

    // Nothing is published when the write fails; the previous record stays
    // current and the error surfaces to the caller.
    pub fn set(&self, record: StatusRecord) -> Result<()> {
        let mut inner = self.lock();
        save_record(&self.path, &record)?;
        inner.current = Some(record);
        inner.subscribers.retain(|(_, tx)| tx.send(record).is_ok());
        Ok(())
    }

    pub fn subscribe(self: &Arc<Self>) -> StatusSubscription {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut inner = self.lock();
        let token = inner.next_token;
        inner.next_token += 1;
        inner.subscribers.push((token, tx));
        StatusSubscription {
            token,
            updates: rx,
            store: Arc::clone(self),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl StatusSubscription {
    pub fn try_next(&self) -> Option<StatusRecord> {
        self.updates.try_recv().ok()
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        self.store
            .lock()
            .subscribers
            .retain(|(token, _)| *token != self.token);
    }
}

fn load_record(path: &Path) -> Result<Option<StatusRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed reading persisted status at {}", path.display()))?;
    let record = parse_status_payload(&text)
        .with_context(|| format!("invalid persisted status at {}", path.display()))?;
    Ok(Some(record))
}

fn save_record(path: &Path, record: &StatusRecord) -> Result<()> {
    let payload = serde_json::to_string_pretty(record).context("failed serializing status")?;
    fs::write(path, payload)
        .with_context(|| format!("failed writing persisted status at {}", path.display()))?;
    Ok(())
}
