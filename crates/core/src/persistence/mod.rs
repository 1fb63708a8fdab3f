// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence & recovery: atomic, per-key debounced writes of session and
//! pane records, and the startup reconciliation sequence.

mod recovery;
mod schema;

pub use recovery::{guess_mode, reconcile, Reconciliation};
pub use schema::{LifetimeStats, PanesFile, PersistedPane, PersistedSession, SessionsFile};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::PersistError;
use crate::scheduler::KeyedScheduler;
use crate::session::SessionId;

const WRITE_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    Sessions,
    Panes,
    Stats,
}

pub struct PersistStore {
    sessions_path: PathBuf,
    panes_path: PathBuf,
    stats_path: PathBuf,
    sessions: Mutex<HashMap<SessionId, PersistedSession>>,
    panes: Mutex<HashMap<SessionId, PersistedPane>>,
    stats: Mutex<LifetimeStats>,
    scheduler: Arc<KeyedScheduler<Key>>,
}

impl PersistStore {
    pub async fn open(state_dir: PathBuf) -> Result<Arc<Self>, PersistError> {
        tokio::fs::create_dir_all(&state_dir).await?;
        let sessions_path = state_dir.join("sessions.json");
        let panes_path = state_dir.join("panes.json");
        let stats_path = state_dir.join("lifetime_stats.json");

        let sessions_file: SessionsFile = read_or_default(&sessions_path).await;
        let panes_file: PanesFile = read_or_default(&panes_path).await;
        let stats: LifetimeStats = read_or_default(&stats_path).await;

        Ok(Arc::new(Self {
            sessions_path,
            panes_path,
            stats_path,
            sessions: Mutex::new(sessions_file.sessions.into_iter().map(|s| (s.id, s)).collect()),
            panes: Mutex::new(panes_file.panes.into_iter().map(|p| (p.session_id, p)).collect()),
            stats: Mutex::new(stats),
            scheduler: KeyedScheduler::new(),
        }))
    }

    pub async fn loaded_sessions(&self) -> Vec<PersistedSession> {
        self.sessions.lock().await.values().cloned().collect()
    }

    pub async fn loaded_panes(&self) -> Vec<PersistedPane> {
        self.panes.lock().await.values().cloned().collect()
    }

    pub async fn lifetime_stats(&self) -> LifetimeStats {
        self.stats.lock().await.clone()
    }

    pub async fn upsert_session(self: &Arc<Self>, record: PersistedSession) {
        self.sessions.lock().await.insert(record.id, record);
        self.schedule_write(Key::Sessions).await;
    }

    pub async fn remove_session(self: &Arc<Self>, id: SessionId) {
        self.sessions.lock().await.remove(&id);
        self.schedule_write(Key::Sessions).await;
    }

    pub async fn upsert_pane(self: &Arc<Self>, record: PersistedPane) {
        self.panes.lock().await.insert(record.session_id, record);
        self.schedule_write(Key::Panes).await;
    }

    pub async fn remove_pane(self: &Arc<Self>, id: SessionId) {
        self.panes.lock().await.remove(&id);
        self.schedule_write(Key::Panes).await;
    }

    /// Accumulate final counters into the lifetime tally — only called from
    /// `cleanupSession(killMux=true)`.
    pub async fn accumulate_lifetime(self: &Arc<Self>, input_tokens: u64, output_tokens: u64, cost: f64) {
        {
            let mut stats = self.stats.lock().await;
            stats.sessions_completed += 1;
            stats.input_tokens += input_tokens;
            stats.output_tokens += output_tokens;
            stats.total_cost += cost;
        }
        self.schedule_write(Key::Stats).await;
    }

    async fn schedule_write(self: &Arc<Self>, key: Key) {
        let this = Arc::clone(self);
        self.scheduler
            .schedule(key, WRITE_DEBOUNCE, move || Box::pin(async move { this.flush_key(key).await }))
            .await;
    }

    async fn flush_key(&self, key: Key) {
        let result = match key {
            Key::Sessions => {
                let sessions: Vec<_> = self.sessions.lock().await.values().cloned().collect();
                write_atomic(&self.sessions_path, &SessionsFile { sessions }).await
            }
            Key::Panes => {
                let panes: Vec<_> = self.panes.lock().await.values().cloned().collect();
                write_atomic(&self.panes_path, &PanesFile { panes }).await
            }
            Key::Stats => {
                let stats = self.stats.lock().await.clone();
                write_atomic(&self.stats_path, &stats).await
            }
        };
        if let Err(err) = result {
            tracing::error!(error = %err, "failed to persist state, continuing in-memory");
        }
    }

    /// Final flush on shutdown: drains every pending key immediately.
    pub async fn flush_all(&self) {
        self.flush_key(Key::Sessions).await;
        self.flush_key(Key::Panes).await;
        self.flush_key(Key::Stats).await;
        self.scheduler.cancel_all().await;
    }
}

async fn read_or_default<T: Default + serde::de::DeserializeOwned>(path: &std::path::Path) -> T {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "corrupt persisted state, starting empty");
            T::default()
        }),
        Err(_) => T::default(),
    }
}

async fn write_atomic<T: serde::Serialize>(path: &std::path::Path, value: &T) -> Result<(), PersistError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, &bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;
