// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-key debounce/batch scheduler (`SPEC_FULL.md` §9). The one
//! abstraction behind the event bus's per-session terminal batching and
//! state-update debounce, and the persistence store's per-key write
//! debounce: `schedule` re-arms a key's timer, `flush_key`/`flush_all`
//! fire immediately and cancel the timer.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

pub struct KeyedScheduler<K: Eq + Hash + Clone + Send + Sync + 'static> {
    pending: Mutex<HashMap<K, JoinHandle<()>>>,
}

impl<K: Eq + Hash + Clone + Send + Sync + 'static> KeyedScheduler<K> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { pending: Mutex::new(HashMap::new()) })
    }

    /// Re-arm `key`'s timer for `delay`, cancelling whatever was pending
    /// for it. `make_fn` is called only if the timer is allowed to elapse.
    pub async fn schedule<F>(self: &Arc<Self>, key: K, delay: Duration, make_fn: F)
    where
        F: FnOnce() -> BoxFuture + Send + 'static,
    {
        self.cancel(&key).await;
        let this = Arc::clone(self);
        let spawn_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            make_fn().await;
            this.pending.lock().await.remove(&spawn_key);
        });
        self.pending.lock().await.insert(key, handle);
    }

    async fn cancel(&self, key: &K) {
        if let Some(handle) = self.pending.lock().await.remove(key) {
            handle.abort();
        }
    }

    /// Cancel `key`'s pending timer without running its callback.
    pub async fn flush_key_cancel(&self, key: &K) {
        self.cancel(key).await;
    }

    /// Cancel every pending timer without running their callbacks. Used at
    /// shutdown by callers that perform their own final flush afterward.
    pub async fn cancel_all(&self) {
        let mut pending = self.pending.lock().await;
        for (_, handle) in pending.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
