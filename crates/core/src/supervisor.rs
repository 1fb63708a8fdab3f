// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session supervisor (`SPEC_FULL.md` §2): owns every live [`Session`] and
//! its [`RespawnController`], wires session events onto the [`EventBus`],
//! and drives startup reconciliation against persisted and live panes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::bus::EventBus;
use crate::error::{SessionError, SupervisorError};
use crate::events::{BusEvent, HookEvent, SessionEvent};
use crate::mux::{MultiplexerAdapter, PaneRecord};
use crate::persistence::{guess_mode, reconcile, LifetimeStats, PersistStore, PersistedPane, PersistedSession};
use crate::respawn::{IdleOracle, RespawnConfig, RespawnController};
use crate::session::{LightSessionState, Mode, Session, SessionConfig, SessionId};

/// Post-restart grace period before a recovered session's controller is
/// allowed to start driving keystrokes — gives the operator a window to
/// notice something is wrong before automation touches the pane.
const RECOVERY_GRACE_PERIOD: Duration = Duration::from_secs(120);

/// Default per-session broadcast channel depth, matching [`Session::new`]'s
/// floor.
const EVENT_CAPACITY: usize = 256;

pub struct SupervisorConfig {
    pub state_dir: PathBuf,
    pub max_sessions: usize,
    pub mux: Arc<dyn MultiplexerAdapter>,
    pub oracle: Option<Arc<dyn IdleOracle>>,
}

struct Managed {
    session: Arc<Session>,
    controller: Arc<RespawnController>,
}

pub struct Supervisor {
    config: SupervisorConfig,
    store: Arc<PersistStore>,
    bus: Arc<EventBus>,
    sessions: RwLock<HashMap<SessionId, Managed>>,
    light_cache: RwLock<Option<Vec<LightSessionState>>>,
}

impl Supervisor {
    pub async fn new(config: SupervisorConfig, bus: Arc<EventBus>) -> Result<Arc<Self>, SupervisorError> {
        let store = PersistStore::open(config.state_dir.clone()).await.map_err(SupervisorError::Persist)?;
        Ok(Arc::new(Self {
            config,
            store,
            bus,
            sessions: RwLock::new(HashMap::new()),
            light_cache: RwLock::new(None),
        }))
    }

    /// Startup reconciliation (`SPEC_FULL.md` §4.6): load persisted panes,
    /// query the live multiplexer, classify, recover what's alive, and
    /// schedule each recovered controller to start only after the grace
    /// period. Must run to completion before the listening socket opens.
    pub async fn reconcile_on_startup(self: &Arc<Self>) -> Result<(), SupervisorError> {
        let persisted_sessions = self.store.loaded_sessions().await;
        let persisted_panes = self.store.loaded_panes().await;
        let live_panes = self.config.mux.list_sessions().await.map_err(SupervisorError::Mux)?;

        let result = reconcile(&persisted_panes, &live_panes);

        let by_id: HashMap<SessionId, &PersistedSession> =
            persisted_sessions.iter().map(|s| (s.id, s)).collect();

        for pane in &result.alive {
            let Some(persisted) = by_id.get(&pane.session_id) else { continue };
            self.recover_session(persisted, &pane.mux_name).await;
        }

        for dead in &result.dead {
            tracing::info!(session = %dead.session_id, mux_name = %dead.mux_name, "persisted pane is gone, dropping");
            self.store.remove_session(dead.session_id).await;
            self.store.remove_pane(dead.session_id).await;
        }

        // A persisted session record still on disk for this pane name wins over
        // a guessed mode; `reconcile` only reaches `discovered` when no
        // `PersistedPane` matched, but a stale record can still carry the
        // mux name if the pane file and session file fell out of sync.
        let mode_by_mux_name: HashMap<&str, crate::session::Mode> = persisted_panes
            .iter()
            .filter_map(|p| by_id.get(&p.session_id).map(|s| (p.mux_name.as_str(), s.mode)))
            .collect();

        for discovered in &result.discovered {
            let mode = mode_by_mux_name
                .get(discovered.mux_name.as_str())
                .copied()
                .unwrap_or_else(|| guess_mode(discovered));
            self.adopt_discovered_pane(discovered, mode).await;
        }

        Ok(())
    }

    /// Adopt a live pane the multiplexer reports that has no persisted
    /// record (`SPEC_FULL.md` §4.6 step 3, "alive and unknown"). A fresh
    /// `Session` is built around it, persisted, and handed a dormant
    /// `RespawnController` scheduled to start after the same recovery grace
    /// period as a recovered session.
    async fn adopt_discovered_pane(self: &Arc<Self>, pane: &PaneRecord, mode: Mode) {
        let id = SessionId::new();
        let working_dir = std::env::current_dir().unwrap_or_else(|_| self.config.state_dir.clone());
        let session = Arc::new(Session::new(SessionConfig {
            id,
            working_dir: working_dir.clone(),
            mode,
            name: pane.mux_name.clone(),
            color: "gray".to_string(),
            mux: Arc::clone(&self.config.mux),
            event_capacity: EVENT_CAPACITY,
        }));
        session.attach(pane.mux_name.clone(), pane.pid).await;

        let controller = RespawnController::new(Arc::clone(&session), RespawnConfig::default(), self.config.oracle.clone());
        self.bridge_events(&session, &controller);
        self.sessions
            .write()
            .await
            .insert(id, Managed { session: Arc::clone(&session), controller: Arc::clone(&controller) });
        self.invalidate_cache().await;

        self.store
            .upsert_session(PersistedSession {
                id,
                mode,
                working_dir,
                name: pane.mux_name.clone(),
                color: "gray".to_string(),
                input_tokens: 0,
                output_tokens: 0,
                total_cost: 0.0,
                flags: Default::default(),
                respawn_config: None,
            })
            .await;
        self.store.upsert_pane(PersistedPane { session_id: id, mux_name: pane.mux_name.clone() }).await;
        tracing::info!(session = %id, mux_name = %pane.mux_name, ?mode, "adopted untracked live pane");

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(RECOVERY_GRACE_PERIOD).await;
            if let Some(managed) = this.sessions.read().await.get(&id) {
                managed.controller.start().await;
            }
        });
    }

    async fn recover_session(self: &Arc<Self>, persisted: &PersistedSession, mux_name: &str) {
        let session = Arc::new(Session::new(SessionConfig {
            id: persisted.id,
            working_dir: persisted.working_dir.clone(),
            mode: persisted.mode,
            name: persisted.name.clone(),
            color: persisted.color.clone(),
            mux: Arc::clone(&self.config.mux),
            event_capacity: EVENT_CAPACITY,
        }));
        session.attach(mux_name.to_string(), None).await;

        let config = persisted.respawn_config.clone().unwrap_or_default();
        let controller = RespawnController::new(Arc::clone(&session), config, self.config.oracle.clone());

        self.bridge_events(&session, &controller);
        self.sessions.write().await.insert(
            persisted.id,
            Managed { session: Arc::clone(&session), controller: Arc::clone(&controller) },
        );
        self.invalidate_cache().await;

        let this = Arc::clone(self);
        let id = persisted.id;
        tokio::spawn(async move {
            tokio::time::sleep(RECOVERY_GRACE_PERIOD).await;
            if let Some(managed) = this.sessions.read().await.get(&id) {
                managed.controller.start().await;
            }
        });
    }

    pub async fn create_session(
        self: &Arc<Self>,
        working_dir: PathBuf,
        mode: Mode,
        name: String,
        color: String,
        command: &[String],
        cols: u16,
        rows: u16,
    ) -> Result<Arc<Session>, SupervisorError> {
        if self.sessions.read().await.len() >= self.config.max_sessions {
            return Err(SupervisorError::TooManySessions { max: self.config.max_sessions });
        }

        let id = SessionId::new();
        let session = Arc::new(Session::new(SessionConfig {
            id,
            working_dir: working_dir.clone(),
            mode,
            name: name.clone(),
            color: color.clone(),
            mux: Arc::clone(&self.config.mux),
            event_capacity: EVENT_CAPACITY,
        }));
        session.start_interactive(command, cols, rows).await.map_err(SupervisorError::Session)?;

        let controller = RespawnController::new(Arc::clone(&session), RespawnConfig::default(), self.config.oracle.clone());
        self.bridge_events(&session, &controller);
        controller.start().await;

        self.sessions.write().await.insert(id, Managed { session: Arc::clone(&session), controller });
        self.invalidate_cache().await;

        self.store
            .upsert_session(PersistedSession {
                id,
                mode,
                working_dir,
                name,
                color,
                input_tokens: 0,
                output_tokens: 0,
                total_cost: 0.0,
                flags: Default::default(),
                respawn_config: None,
            })
            .await;
        if let Some(mux_name) = session.mux_name().await {
            self.store.upsert_pane(PersistedPane { session_id: id, mux_name }).await;
        }

        self.bus.publish(BusEvent::SessionCreated { session: session.light_snapshot().await }).await;
        Ok(session)
    }

    pub async fn get_session(&self, id: SessionId) -> Result<Arc<Session>, SupervisorError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|m| Arc::clone(&m.session))
            .ok_or(SupervisorError::NotFound { id })
    }

    /// Cached light-state list for the session index endpoint, invalidated
    /// only by lifecycle events (`SPEC_FULL.md` §4.3).
    pub async fn list_sessions(&self) -> Vec<LightSessionState> {
        if let Some(cached) = self.light_cache.read().await.as_ref() {
            return cached.clone();
        }
        let sessions = self.sessions.read().await;
        let mut list = Vec::with_capacity(sessions.len());
        for managed in sessions.values() {
            list.push(managed.session.light_snapshot().await);
        }
        *self.light_cache.write().await = Some(list.clone());
        list
    }

    async fn invalidate_cache(&self) {
        *self.light_cache.write().await = None;
    }

    /// Detach (leave the multiplexer pane running) or fully tear down a
    /// session. Matches the source's `cleanupSession(killMux)` split: a
    /// detach keeps the pane for a future reconciliation, a kill tallies
    /// lifetime stats and removes the persisted record outright.
    pub async fn cleanup_session(self: &Arc<Self>, id: SessionId, kill_mux: bool) -> Result<(), SupervisorError> {
        let managed = self.sessions.write().await.remove(&id).ok_or(SupervisorError::NotFound { id })?;
        managed.controller.stop().await;
        managed.session.stop(kill_mux).await.map_err(SupervisorError::Session)?;
        self.bus.discard_session(id).await;
        self.invalidate_cache().await;

        if kill_mux {
            let state = managed.session.snapshot().await;
            self.store.accumulate_lifetime(state.input_tokens, state.output_tokens, state.total_cost).await;
            self.store.remove_session(id).await;
            self.store.remove_pane(id).await;
        }

        self.bus.publish(BusEvent::SessionDeleted { id }).await;
        Ok(())
    }

    pub async fn handle_hook(&self, hook: HookEvent) -> Result<(), SupervisorError> {
        let controller = self
            .sessions
            .read()
            .await
            .get(&hook.session_id)
            .map(|m| Arc::clone(&m.controller))
            .ok_or(SupervisorError::NotFound { id: hook.session_id })?;
        controller.notify_hook(hook.event).await;
        Ok(())
    }

    pub async fn lifetime_stats(&self) -> LifetimeStats {
        self.store.lifetime_stats().await
    }

    pub async fn shutdown(self: &Arc<Self>) {
        let ids: Vec<SessionId> = self.sessions.read().await.keys().copied().collect();
        for id in ids {
            if let Some(managed) = self.sessions.read().await.get(&id) {
                managed.controller.stop().await;
            }
        }
        self.store.flush_all().await;
    }

    /// Forward a session's events onto the bus (terminal bytes batched
    /// separately) and feed respawn-relevant transitions to its controller
    /// via the controller's own subscription — wiring here only covers the
    /// bus fan-out and cache invalidation side.
    fn bridge_events(self: &Arc<Self>, session: &Arc<Session>, _controller: &Arc<RespawnController>) {
        let mut rx = session.subscribe();
        let this = Arc::clone(self);
        let session = Arc::clone(session);
        let id = session.id;
        tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                };
                match &event {
                    SessionEvent::Terminal { bytes } => {
                        this.bus.push_terminal(id, bytes.clone()).await;
                    }
                    SessionEvent::Exit { .. } => {
                        this.invalidate_cache().await;
                        this.bus.publish(BusEvent::SessionUpdated { session: session.light_snapshot().await }).await;
                        this.bus.publish(BusEvent::SessionState { id, inner: event }).await;
                        break;
                    }
                    SessionEvent::StatusBlock { .. } | SessionEvent::CircuitBreakerUpdate { .. } | SessionEvent::Idle | SessionEvent::Working => {
                        this.invalidate_cache().await;
                        this.bus.publish(BusEvent::SessionUpdated { session: session.light_snapshot().await }).await;
                        this.bus.publish(BusEvent::SessionState { id, inner: event }).await;
                    }
                    _ => {
                        this.bus.publish(BusEvent::SessionState { id, inner: event }).await;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
