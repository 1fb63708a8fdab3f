// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Respawn controller: a 13-state machine per session that detects idle
//! through a signal hierarchy, optionally consults an AI oracle, and
//! drives the agent back to work.

mod oracle;
mod signals;
mod state;
mod timers;

pub use oracle::{HttpIdleOracle, IdleOracle, OracleQuestion};
pub use signals::IdleSignal;
pub use state::{RespawnConfig, RespawnState, StopReason};

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::events::{HookEventKind, SessionEvent};
use crate::progress::BreakerState;
use crate::session::{Session, SessionStatus};

use timers::{TimerName, TimerWheel};

#[derive(Debug, Clone)]
pub enum RespawnEvent {
    Started,
    StateChanged(RespawnState),
    Cycle(u64),
    Blocked(StopReason),
}

const AI_CHECK_PROMPT: &str =
    "You are monitoring a coding agent's terminal output. Reply with exactly \"yes\" if it is \
     waiting for user input, or \"no\" if it is still actively working.";

pub struct RespawnController {
    session: Arc<Session>,
    config: RwLock<RespawnConfig>,
    state: RwLock<RespawnState>,
    cycle_count: AtomicU64,
    update_retries: AtomicU32,
    oracle: Option<Arc<dyn IdleOracle>>,
    timers: Arc<TimerWheel>,
    events: broadcast::Sender<RespawnEvent>,
    hook_tx: mpsc::Sender<HookEventKind>,
    hook_rx: tokio::sync::Mutex<Option<mpsc::Receiver<HookEventKind>>>,
    fired_rx: tokio::sync::Mutex<Option<mpsc::Receiver<TimerName>>>,
    elicitation_pending: std::sync::atomic::AtomicBool,
    shutdown: CancellationToken,
    started_at: std::time::Instant,
}

impl RespawnController {
    pub fn new(session: Arc<Session>, config: RespawnConfig, oracle: Option<Arc<dyn IdleOracle>>) -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        let (hook_tx, hook_rx) = mpsc::channel(32);
        let (timers, fired_rx) = TimerWheel::new();
        Arc::new(Self {
            session,
            config: RwLock::new(config),
            state: RwLock::new(RespawnState::Stopped),
            cycle_count: AtomicU64::new(0),
            update_retries: AtomicU32::new(0),
            oracle,
            timers,
            events,
            hook_tx,
            hook_rx: tokio::sync::Mutex::new(Some(hook_rx)),
            fired_rx: tokio::sync::Mutex::new(Some(fired_rx)),
            elicitation_pending: std::sync::atomic::AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            started_at: std::time::Instant::now(),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RespawnEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> RespawnState {
        *self.state.read().await
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count.load(Ordering::SeqCst)
    }

    pub async fn notify_hook(&self, event: HookEventKind) {
        let _ = self.hook_tx.send(event).await;
    }

    /// Start the controller's run loop. No-op (returns immediately) if
    /// already started; callers that want to re-arm after `stop` must
    /// construct a new controller.
    pub async fn start(self: &Arc<Self>) {
        {
            let mut state = self.state.write().await;
            if *state != RespawnState::Stopped {
                return;
            }
            *state = RespawnState::Watching;
        }
        let _ = self.events.send(RespawnEvent::Started);

        let hook_rx = self.hook_rx.lock().await.take();
        let fired_rx = self.fired_rx.lock().await.take();
        let (Some(hook_rx), Some(fired_rx)) = (hook_rx, fired_rx) else { return };

        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(hook_rx, fired_rx).await });

        if let Some(minutes) = self.config.read().await.duration_minutes {
            self.timers.schedule(TimerName::Duration, Duration::from_secs(minutes * 60)).await;
        }
    }

    pub async fn stop(&self) {
        self.shutdown.cancel();
        self.timers.cancel_all().await;
        self.transition(RespawnState::Stopped).await;
        let _ = self.events.send(RespawnEvent::Blocked(StopReason::Explicit));
    }

    async fn transition(&self, next: RespawnState) {
        *self.state.write().await = next;
        let _ = self.events.send(RespawnEvent::StateChanged(next));
    }

    async fn stop_with_reason(&self, reason: StopReason) {
        self.timers.cancel_all().await;
        self.transition(RespawnState::Stopped).await;
        let _ = self.events.send(RespawnEvent::Blocked(reason));
    }

    async fn run(self: Arc<Self>, mut hook_rx: mpsc::Receiver<HookEventKind>, mut fired_rx: mpsc::Receiver<TimerName>) {
        let mut session_events = self.session.subscribe();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                Ok(event) = session_events.recv() => self.on_session_event(event).await,
                Some(hook) = hook_rx.recv() => self.on_hook_event(hook).await,
                Some(timer) = fired_rx.recv() => self.on_timer(timer).await,
                else => return,
            }
            if self.state().await == RespawnState::Stopped {
                return;
            }
        }
    }

    async fn on_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Idle => self.on_idle_observed(IdleSignal::PromptChar).await,
            SessionEvent::Working => {
                let current = self.state().await;
                if !matches!(current, RespawnState::Watching | RespawnState::Stopped) {
                    // New content arrived while we were confirming/waiting:
                    // treat it as the agent resuming on its own.
                    self.timers.cancel_all().await;
                    self.transition(RespawnState::Watching).await;
                }
            }
            SessionEvent::CircuitBreakerUpdate { status } if status.state == BreakerState::Open => {
                self.stop_with_reason(StopReason::NoProgressOpen).await;
            }
            SessionEvent::StatusBlock { block } if block.status == crate::progress::WorkStatus::Blocked => {
                self.stop_with_reason(StopReason::StatusBlocked).await;
            }
            SessionEvent::ExitGateMet => self.stop_with_reason(StopReason::ExitGateMet).await,
            SessionEvent::Error { .. } => self.stop_with_reason(StopReason::FatalError).await,
            SessionEvent::Exit { .. } => self.stop_with_reason(StopReason::PaneDead).await,
            _ => {}
        }
    }

    async fn on_hook_event(&self, event: HookEventKind) {
        match event {
            HookEventKind::IdlePrompt | HookEventKind::Stop | HookEventKind::TeammateIdle | HookEventKind::TaskCompleted => {
                self.on_idle_observed(IdleSignal::Definitive).await;
            }
            HookEventKind::ElicitationDialog => {
                self.elicitation_pending.store(true, Ordering::SeqCst);
            }
            HookEventKind::PermissionPrompt => {
                if self.elicitation_pending.load(Ordering::SeqCst) {
                    return;
                }
                let config = self.config.read().await;
                if config.auto_accept_prompts {
                    let delay = Duration::from_millis(config.auto_accept_delay_ms.max(0) as u64);
                    drop(config);
                    self.timers.schedule(TimerName::AutoAccept, delay).await;
                }
            }
        }
    }

    async fn on_idle_observed(&self, signal: IdleSignal) {
        let state = self.state().await;
        if state != RespawnState::Watching {
            return;
        }
        if signal.bypasses_confirmation() {
            self.timers.cancel_all().await;
            self.transition(RespawnState::SendingUpdate).await;
            self.do_send_update().await;
            return;
        }
        self.transition(RespawnState::ConfirmingIdle).await;
        let delay = Duration::from_millis(self.config.read().await.completion_confirm_ms.max(0) as u64);
        self.timers.schedule(TimerName::ConfirmIdle, delay).await;
    }

    async fn on_timer(&self, timer: TimerName) {
        match timer {
            TimerName::ConfirmIdle => self.on_confirm_idle_elapsed().await,
            TimerName::AiCheck => self.on_ai_check_elapsed().await,
            TimerName::WaitUpdate => self.on_wait_update_timeout().await,
            TimerName::InterStep => self.on_inter_step_elapsed().await,
            TimerName::WaitInit => self.transition(RespawnState::MonitoringInit).await,
            TimerName::WaitKickstart => self.transition(RespawnState::Watching).await,
            TimerName::AutoAccept => self.do_auto_accept().await,
            TimerName::Duration => self.stop_with_reason(StopReason::DurationExpired).await,
        }
    }

    async fn on_confirm_idle_elapsed(&self) {
        if self.state().await != RespawnState::ConfirmingIdle {
            return;
        }
        let ai_enabled = self.config.read().await.ai_idle_check_enabled && self.oracle.is_some();
        if ai_enabled {
            self.transition(RespawnState::AiChecking).await;
            self.run_ai_check().await;
        } else {
            self.transition(RespawnState::SendingUpdate).await;
            self.do_send_update().await;
        }
    }

    async fn run_ai_check(&self) {
        let Some(oracle) = &self.oracle else {
            self.transition(RespawnState::SendingUpdate).await;
            self.do_send_update().await;
            return;
        };
        let config = self.config.read().await;
        let model = config.ai_idle_check_model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());
        let max_context = config.ai_idle_check_max_context;
        drop(config);

        let recent_output = {
            let buffers = self.session.buffers().read().await;
            let text = &buffers.text_output;
            let start = text.len().saturating_sub(max_context);
            let mut start = start;
            while start < text.len() && !text.is_char_boundary(start) {
                start += 1;
            }
            text[start..].to_string()
        };

        let verdict = oracle
            .ask(OracleQuestion { model, recent_output, prompt: AI_CHECK_PROMPT })
            .await;

        if self.state().await != RespawnState::AiChecking {
            return;
        }
        match verdict {
            Some(false) => self.transition(RespawnState::Watching).await,
            _ => {
                self.transition(RespawnState::SendingUpdate).await;
                self.do_send_update().await;
            }
        }
    }

    async fn on_ai_check_elapsed(&self) {
        // Reserved for a future cooldown-tracking timer; the oracle call
        // itself carries its own timeout via `IdleOracle::ask`.
    }

    async fn do_send_update(&self) {
        let prompt = self.config.read().await.update_prompt.clone();
        let _ = self.session.write_via_mux(format!("{prompt}\r").as_bytes()).await;
        self.cycle_count.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.send(RespawnEvent::Cycle(self.cycle_count.load(Ordering::SeqCst)));
        self.transition(RespawnState::WaitingUpdate).await;
        let timeout = Duration::from_millis(self.config.read().await.no_output_timeout_ms.max(0) as u64);
        self.timers.schedule(TimerName::WaitUpdate, timeout).await;
    }

    async fn on_wait_update_timeout(&self) {
        if self.state().await != RespawnState::WaitingUpdate {
            return;
        }
        let status = self.session.snapshot().await.status;
        if status == SessionStatus::Busy {
            // The agent engaged with the update we just sent: forward motion
            // observed outside of a status block, so reset the breaker's
            // no-progress counters (`SPEC_FULL.md` §4.5 "external progress hint").
            crate::progress::notify_iteration_progress(&self.session, self.cycle_count()).await;
            self.advance_past_update().await;
            return;
        }
        let retries = self.update_retries.fetch_add(1, Ordering::SeqCst) + 1;
        let max_retries = self.config.read().await.max_update_retries;
        if retries >= max_retries {
            self.stop_with_reason(StopReason::NoOutputRetriesExhausted).await;
            return;
        }
        self.do_send_update().await;
    }

    async fn advance_past_update(&self) {
        self.update_retries.store(0, Ordering::SeqCst);
        let config = self.config.read().await;
        if config.send_clear {
            let delay = Duration::from_millis(config.inter_step_delay_ms.max(0) as u64);
            drop(config);
            self.transition(RespawnState::SendingClear).await;
            let _ = self.session.write_via_mux(b"/clear\r").await;
            self.transition(RespawnState::WaitingClear).await;
            self.timers.schedule(TimerName::InterStep, delay).await;
        } else if config.send_init {
            let delay = Duration::from_millis(config.inter_step_delay_ms.max(0) as u64);
            drop(config);
            self.transition(RespawnState::SendingInit).await;
            let _ = self.session.write_via_mux(b"/init\r").await;
            self.transition(RespawnState::WaitingInit).await;
            self.timers.schedule(TimerName::WaitInit, delay).await;
        } else {
            self.maybe_kickstart().await;
        }
    }

    async fn on_inter_step_elapsed(&self) {
        let config = self.config.read().await;
        let state = self.state().await;
        if state == RespawnState::WaitingClear {
            if config.send_init {
                let delay = Duration::from_millis(config.inter_step_delay_ms.max(0) as u64);
                drop(config);
                self.transition(RespawnState::SendingInit).await;
                let _ = self.session.write_via_mux(b"/init\r").await;
                self.transition(RespawnState::WaitingInit).await;
                self.timers.schedule(TimerName::WaitInit, delay).await;
            } else {
                drop(config);
                self.maybe_kickstart().await;
            }
        }
    }

    async fn maybe_kickstart(&self) {
        let kickstart = self.config.read().await.kickstart_prompt.clone();
        if kickstart.is_empty() {
            self.transition(RespawnState::Watching).await;
            return;
        }
        self.transition(RespawnState::SendingKickstart).await;
        let _ = self.session.write_via_mux(format!("{kickstart}\r").as_bytes()).await;
        self.transition(RespawnState::WaitingKickstart).await;
        let delay = Duration::from_millis(self.config.read().await.inter_step_delay_ms.max(0) as u64);
        self.timers.schedule(TimerName::WaitKickstart, delay).await;
    }

    async fn do_auto_accept(&self) {
        if self.elicitation_pending.load(Ordering::SeqCst) {
            return;
        }
        // Accept keystroke: Enter by default, matching a default-selected
        // permission option.
        let _ = self.session.write_via_mux(b"\r").await;
    }

    /// How long this controller has been alive — used by the supervisor to
    /// enforce the post-restart grace period before calling [`Self::start`].
    pub fn age(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
