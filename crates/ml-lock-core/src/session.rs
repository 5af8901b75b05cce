//! Lock session and its controller
//!
//! The controller owns the single live [`Session`] and the three
//! subordinate components. Everything runs on one logical thread: input
//! events and scheduled tasks are handled one at a time, each to
//! completion, so no partially applied transition is ever visible.

use std::future::Future;
use std::io;
use std::time::Duration;

use crossterm::event::Event;
use futures::{Stream, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::LockConfig;
use crate::credential::Verifier;
use crate::directives::{Environment, EnvironmentDirectives};
use crate::enforcer::PresentationEnforcer;
use crate::entry::EntryBuffer;
use crate::error::{LockError, Result};
use crate::gate::{GateDecision, InputGate};
use crate::lockout::{LockoutMachine, Phase, SubmitOutcome, TickOutcome};
use crate::scheduler::{Scheduler, Task};
use crate::surface::{LockSurface, SessionView};

/// Cooldown countdown period
const COOLDOWN_TICK: Duration = Duration::from_secs(1);

/// Upper bound on an idle loop wait when nothing is scheduled
const IDLE_WAIT: Duration = Duration::from_secs(60);

/// The single live lock instance
#[derive(Debug)]
pub struct Session {
    started_at: Instant,
    entry: EntryBuffer,
    lockout: LockoutMachine,
}

impl Session {
    pub fn new(started_at: Instant, cooldown_secs: u32) -> Self {
        Self {
            started_at,
            entry: EntryBuffer::new(),
            lockout: LockoutMachine::new(cooldown_secs),
        }
    }

    pub fn phase(&self) -> Phase {
        self.lockout.phase()
    }

    pub fn entry(&self) -> &EntryBuffer {
        &self.entry
    }

    pub fn lockout(&self) -> &LockoutMachine {
        &self.lockout
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn view(&self, now: Instant) -> SessionView {
        SessionView {
            elapsed: self.elapsed(now),
            masked_len: self.entry.len(),
            cursor: self.entry.cursor(),
        }
    }
}

/// Whether the loop keeps going after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Successful authentication; emitted once
    Complete,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The correct secret was entered
    Unlocked,
    /// Administrative termination
    Terminated,
}

/// Top-level orchestrator of a lock session
pub struct SessionController<S, V, D> {
    session: Session,
    surface: S,
    verifier: V,
    enforcer: PresentationEnforcer<D>,
    gate: InputGate,
    scheduler: Scheduler,
    config: LockConfig,
    overview_disabled: bool,
    switching_disabled: bool,
    complete: bool,
    torn_down: bool,
}

impl<S, V, D> SessionController<S, V, D>
where
    S: LockSurface,
    V: Verifier,
    D: EnvironmentDirectives,
{
    pub fn new(
        surface: S,
        verifier: V,
        enforcer: PresentationEnforcer<D>,
        config: LockConfig,
        now: Instant,
    ) -> Self {
        Self {
            session: Session::new(now, config.cooldown_secs),
            surface,
            verifier,
            enforcer,
            gate: InputGate::new(),
            scheduler: Scheduler::new(),
            config,
            overview_disabled: false,
            switching_disabled: false,
            complete: false,
            torn_down: false,
        }
    }

    /// The live session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The lock surface
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the lock surface
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The input gate, for its discard count
    pub fn gate(&self) -> &InputGate {
        &self.gate
    }

    /// Pending enforcement and cooldown tasks
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The presentation enforcer
    pub fn enforcer(&self) -> &PresentationEnforcer<D> {
        &self.enforcer
    }

    /// Whether the correct secret has been entered
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Take the input grab, harden the environment and start enforcement
    ///
    /// Failing to grab input is fatal: a lock that cannot hold input must
    /// not pretend to be locked.
    pub async fn start(&mut self, now: Instant) -> Result<()> {
        self.surface.grab_input()?;
        info!(
            "Lock session started ({:?} environment)",
            self.enforcer.environment()
        );

        self.enforcer.directives_mut().disable_overview().await;
        self.overview_disabled = true;
        if self.enforcer.environment() == Environment::Composited {
            self.enforcer.directives_mut().disable_switching().await;
            self.switching_disabled = true;
        }

        if let Err(e) = self.surface.set_fullscreen() {
            debug!("Initial fullscreen request failed (ignored): {}", e);
        }
        self.enforcer.enforce_focus(&mut self.surface, self.session.phase());

        self.scheduler
            .schedule_after(Task::Setup, now, self.config.setup_delay());
        self.scheduler
            .schedule_after(Task::Raise, now, self.config.raise_interval());
        self.scheduler
            .schedule_after(Task::Focus, now, self.config.focus_interval());
        self.scheduler
            .schedule_after(Task::Clock, now, self.config.clock_interval());

        self.present(now);
        Ok(())
    }

    /// Handle one event from the environment
    pub fn handle_event(&mut self, event: &Event, now: Instant) -> Flow {
        if self.complete {
            return Flow::Complete;
        }

        let flow = match event {
            Event::Resize(width, height) => {
                self.surface.notice_resize(*width, *height);
                Flow::Continue
            }
            Event::FocusGained => {
                self.surface.notice_focus(true);
                Flow::Continue
            }
            Event::FocusLost => {
                self.surface.notice_focus(false);
                self.enforcer
                    .enforce_focus(&mut self.surface, self.session.phase());
                Flow::Continue
            }
            _ => match self.gate.decide(event, self.session.phase()) {
                GateDecision::Insert(c) => {
                    self.session.entry.insert(c);
                    Flow::Continue
                }
                GateDecision::Edit(key) => {
                    self.session.entry.edit(key);
                    Flow::Continue
                }
                GateDecision::Submit => self.submit(now),
                GateDecision::Discard => Flow::Continue,
            },
        };

        if flow == Flow::Continue {
            self.present(now);
        }
        flow
    }

    fn submit(&mut self, now: Instant) -> Flow {
        let outcome = self
            .session
            .lockout
            .submit(self.session.entry.secret(), &self.verifier);

        match outcome {
            SubmitOutcome::Unlocked => {
                self.complete = true;
                Flow::Complete
            }
            SubmitOutcome::Rejected { .. } => {
                self.session.entry.clear();
                self.surface.detach_entry();
                self.scheduler
                    .schedule_after(Task::CooldownTick, now, COOLDOWN_TICK);
                Flow::Continue
            }
            SubmitOutcome::Ignored => Flow::Continue,
        }
    }

    /// Run one scheduled task and re-register it
    ///
    /// The next run is measured from when this one finished, so a slow
    /// run pushes the task back instead of causing a burst of catch-up
    /// runs.
    pub async fn run_task(&mut self, task: Task, now: Instant) {
        let phase = self.session.phase();
        match task {
            Task::Setup => self.enforcer.setup(&mut self.surface, phase).await,
            Task::Raise => self.enforcer.reassert_stacking(&mut self.surface).await,
            Task::FullscreenCheck => self.enforcer.check_fullscreen(&mut self.surface, phase),
            Task::Focus => self.enforcer.enforce_focus(&mut self.surface, phase),
            Task::Clock | Task::CooldownTick => {}
        }

        let finished = now.max(Instant::now());
        match task {
            Task::Setup => {
                self.scheduler.schedule_after(
                    Task::FullscreenCheck,
                    finished,
                    self.config.fullscreen_interval(),
                );
            }
            Task::Raise => {
                self.scheduler
                    .schedule_after(Task::Raise, finished, self.config.raise_interval());
            }
            Task::FullscreenCheck => {
                self.scheduler.schedule_after(
                    Task::FullscreenCheck,
                    finished,
                    self.config.fullscreen_interval(),
                );
            }
            Task::Focus => {
                self.scheduler
                    .schedule_after(Task::Focus, finished, self.config.focus_interval());
            }
            Task::Clock => {
                self.scheduler
                    .schedule_after(Task::Clock, finished, self.config.clock_interval());
            }
            Task::CooldownTick => match self.session.lockout.tick() {
                TickOutcome::Counting { remaining } => {
                    debug!("Cooldown: {}s remaining", remaining);
                    self.scheduler
                        .schedule_after(Task::CooldownTick, finished, COOLDOWN_TICK);
                }
                TickOutcome::Released => {
                    self.scheduler.cancel(Task::CooldownTick);
                    self.surface.attach_entry();
                    self.enforcer
                        .enforce_focus(&mut self.surface, self.session.phase());
                    debug!("Cooldown finished, entry restored");
                }
                TickOutcome::Idle => {}
            },
        }
        self.present(finished);
    }

    /// Run every task that is due
    pub async fn run_due(&mut self, now: Instant) {
        while let Some(task) = self.scheduler.pop_due(now) {
            self.run_task(task, now).await;
        }
    }

    /// Release the grab and restore anything disabled for hardening
    ///
    /// Runs at most once; every step is best-effort.
    pub async fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Err(e) = self.surface.release_input() {
            warn!("Failed to release input grab: {}", e);
        }
        if self.overview_disabled {
            self.enforcer.directives_mut().restore_overview().await;
        }
        if self.switching_disabled {
            self.enforcer.directives_mut().restore_switching().await;
        }
        info!("Lock session ended");
    }

    /// Drive the session until unlock, termination or input loss
    ///
    /// Teardown always runs before this returns.
    pub async fn run<E, F>(&mut self, mut events: E, shutdown: F) -> Result<SessionEnd>
    where
        E: Stream<Item = io::Result<Event>> + Unpin,
        F: Future<Output = ()>,
    {
        if let Err(e) = self.start(Instant::now()).await {
            self.teardown().await;
            return Err(e);
        }
        tokio::pin!(shutdown);

        let result = loop {
            let deadline = self
                .scheduler
                .next_deadline()
                .unwrap_or_else(|| Instant::now() + IDLE_WAIT);

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    self.run_due(Instant::now()).await;
                }
                event = events.next() => match event {
                    Some(Ok(event)) => {
                        if self.handle_event(&event, Instant::now()) == Flow::Complete {
                            break Ok(SessionEnd::Unlocked);
                        }
                    }
                    Some(Err(e)) => warn!("Input error (ignored): {}", e),
                    None => break Err(LockError::InputClosed),
                },
                _ = &mut shutdown => {
                    warn!("Administrative termination requested");
                    break Ok(SessionEnd::Terminated);
                }
            }
        };

        self.teardown().await;
        result
    }

    fn present(&mut self, now: Instant) {
        let view = self.session.view(now);
        if let Err(e) = self.surface.present(&view) {
            debug!("Failed to draw frame: {}", e);
        }
    }
}
