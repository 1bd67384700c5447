//! Runs a [`BreathingSession`] on its own task.
//!
//! The runner task is the only owner of the session. Control commands and
//! ticks are handled one at a time by the same loop, so a command is never
//! interleaved with a tick. Observers get state through a watch channel and
//! discrete notifications through a broadcast channel.

use crate::feedback::Feedback;
use crate::session::{
    BreathingSession, BreathingSettings, SessionError, SessionEvent, SessionSnapshot,
    SessionStatus, SessionSummary, TickOutcome, TICK_INTERVAL_MS,
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

pub mod ticker;

pub use ticker::TickDriver;

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

enum Command {
    Start(Reply<SessionSnapshot>),
    Pause(Reply<SessionSnapshot>),
    Toggle(Reply<SessionSnapshot>),
    Reset(Reply<SessionSnapshot>),
    ApplySettings(BreathingSettings, Reply<SessionSnapshot>),
    StartAgain(Reply<SessionSnapshot>),
    Complete(Reply<SessionSummary>),
}

pub struct SessionRunner {
    session: BreathingSession,
    driver: TickDriver,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionRunner {
    /// Spawns the runner task on the current tokio runtime.
    pub fn spawn(
        settings: BreathingSettings,
        feedback: Feedback,
    ) -> Result<SessionHandle, SessionError> {
        let (runner, handle) = Self::new(settings, feedback)?;
        tokio::spawn(runner.run());
        Ok(handle)
    }

    fn new(
        settings: BreathingSettings,
        feedback: Feedback,
    ) -> Result<(Self, SessionHandle), SessionError> {
        let session = BreathingSession::new(settings, feedback)?;
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

        let runner = SessionRunner {
            session,
            driver: TickDriver::new(Duration::from_millis(TICK_INTERVAL_MS)),
            commands: command_rx,
            snapshots: snapshot_tx,
            events: event_tx.clone(),
        };

        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
        };
        Ok((runner, handle))
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                // Commands win over a simultaneously ready tick, so a pause is
                // never followed by a stale tick.
                biased;

                command = self.commands.recv() => {
                    let Some(command) = command else {
                        tracing::info!(
                            "All handles dropped, tearing down session {}",
                            self.session.session_id()
                        );
                        break;
                    };
                    if !self.handle(command) {
                        break;
                    }
                }
                _ = self.driver.tick() => self.on_tick(),
            }
        }
    }

    /// Returns false once the session has been closed.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Start(reply) => {
                let result = self.transition(|s| s.start());
                let _ = reply.send(result);
            }
            Command::Pause(reply) => {
                let result = self.transition(|s| {
                    s.pause();
                    Ok(())
                });
                let _ = reply.send(result);
            }
            Command::Toggle(reply) => {
                let result = self.transition(|s| s.toggle());
                let _ = reply.send(result);
            }
            Command::Reset(reply) => {
                self.session.reset();
                self.emit(SessionEvent::Reset);
                let _ = reply.send(Ok(self.sync()));
            }
            Command::ApplySettings(settings, reply) => {
                let result = match self.session.apply_settings(settings) {
                    Ok(()) => {
                        self.emit(SessionEvent::SettingsApplied { settings });
                        Ok(self.sync())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            Command::StartAgain(reply) => {
                self.session.start_again();
                self.emit(SessionEvent::Reset);
                let _ = reply.send(Ok(self.sync()));
            }
            Command::Complete(reply) => {
                let summary = self.session.complete_session();
                self.sync();
                self.emit(SessionEvent::Closed {
                    summary: summary.clone(),
                });
                let _ = reply.send(Ok(summary));
                return false;
            }
        }
        true
    }

    /// Runs a start/pause style operation and reports the status change.
    fn transition(
        &mut self,
        op: impl FnOnce(&mut BreathingSession) -> Result<(), SessionError>,
    ) -> Result<SessionSnapshot, SessionError> {
        let before = self.session.status();
        op(&mut self.session)?;
        let after = self.session.status();

        match (before, after) {
            (SessionStatus::Idle, SessionStatus::Running) => self.emit(SessionEvent::Started),
            (SessionStatus::Running, SessionStatus::Idle) => self.emit(SessionEvent::Paused),
            _ => {}
        }

        Ok(self.sync())
    }

    fn on_tick(&mut self) {
        match self.session.tick() {
            TickOutcome::Idle => {
                self.driver.release();
                return;
            }
            TickOutcome::Progressed => {}
            TickOutcome::PhaseChanged {
                phase,
                round_advanced,
            } => {
                let round = self.session.current_round();
                if round_advanced {
                    self.emit(SessionEvent::RoundAdvanced { round });
                }
                self.emit(SessionEvent::PhaseChanged { phase, round });
            }
            TickOutcome::Completed => {
                self.emit(SessionEvent::Completed {
                    rounds: self.session.settings().total_rounds,
                });
            }
        }

        self.sync();
    }

    /// Aligns the tick driver with the session and publishes a snapshot.
    fn sync(&mut self) -> SessionSnapshot {
        let active = self.session.is_active();
        if active != self.driver.is_armed() {
            if active {
                self.driver.acquire();
            } else {
                self.driver.release();
            }
        }

        let snapshot = self.session.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Cloneable control surface for a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub async fn start(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(Command::Start).await
    }

    pub async fn pause(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(Command::Pause).await
    }

    pub async fn toggle(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(Command::Toggle).await
    }

    pub async fn reset(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(Command::Reset).await
    }

    pub async fn apply_settings(
        &self,
        settings: BreathingSettings,
    ) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::ApplySettings(settings, reply))
            .await
    }

    pub async fn start_again(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(Command::StartAgain).await
    }

    /// Closes the session. The runner stops and later commands fail with `Closed`.
    pub async fn complete_session(&self) -> Result<SessionSummary, SessionError> {
        self.request(Command::Complete).await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(make(reply_tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }
}
