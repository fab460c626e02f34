use crate::clock::Clock;
use crate::scene::Scene;
use crate::source::SnapshotSource;
use crate::sync::SceneSynchronizer;
use forage_common::Snapshot;
use log::{debug, error, info, warn};
use std::time::Duration;

/// Why the poll loop stopped. There is no way back from either.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The server reported the simulation as finished.
    Finished,
    /// A request failed or its body could not be decoded.
    TransportError,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Polling,
    Stopped(StopReason),
}

/// Drives a [`SceneSynchronizer`] from a [`SnapshotSource`].
///
/// Each tick issues exactly one request and waits for it before doing anything
/// else; the loop sleeps `interval` on its [`Clock`] between ticks.
pub struct PollLoop<S: Scene, T: SnapshotSource, C: Clock> {
    sync: SceneSynchronizer<S>,
    source: T,
    clock: C,
    interval: Duration,
    state: LoopState,
    polls: u64,
}

impl<S: Scene, T: SnapshotSource, C: Clock> PollLoop<S, T, C> {
    pub fn new(sync: SceneSynchronizer<S>, source: T, clock: C, interval: Duration) -> Self {
        Self { sync, source, clock, interval, state: LoopState::Idle, polls: 0 }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of requests issued so far.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn synchronizer(&self) -> &SceneSynchronizer<S> {
        &self.sync
    }

    pub fn source(&self) -> &T {
        &self.source
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Performs one poll and reconcile without sleeping. Does nothing once stopped.
    pub fn tick(&mut self) -> LoopState {
        self.tick_with(&mut |_: &Snapshot| {})
    }

    fn tick_with(&mut self, observe: &mut dyn FnMut(&Snapshot)) -> LoopState {
        if let LoopState::Stopped(_) = self.state {
            return self.state;
        }
        self.state = LoopState::Polling;
        self.polls += 1;

        match self.source.poll_once() {
            Ok(snapshot) => {
                self.sync.reconcile(&snapshot);
                if let Err(e) = self.sync.scene_mut().present() {
                    warn!("Failed to present frame after poll {}: {}", self.polls, e);
                }
                observe(&snapshot);
                debug!(
                    "Poll {}: {} agents ({} carrying), {} food",
                    self.polls,
                    snapshot.agents.len(),
                    snapshot.carrying_count(),
                    snapshot.food.len()
                );
                if snapshot.finished {
                    info!("Simulation finished after {} polls. No more steps will be requested.", self.polls);
                    self.state = LoopState::Stopped(StopReason::Finished);
                }
            }
            Err(e) => {
                error!("Server error, stopping sync: {}", e);
                self.state = LoopState::Stopped(StopReason::TransportError);
            }
        }
        self.state
    }

    /// Polls until a terminal state is reached.
    pub fn run(&mut self) -> StopReason {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), handing every applied snapshot to `observe`.
    pub fn run_with<F: FnMut(&Snapshot)>(&mut self, mut observe: F) -> StopReason {
        loop {
            match self.tick_with(&mut observe) {
                LoopState::Stopped(reason) => return reason,
                _ => self.clock.sleep(self.interval),
            }
        }
    }

    pub fn into_synchronizer(self) -> SceneSynchronizer<S> {
        self.sync
    }
}
