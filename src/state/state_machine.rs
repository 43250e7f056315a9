use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Phases a play-through moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Session created but no round drawn yet.
    NotStarted,
    /// A round is on screen and waits for its answer.
    InRound,
    /// The last answer was correct; the next round appears after the presentation delay.
    AwaitingNextRound,
    /// A wrong answer ended the game.
    GameOver,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Begin (or restart) a play-through.
    Start,
    /// The player picked the right option.
    AnsweredCorrectly,
    /// The player picked a wrong option.
    AnsweredIncorrectly,
    /// The presentation delay elapsed; draw the next round.
    NextRound,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: SessionPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: u64,
}

/// Phase bookkeeping for one game session.
///
/// The version doubles as the generation token for delayed round respawns: a respawn
/// scheduled at version `n` is only honoured while the machine is still at `n`.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    version: u64,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            version: 0,
        }
    }
}

impl SessionStateMachine {
    /// Create a new state machine in the not-started phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Validate `event` against the current phase without applying it, returning the phase it
    /// would lead to.
    pub fn check(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        self.compute_transition(event)
    }

    /// Apply `event`, moving to the next phase and bumping the version.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (
                SessionPhase::NotStarted
                | SessionPhase::GameOver
                | SessionPhase::AwaitingNextRound,
                SessionEvent::Start,
            ) => SessionPhase::InRound,
            (SessionPhase::InRound, SessionEvent::AnsweredCorrectly) => {
                SessionPhase::AwaitingNextRound
            }
            (SessionPhase::InRound, SessionEvent::AnsweredIncorrectly) => SessionPhase::GameOver,
            (SessionPhase::AwaitingNextRound, SessionEvent::NextRound) => SessionPhase::InRound,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
