// Ring state machine
//
// Two states, Idle and Ringing, driven by the scorer's per-sample
// decision. Only the transitions emit events; self-loops are silent.
// The enter/exit asymmetry some strategies carry internally (distinct
// thresholds) is exactly the hysteresis this machine generalizes: the
// scorer decides Match/NoMatch however it likes, the machine only
// reacts to changes.

use serde::{Deserialize, Serialize};

/// Per-sample decision produced by a similarity scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Match,
    NoMatch,
}

/// Detection state. Created Idle at startup; mutated only by
/// `RingStateMachine::step`; lives until process exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingState {
    Idle,
    Ringing,
}

/// Discrete event emitted on a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RingEvent {
    /// Idle -> Ringing: the live signal started matching the baseline
    Started { index: u64, score: f64 },
    /// Ringing -> Idle: the match ended
    Stopped { index: u64 },
}

/// Turns the continuous decision stream into discrete events.
#[derive(Debug)]
pub struct RingStateMachine {
    state: RingState,
}

impl RingStateMachine {
    pub fn new() -> Self {
        Self {
            state: RingState::Idle,
        }
    }

    pub fn state(&self) -> RingState {
        self.state
    }

    /// Advance by one decision. Returns the event for a transition,
    /// None for a self-loop.
    pub fn step(&mut self, decision: Decision, index: u64, score: f64) -> Option<RingEvent> {
        match (self.state, decision) {
            (RingState::Idle, Decision::Match) => {
                self.state = RingState::Ringing;
                Some(RingEvent::Started { index, score })
            }
            (RingState::Ringing, Decision::NoMatch) => {
                self.state = RingState::Idle;
                Some(RingEvent::Stopped { index })
            }
            _ => None,
        }
    }

    /// Back to Idle without emitting (e.g. when swapping baselines).
    pub fn reset(&mut self) {
        self.state = RingState::Idle;
    }
}

impl Default for RingStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        let machine = RingStateMachine::new();
        assert_eq!(machine.state(), RingState::Idle);
    }

    #[test]
    fn test_decision_sequence_emits_started_then_stopped() {
        let mut machine = RingStateMachine::new();
        let decisions = [
            Decision::NoMatch,
            Decision::Match,
            Decision::Match,
            Decision::NoMatch,
        ];

        let events: Vec<RingEvent> = decisions
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| machine.step(d, i as u64, 0.95))
            .collect();

        assert_eq!(
            events,
            vec![
                RingEvent::Started {
                    index: 1,
                    score: 0.95
                },
                RingEvent::Stopped { index: 3 },
            ]
        );
    }

    #[test]
    fn test_self_loops_are_silent() {
        let mut machine = RingStateMachine::new();
        assert_eq!(machine.step(Decision::NoMatch, 0, 0.0), None);
        assert!(machine.step(Decision::Match, 1, 1.0).is_some());
        assert_eq!(machine.step(Decision::Match, 2, 1.0), None);
        assert_eq!(machine.state(), RingState::Ringing);
    }

    #[test]
    fn test_reset_returns_to_idle_without_event() {
        let mut machine = RingStateMachine::new();
        machine.step(Decision::Match, 0, 1.0);
        assert_eq!(machine.state(), RingState::Ringing);
        machine.reset();
        assert_eq!(machine.state(), RingState::Idle);
    }

    #[test]
    fn test_event_json_shape() {
        let event = RingEvent::Started {
            index: 42,
            score: 0.97,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"started\""));
        assert!(json.contains("\"index\":42"));
    }
}
