use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::comfort::clamp_target;
use crate::error::CoreError;
use crate::parameter::{Direction, Parameter};

/// Number of votes that make up one batch.
pub const BATCH_SIZE: usize = 5;

/// Largest id span of the five most recent votes still treated as an
/// already-consumed batch.
pub const STALE_ID_SPAN: i64 = 20;

/// A single vote: negative asks for more, positive asks for less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct VoteValue(i8);

impl VoteValue {
    pub const MIN: i32 = -3;
    pub const MAX: i32 = 3;

    pub fn get(&self) -> i32 {
        i32::from(self.0)
    }
}

impl TryFrom<i32> for VoteValue {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as i8))
        } else {
            Err(CoreError::VoteOutOfRange(value))
        }
    }
}

impl From<VoteValue> for i32 {
    fn from(value: VoteValue) -> Self {
        value.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoteOutcome {
    /// The batch is still filling up.
    Counting { count: usize },
    /// The batch completed; the counter is back at zero.
    Complete { mean: f64 },
}

#[derive(Debug, Default)]
struct Tally {
    count: usize,
    recent: VecDeque<i32>,
}

impl Tally {
    fn push(&mut self, value: i32) {
        if self.recent.len() == BATCH_SIZE {
            self.recent.pop_front();
        }
        self.recent.push_back(value);
    }

    fn mean(&self) -> f64 {
        if self.recent.is_empty() {
            return 0.0;
        }
        let sum: i32 = self.recent.iter().sum();
        f64::from(sum) / self.recent.len() as f64
    }
}

/// Per-(user, parameter) rolling vote counters.
#[derive(Debug, Default)]
pub struct VoteTally {
    tallies: HashMap<(i32, Parameter), Tally>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seeded(&self, user_id: i32, parameter: Parameter) -> bool {
        self.tallies.contains_key(&(user_id, parameter))
    }

    pub fn count(&self, user_id: i32, parameter: Parameter) -> usize {
        self.tallies
            .get(&(user_id, parameter))
            .map(|tally| tally.count)
            .unwrap_or(0)
    }

    /// Seeds a counter from persisted votes, given newest first as `(id, value)`.
    ///
    /// Five recent votes whose ids lie within [`STALE_ID_SPAN`] of each other
    /// belong to a batch that has already been consumed, so the counter
    /// restarts. Five votes spread further apart leave the batch one vote from
    /// completion.
    pub fn seed(&mut self, user_id: i32, parameter: Parameter, history: &[(i64, i32)]) {
        let window: Vec<_> = history.iter().take(BATCH_SIZE).collect();

        let count = match window.as_slice() {
            [first, .., last] if window.len() == BATCH_SIZE => {
                if first.0 - last.0 <= STALE_ID_SPAN {
                    0
                } else {
                    BATCH_SIZE - 1
                }
            }
            _ => window.len(),
        };

        let mut tally = Tally { count, recent: VecDeque::with_capacity(BATCH_SIZE) };
        for (_, value) in window.iter().rev() {
            tally.push(*value);
        }

        tracing::debug!("Seeded {} vote counter for user {} at {}", parameter, user_id, count);
        self.tallies.insert((user_id, parameter), tally);
    }

    pub fn record(&mut self, user_id: i32, parameter: Parameter, value: VoteValue) -> VoteOutcome {
        let tally = self.tallies.entry((user_id, parameter)).or_default();
        tally.push(value.get());
        tally.count = (tally.count + 1).min(BATCH_SIZE);

        if tally.count == BATCH_SIZE {
            tally.count = 0;
            VoteOutcome::Complete { mean: tally.mean() }
        } else {
            VoteOutcome::Counting { count: tally.count }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub target: f64,
    pub direction: Direction,
    /// Magnitude of the requested change before clamping.
    pub change: f64,
}

/// Turns a batch mean into a clamped target; a zero mean asks for nothing.
pub fn derive_adjustment(parameter: Parameter, mean: f64, current: f64) -> Option<Adjustment> {
    let (requested, direction) = if mean < 0.0 {
        (current + mean.abs(), Direction::Up)
    } else if mean > 0.0 {
        (current - mean, Direction::Down)
    } else {
        return None;
    };

    Some(Adjustment {
        target: clamp_target(parameter, requested),
        direction,
        change: mean.abs(),
    })
}
