use climavote_core::monitoring::Activation;
use climavote_core::votes::Adjustment;
use climavote_core::{Direction, Parameter};
use tokio::sync::oneshot;

use crate::errors::StationError;
use crate::services::station::StationSnapshot;

type Reply<T> = oneshot::Sender<Result<T, StationError>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoteStatus {
    /// Recorded; the batch needs more votes.
    Counting { count: usize },
    /// The batch completed and moved the target.
    Applied { mean: f64, adjustment: Adjustment },
    /// The batch completed with a zero mean.
    Neutral,
    /// Disabled parameter, nothing was recorded.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteReceipt {
    pub parameter: Parameter,
    /// `None` when the vote could not be stored.
    pub vote_id: Option<i32>,
    pub status: VoteStatus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Optimization {
    AlreadyOptimal { value: f64 },
    Started {
        target: f64,
        direction: Direction,
        activation: Activation,
    },
    Ignored,
}

pub(crate) enum Command {
    SubmitVote {
        user_id: i32,
        parameter: Parameter,
        value: i32,
        comment: Option<String>,
        reply: Reply<VoteReceipt>,
    },
    SubmitBallot {
        user_id: i32,
        votes: Vec<(Parameter, i32)>,
        comment: Option<String>,
        reply: Reply<Vec<VoteReceipt>>,
    },
    Optimize {
        parameter: Parameter,
        user_id: Option<i32>,
        reply: Reply<Optimization>,
    },
    StartMonitoring {
        parameter: Parameter,
        target: f64,
        direction: Direction,
        reply: Reply<Activation>,
    },
    StopMonitoring {
        parameter: Parameter,
        reply: Reply<bool>,
    },
    Indicate {
        parameter: Parameter,
        direction: Direction,
    },
    ClearIndicators,
    ReleaseIndicator {
        parameter: Parameter,
        generation: u64,
    },
    Refresh {
        reply: Reply<StationSnapshot>,
    },
    Poll {
        reply: Reply<StationSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}
