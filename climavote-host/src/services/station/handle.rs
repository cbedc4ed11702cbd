use std::time::Duration;

use climavote_core::acquisition::SensorHealth;
use climavote_core::comfort::{RangeStatus, classify};
use climavote_core::monitoring::{Activation, MonitoringState};
use climavote_core::{Direction, Parameter};
use tokio::sync::{mpsc, oneshot, watch};

use crate::errors::StationError;
use crate::services::station::StationSnapshot;
use crate::services::station::command::{Command, Optimization, VoteReceipt};

const TEST_STEP: Duration = Duration::from_secs(1);
const TEST_HOLD: Duration = Duration::from_secs(2);

/// Cloneable front door to a running station.
///
/// Queries read the latest published snapshot and never wait on the station
/// loop; commands are queued and answered in order.
#[derive(Clone)]
pub struct StationHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<StationSnapshot>,
}

impl StationHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>, snapshot: watch::Receiver<StationSnapshot>) -> Self {
        Self { commands, snapshot }
    }

    pub fn snapshot(&self) -> StationSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StationSnapshot> {
        self.snapshot.clone()
    }

    pub fn current_value(&self, parameter: Parameter) -> f64 {
        self.snapshot.borrow().value(parameter)
    }

    pub fn status(&self, parameter: Parameter) -> RangeStatus {
        classify(parameter, self.current_value(parameter))
    }

    pub fn sensor_health(&self) -> SensorHealth {
        self.snapshot.borrow().health
    }

    pub fn monitoring_state(&self, parameter: Parameter) -> MonitoringState {
        self.snapshot
            .borrow()
            .parameter(parameter)
            .map(|view| view.monitoring)
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<T, StationError>>) -> Command,
    ) -> Result<T, StationError> {
        let (reply, response) = oneshot::channel();
        self.commands.send(command(reply)).await?;
        response.await?
    }

    pub async fn submit_vote(
        &self,
        user_id: i32,
        parameter: Parameter,
        value: i32,
        comment: Option<String>,
    ) -> Result<VoteReceipt, StationError> {
        self.request(|reply| Command::SubmitVote {
            user_id,
            parameter,
            value,
            comment,
            reply,
        })
        .await
    }

    /// Submits several votes at once; the comment is stored with the first one.
    pub async fn submit_ballot(
        &self,
        user_id: i32,
        votes: Vec<(Parameter, i32)>,
        comment: Option<String>,
    ) -> Result<Vec<VoteReceipt>, StationError> {
        self.request(|reply| Command::SubmitBallot {
            user_id,
            votes,
            comment,
            reply,
        })
        .await
    }

    pub async fn request_manual_optimization(
        &self,
        parameter: Parameter,
        user_id: Option<i32>,
    ) -> Result<Optimization, StationError> {
        self.request(|reply| Command::Optimize {
            parameter,
            user_id,
            reply,
        })
        .await
    }

    pub async fn start_monitoring(
        &self,
        parameter: Parameter,
        target: f64,
        direction: Direction,
    ) -> Result<Activation, StationError> {
        self.request(|reply| Command::StartMonitoring {
            parameter,
            target,
            direction,
            reply,
        })
        .await
    }

    pub async fn stop_monitoring(&self, parameter: Parameter) -> Result<bool, StationError> {
        self.request(|reply| Command::StopMonitoring { parameter, reply }).await
    }

    /// Snapshot taken after every command queued before this call was applied.
    pub async fn refresh(&self) -> Result<StationSnapshot, StationError> {
        self.request(|reply| Command::Refresh { reply }).await
    }

    /// Runs one acquisition cycle out of schedule, storing a sample like a regular cycle.
    pub async fn poll_now(&self) -> Result<StationSnapshot, StationError> {
        self.request(|reply| Command::Poll { reply }).await
    }

    pub(crate) async fn indicate(&self, parameter: Parameter, direction: Direction) -> Result<(), StationError> {
        self.commands.send(Command::Indicate { parameter, direction }).await?;
        Ok(())
    }

    /// Turns every indicator off, then relights those of parameters still being monitored.
    pub(crate) async fn clear_indicators(&self) -> Result<(), StationError> {
        self.commands.send(Command::ClearIndicators).await?;
        Ok(())
    }

    /// Walks every indicator through decrease then increase, then clears them.
    pub async fn run_indicator_test(&self) -> Result<(), StationError> {
        tracing::info!("Starting indicator self-test");

        for direction in [Direction::Down, Direction::Up] {
            for parameter in Parameter::ACTIVE {
                self.indicate(parameter, direction).await?;
                tokio::time::sleep(TEST_STEP).await;
            }
            tokio::time::sleep(TEST_HOLD).await;
        }

        self.clear_indicators().await?;
        tracing::info!("Indicator self-test finished");

        Ok(())
    }

    /// Turns every indicator off and stops the station loop.
    pub async fn shutdown(&self) -> Result<(), StationError> {
        let (reply, done) = oneshot::channel();
        self.commands.send(Command::Shutdown { reply }).await?;
        done.await?;
        Ok(())
    }
}
