use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use climavote_core::acquisition::{Acquisition, AcquisitionMode};
use climavote_core::comfort::{RangeStatus, clamp_target, classify, comfort_range};
use climavote_core::indicator::{IndicatorDriver, OutputPin};
use climavote_core::monitoring::{Activation, MonitoringEngine, TargetReached, TrendTracker};
use climavote_core::votes::{BATCH_SIZE, VoteOutcome, VoteTally, VoteValue, derive_adjustment};
use climavote_core::{Direction, Parameter};
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::configs::{Station, Storage};
use crate::errors::StationError;
use crate::hardware::{Devices, SensorBus};
use crate::models::{Feedback, SensorSample, Vote};
use crate::repositories::{FeedbackRepository, SensorSampleRepository, VoteRepository};
use crate::services::station::command::{Command, Optimization, VoteReceipt, VoteStatus};
use crate::services::station::{StationHandle, StationSnapshot};

const COMMAND_QUEUE_SIZE: usize = 64;

#[derive(Debug, Clone)]
pub struct StationConfig {
    pub interval: Duration,
    pub release_delay: Duration,
}

impl StationConfig {
    pub fn new(station: &Station, mode: AcquisitionMode) -> Self {
        let interval = match mode {
            AcquisitionMode::Real => station.real_interval(),
            AcquisitionMode::Simulated => station.simulated_interval(),
        };

        Self {
            interval,
            release_delay: station.release_delay(),
        }
    }
}

struct PendingRelease {
    generation: u64,
    task: JoinHandle<()>,
}

/// Single owner of acquisition, monitoring, vote counters and indicators.
///
/// Every mutation arrives through the command queue or the polling timer, so
/// readers only ever see the published [`StationSnapshot`].
pub struct StationService {
    config: StationConfig,
    sensors: Box<dyn SensorBus>,
    indicator: IndicatorDriver<Box<dyn OutputPin>>,
    acquisition: Acquisition,
    monitoring: MonitoringEngine,
    trends: TrendTracker,
    tally: VoteTally,
    generations: HashMap<Parameter, u64>,
    releases: HashMap<Parameter, PendingRelease>,
    cycles: u64,
    sampled_at: Option<OffsetDateTime>,
    samples: SensorSampleRepository,
    feedback: FeedbackRepository,
    votes: VoteRepository,
    storage: Arc<Storage>,
    snapshot_tx: watch::Sender<StationSnapshot>,
    command_tx: Option<mpsc::WeakSender<Command>>,
}

impl StationService {
    pub fn new(storage: Arc<Storage>, devices: Devices, config: StationConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(StationSnapshot::initial(devices.mode));

        Self {
            config,
            sensors: devices.sensors,
            indicator: IndicatorDriver::new(devices.pins),
            acquisition: Acquisition::new(devices.mode),
            monitoring: MonitoringEngine::new(),
            trends: TrendTracker::default(),
            tally: VoteTally::new(),
            generations: HashMap::new(),
            releases: HashMap::new(),
            cycles: 0,
            sampled_at: None,
            samples: SensorSampleRepository::new(storage.clone()),
            feedback: FeedbackRepository::new(storage.clone()),
            votes: VoteRepository::new(storage.clone()),
            storage,
            snapshot_tx,
            command_tx: None,
        }
    }

    /// Spawns the station loop and returns the handle used to talk to it.
    pub fn start(mut self) -> (StationHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_SIZE);
        self.command_tx = Some(command_tx.downgrade());

        if let Err(e) = self.indicator.init() {
            tracing::error!("Failed to reset indicators: {}", e);
        }

        let handle = StationHandle::new(command_tx, self.snapshot_tx.subscribe());
        let task = tokio::spawn(self.run(command_rx));

        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Station running in {:?} mode, polling every {:?}",
            self.acquisition.mode(),
            self.config.interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.shutdown();
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => {
                        self.shutdown();
                        break;
                    }
                }
            }
        }

        tracing::info!("Station stopped after {} cycles", self.cycles);
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::SubmitVote { user_id, parameter, value, comment, reply } => {
                let result = self.submit_vote(user_id, parameter, value, comment).await;
                let _ = reply.send(result);
            }
            Command::SubmitBallot { user_id, votes, comment, reply } => {
                let result = self.submit_ballot(user_id, votes, comment).await;
                let _ = reply.send(result);
            }
            Command::Optimize { parameter, user_id, reply } => {
                let result = self.optimize(parameter, user_id).await;
                let _ = reply.send(Ok(result));
            }
            Command::StartMonitoring { parameter, target, direction, reply } => {
                let activation = self.apply_target(parameter, target, direction);
                let _ = reply.send(Ok(activation));
            }
            Command::StopMonitoring { parameter, reply } => {
                let stopped = self.stop_monitoring(parameter);
                let _ = reply.send(Ok(stopped));
            }
            Command::Indicate { parameter, direction } => {
                if let Err(e) = self.indicator.indicate(parameter, direction) {
                    tracing::error!("Failed to light indicator for {}: {}", parameter, e);
                }
            }
            Command::ClearIndicators => self.clear_indicators(),
            Command::ReleaseIndicator { parameter, generation } => {
                self.release_indicator(parameter, generation);
            }
            Command::Refresh { reply } => {
                let _ = reply.send(Ok(self.snapshot_tx.borrow().clone()));
                return;
            }
            Command::Poll { reply } => {
                self.tick().await;
                let _ = reply.send(Ok(self.snapshot_tx.borrow().clone()));
                return;
            }
            // Handled by the run loop
            Command::Shutdown { .. } => {}
        }

        self.publish();
    }

    /// One acquisition cycle.
    async fn tick(&mut self) {
        let climate = self.sensors.read_climate().await;
        self.acquisition.ingest_climate(climate);

        let ambient = self.sensors.read_ambient().await;
        self.acquisition.ingest_ambient(ambient);

        let readings = *self.acquisition.readings();

        for reached in self.monitoring.evaluate(&readings) {
            self.on_target_reached(reached).await;
        }

        self.trends.update(&readings, &self.monitoring);
        self.cycles += 1;

        let sample = SensorSample::from_readings(&readings, OffsetDateTime::now_utc());
        match Self::store_sample(&self.storage, &self.samples, &sample).await {
            Ok(_) => self.sampled_at = Some(sample.time),
            Err(e) => tracing::error!("Failed to store sensor sample: {}", e),
        }

        self.publish();
    }

    async fn on_target_reached(&mut self, reached: TargetReached) {
        tracing::info!(
            "Target {:.2} for {} reached at {:.2}",
            reached.target,
            reached.parameter,
            reached.value
        );

        self.schedule_release(reached.parameter);

        let message = format!("Exact match reached for {}: {:.1}", reached.parameter, reached.value);
        self.record_feedback(message, None).await;
    }

    /// Turns the indicator off after the release delay unless a newer target claims it.
    fn schedule_release(&mut self, parameter: Parameter) {
        let generation = self.generation(parameter);
        let delay = self.config.release_delay;
        let Some(command_tx) = self.command_tx.clone() else {
            self.release_indicator(parameter, generation);
            return;
        };

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(sender) = command_tx.upgrade() {
                let _ = sender.send(Command::ReleaseIndicator { parameter, generation }).await;
            }
        });

        if let Some(previous) = self.releases.insert(parameter, PendingRelease { generation, task }) {
            previous.task.abort();
        }
    }

    fn release_indicator(&mut self, parameter: Parameter, generation: u64) {
        if self.generation(parameter) != generation {
            tracing::debug!("Ignoring superseded indicator release for {}", parameter);
            return;
        }
        if self.releases.get(&parameter).is_some_and(|pending| pending.generation == generation) {
            self.releases.remove(&parameter);
        }
        if self.monitoring.is_active(parameter) {
            return;
        }
        if let Err(e) = self.indicator.turn_off(parameter) {
            tracing::error!("Failed to turn off indicator for {}: {}", parameter, e);
        }
    }

    fn generation(&self, parameter: Parameter) -> u64 {
        self.generations.get(&parameter).copied().unwrap_or(0)
    }

    /// Invalidates any pending release for the parameter.
    fn supersede(&mut self, parameter: Parameter) {
        *self.generations.entry(parameter).or_insert(0) += 1;
        if let Some(pending) = self.releases.remove(&parameter) {
            pending.task.abort();
        }
    }

    fn apply_target(&mut self, parameter: Parameter, target: f64, direction: Direction) -> Activation {
        let activation = self.monitoring.start(parameter, target, direction);
        if activation == Activation::Rejected {
            return activation;
        }

        self.supersede(parameter);

        if let Err(e) = self.indicator.indicate(parameter, direction) {
            tracing::error!("Failed to light indicator for {}: {}", parameter, e);
        }
        self.sensors.apply_target(parameter, target, direction);

        activation
    }

    fn clear_indicators(&mut self) {
        if let Err(e) = self.indicator.turn_off_all() {
            tracing::error!("Failed to clear indicators: {}", e);
        }

        // Targets still being pursued keep their indicator
        let active: Vec<_> = Parameter::ACTIVE
            .into_iter()
            .filter_map(|parameter| {
                let state = self.monitoring.state(parameter);
                state.direction.filter(|_| state.active).map(|direction| (parameter, direction))
            })
            .collect();

        for (parameter, direction) in active {
            if let Err(e) = self.indicator.indicate(parameter, direction) {
                tracing::error!("Failed to restore indicator for {}: {}", parameter, e);
            }
        }
    }

    fn stop_monitoring(&mut self, parameter: Parameter) -> bool {
        if parameter.is_disabled() {
            tracing::warn!("Ignoring stop request for disabled parameter {}", parameter);
            return false;
        }

        let stopped = self.monitoring.stop(parameter);
        self.supersede(parameter);

        if let Err(e) = self.indicator.turn_off(parameter) {
            tracing::error!("Failed to turn off indicator for {}: {}", parameter, e);
        }

        stopped
    }

    async fn submit_vote(
        &mut self,
        user_id: i32,
        parameter: Parameter,
        value: i32,
        comment: Option<String>,
    ) -> Result<VoteReceipt, StationError> {
        let vote = VoteValue::try_from(value)?;

        if parameter.is_disabled() {
            tracing::warn!("Ignoring vote from user {} for disabled parameter {}", user_id, parameter);
            return Ok(VoteReceipt {
                parameter,
                vote_id: None,
                status: VoteStatus::Ignored,
            });
        }

        if !self.tally.is_seeded(user_id, parameter) {
            let history = match self.votes.find_recent(user_id, parameter, BATCH_SIZE as i64).await {
                Ok(history) => history,
                Err(e) => {
                    tracing::error!("Failed to load vote history for user {}: {}", user_id, e);
                    Vec::new()
                }
            };
            self.tally.seed(user_id, parameter, &history);
        }

        let record = Vote {
            id: 0,
            parameter: parameter.as_str().to_string(),
            value: vote.get(),
            comment: comment.filter(|c| !c.trim().is_empty()),
            user_id,
            time: OffsetDateTime::now_utc(),
        };
        let vote_id = match Self::store_vote(&self.storage, &self.votes, &record).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!("Failed to store vote: {}", e);
                None
            }
        };

        let status = match self.tally.record(user_id, parameter, vote) {
            VoteOutcome::Counting { count } => {
                tracing::debug!("User {} has {}/{} votes for {}", user_id, count, BATCH_SIZE, parameter);
                VoteStatus::Counting { count }
            }
            VoteOutcome::Complete { mean } => self.apply_batch(user_id, parameter, mean).await,
        };

        Ok(VoteReceipt { parameter, vote_id, status })
    }

    async fn apply_batch(&mut self, user_id: i32, parameter: Parameter, mean: f64) -> VoteStatus {
        let current = self.acquisition.current_value(parameter);

        let Some(adjustment) = derive_adjustment(parameter, mean, current) else {
            tracing::info!("Vote batch for {} by user {} is neutral", parameter, user_id);
            return VoteStatus::Neutral;
        };

        self.apply_target(parameter, adjustment.target, adjustment.direction);

        let action = match adjustment.direction {
            Direction::Up => "Increase",
            Direction::Down => "Decrease",
        };
        let message = format!(
            "{} {}: mean {:.2}, change {:.2}, target {:.2}",
            action, parameter, mean, adjustment.change, adjustment.target
        );
        self.record_feedback(message, Some(user_id)).await;

        VoteStatus::Applied { mean, adjustment }
    }

    async fn submit_ballot(
        &mut self,
        user_id: i32,
        votes: Vec<(Parameter, i32)>,
        comment: Option<String>,
    ) -> Result<Vec<VoteReceipt>, StationError> {
        if votes.is_empty() {
            return Err(StationError::EmptyBallot);
        }
        for (_, value) in &votes {
            VoteValue::try_from(*value)?;
        }

        let mut comment = comment;
        let mut receipts = Vec::with_capacity(votes.len());

        for (parameter, value) in votes {
            // The comment belongs to the ballot and is stored once
            let vote_comment = if parameter.is_disabled() { None } else { comment.take() };
            receipts.push(self.submit_vote(user_id, parameter, value, vote_comment).await?);
        }

        Ok(receipts)
    }

    async fn optimize(&mut self, parameter: Parameter, user_id: Option<i32>) -> Optimization {
        if parameter.is_disabled() {
            tracing::warn!("Ignoring optimization request for disabled parameter {}", parameter);
            return Optimization::Ignored;
        }

        let current = self.acquisition.current_value(parameter);
        if classify(parameter, current) == RangeStatus::Optimal {
            tracing::info!("{} is already optimal at {:.2}", parameter, current);
            return Optimization::AlreadyOptimal { value: current };
        }

        let midpoint = comfort_range(parameter).optimal.midpoint();
        let direction = if midpoint > current { Direction::Up } else { Direction::Down };
        let target = clamp_target(parameter, midpoint);

        let activation = self.apply_target(parameter, target, direction);

        let message = format!("Manual optimization of {}: {:.1} -> {:.1}", parameter, current, target);
        self.record_feedback(message, user_id).await;

        Optimization::Started { target, direction, activation }
    }

    async fn record_feedback(&mut self, message: String, user_id: Option<i32>) {
        let entry = Feedback::new(self.acquisition.readings(), message, user_id);
        if let Err(e) = Self::store_feedback(&self.storage, &self.feedback, &entry).await {
            tracing::error!("Failed to store feedback: {}", e);
        }
    }

    // Store helpers borrow single fields so the loop future stays `Send`

    async fn store_sample(
        storage: &Storage,
        repository: &SensorSampleRepository,
        sample: &SensorSample,
    ) -> Result<i32, sqlx::Error> {
        let mut tx = storage.get_pool().begin().await?;
        let id = repository.create(sample, &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn store_feedback(
        storage: &Storage,
        repository: &FeedbackRepository,
        entry: &Feedback,
    ) -> Result<i32, sqlx::Error> {
        let mut tx = storage.get_pool().begin().await?;
        let id = repository.create(entry, &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn store_vote(storage: &Storage, repository: &VoteRepository, vote: &Vote) -> Result<i32, sqlx::Error> {
        let mut tx = storage.get_pool().begin().await?;
        let id = repository.create(vote, &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    fn publish(&self) {
        let snapshot = StationSnapshot::capture(
            self.cycles,
            self.sampled_at,
            self.acquisition.readings(),
            self.acquisition.health(),
            &self.monitoring,
            &self.trends,
            |parameter| self.indicator.state(parameter),
        );
        self.snapshot_tx.send_replace(snapshot);
    }

    fn shutdown(&mut self) {
        for (_, pending) in self.releases.drain() {
            pending.task.abort();
        }
        if let Err(e) = self.indicator.turn_off_all() {
            tracing::error!("Failed to turn off indicators on shutdown: {}", e);
        }
        self.publish();
    }
}
