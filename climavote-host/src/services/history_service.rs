use std::sync::Arc;

use climavote_core::Parameter;
use climavote_core::statistics::{SMOOTHING_WINDOW, Summary, smooth, summarize};
use time::{Duration, OffsetDateTime};

use crate::configs::Storage;
use crate::models::{CommentEntry, Feedback, SensorSample};
use crate::repositories::{FeedbackRepository, SensorSampleRepository, VoteRepository};

pub const HISTORY_CAP: i64 = 5000;
pub const FEEDBACK_LIMIT: i64 = 100;
pub const COMMENT_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPeriod {
    All,
    LastHours(u32),
}

#[derive(Clone)]
pub struct HistoryService {
    samples: SensorSampleRepository,
    feedback: FeedbackRepository,
    votes: VoteRepository,
}

impl HistoryService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            samples: SensorSampleRepository::new(storage.clone()),
            feedback: FeedbackRepository::new(storage.clone()),
            votes: VoteRepository::new(storage),
        }
    }

    /// Stored samples for the period, oldest first.
    pub async fn sensor_history(&self, period: HistoryPeriod) -> Result<Vec<SensorSample>, sqlx::Error> {
        match period {
            HistoryPeriod::All => {
                let mut samples = self.samples.find_latest(HISTORY_CAP).await?;
                samples.reverse();
                Ok(samples)
            }
            HistoryPeriod::LastHours(hours) => {
                let since = OffsetDateTime::now_utc() - Duration::hours(i64::from(hours));
                self.samples.find_since(since).await
            }
        }
    }

    pub async fn series(&self, parameter: Parameter, period: HistoryPeriod) -> Result<Vec<f64>, sqlx::Error> {
        let samples = self.sensor_history(period).await?;

        Ok(samples.iter().map(|sample| sample.value(parameter)).collect())
    }

    pub async fn parameter_statistics(
        &self,
        parameter: Parameter,
        period: HistoryPeriod,
    ) -> Result<Option<Summary>, sqlx::Error> {
        if parameter.is_disabled() {
            return Ok(None);
        }

        let values = self.series(parameter, period).await?;

        Ok(summarize(parameter, &values))
    }

    pub async fn smoothed_series(&self, parameter: Parameter, period: HistoryPeriod) -> Result<Vec<f64>, sqlx::Error> {
        let values = self.series(parameter, period).await?;

        Ok(smooth(&values, SMOOTHING_WINDOW))
    }

    pub async fn feedback_history(&self, user_id: i32) -> Result<Vec<Feedback>, sqlx::Error> {
        self.feedback.find_for_user(user_id, FEEDBACK_LIMIT).await
    }

    pub async fn comment_history(&self) -> Result<Vec<CommentEntry>, sqlx::Error> {
        self.votes.find_comments(COMMENT_LIMIT).await
    }
}
