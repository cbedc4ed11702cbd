mod feedback;
mod sensor_sample;
mod user;
mod vote;

pub use feedback::{Feedback, FeedbackTable};
pub use sensor_sample::{SensorSample, SensorSampleTable};
pub use user::{User, UserTable};
pub use vote::{CommentEntry, Vote, VoteTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
