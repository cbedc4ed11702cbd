mod feedback;
mod sensor_sample;
mod user;
mod vote;

pub use feedback::FeedbackRepository;
pub use sensor_sample::SensorSampleRepository;
pub use user::UserRepository;
pub use vote::VoteRepository;
