use climavote_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StationError {
    #[error("Station is not running")]
    Stopped,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Ballot contains no votes")]
    EmptyBallot,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for StationError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        StationError::Stopped
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for StationError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        StationError::Stopped
    }
}
