mod command;
mod handle;
mod service;
mod snapshot;

pub use command::{Optimization, VoteReceipt, VoteStatus};
pub use handle::StationHandle;
pub use service::{StationConfig, StationService};
pub use snapshot::{ParameterView, StationSnapshot};
