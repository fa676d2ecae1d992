//! The fixed pipeline stages.

mod access_log;
mod recover;
mod status_count;

pub use access_log::AccessLogStage;
pub use recover::RecoverStage;
pub use status_count::{StatusCountStage, StatusCounters, StatusSnapshot};
