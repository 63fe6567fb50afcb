use derive_more::Display;
use serde::{Deserialize, Serialize};

/// `Stopped -> Starting -> Running -> Stopping -> Stopped`
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayerState {
    #[default]
    #[display("stopped")]
    Stopped,
    #[display("starting")]
    Starting,
    #[display("running")]
    Running,
    #[display("stopping")]
    Stopping,
}

impl RelayerState {
    pub fn is_running(&self) -> bool {
        *self == RelayerState::Running
    }
}
