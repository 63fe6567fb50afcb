use tokio::task::{JoinError, JoinHandle};

/// The tokio tasks making up a running relayer.
/// Joined as a whole so nothing outlives shutdown.
#[derive(Debug, Default)]
pub struct RelayerTask {
    subtasks: Vec<JoinHandle<()>>,
}

impl RelayerTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subtask(&mut self, subtask: JoinHandle<()>) {
        self.subtasks.push(subtask);
    }

    pub fn is_finished(&self) -> bool {
        self.subtasks.iter().all(JoinHandle::is_finished)
    }

    /// Waits for every subtask, even after one of them fails.
    /// Returns the first failure.
    pub async fn join(self) -> Result<(), JoinError> {
        let mut first_error = None;

        for subtask in self.subtasks {
            if let Err(join_error) = subtask.await {
                first_error.get_or_insert(join_error);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
