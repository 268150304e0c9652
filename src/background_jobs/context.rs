use tokio_util::sync::CancellationToken;

/// Context provided to a job execution.
#[derive(Clone)]
pub struct JobContext {
    /// Token to check for cancellation requests.
    pub cancellation_token: CancellationToken,
}

impl JobContext {
    pub fn new(cancellation_token: CancellationToken) -> Self {
        Self { cancellation_token }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
