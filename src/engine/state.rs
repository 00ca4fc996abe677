use super::job_control::BackgroundJobs;

/// Everything that outlives a single command within one shell session.
#[derive(Debug, Default)]
pub struct ShellState {
    /// Status of the most recent command; consulted by `&&`/`||` and `status`.
    pub last_status: i32,
    /// Background children that have not been reaped yet.
    pub jobs: BackgroundJobs,
}

impl ShellState {
    pub fn new() -> Self {
        ShellState::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    KeepRunning,
    Exit,
}
