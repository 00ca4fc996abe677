use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use signal_hook::consts::SIGCHLD;
use signal_hook::iterator::{Handle, Signals};
use tracing::{debug, warn};

use crate::error::{Result, ShellError};

/// Background children of the shell, shared with the reaper thread.
#[derive(Debug, Clone, Default)]
pub struct BackgroundJobs {
    pids: Arc<Mutex<HashSet<Pid>>>,
}

impl BackgroundJobs {
    /// Lock the set. The executor holds this across `fork` so the reaper can
    /// never look for a child before it has been recorded.
    pub fn lock(&self) -> MutexGuard<'_, HashSet<Pid>> {
        self.pids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Collect every background child that has terminated, without blocking.
    /// Returns the reaped pids with their statuses.
    ///
    /// Only members of the set are waited on, so a foreground child that the
    /// executor is blocked on is never collected here.
    pub fn reap(&self) -> Vec<(Pid, i32)> {
        let mut pids = self.lock();
        let mut reaped = Vec::new();

        pids.retain(|&pid| match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(_, code)) => {
                reaped.push((pid, code));
                false
            }
            Ok(WaitStatus::Signaled(_, sig, _)) => {
                reaped.push((pid, 128 + sig as i32));
                false
            }
            Ok(_) => true,
            Err(Errno::ECHILD) => {
                // Already collected elsewhere; nothing left to track.
                false
            }
            Err(e) => {
                warn!("waitpid({}) failed: {}", pid, e);
                true
            }
        });

        for (pid, code) in &reaped {
            debug!("reaped background child {} (status {})", pid, code);
        }
        reaped
    }
}

/// Drains terminated background children whenever SIGCHLD arrives.
///
/// Signals are received on a dedicated thread through `signal-hook`, so the
/// job set is only ever touched from ordinary code, never from inside a
/// signal handler.
pub struct Reaper {
    handle: Handle,
    thread: Option<thread::JoinHandle<()>>,
}

impl Reaper {
    pub fn spawn(jobs: BackgroundJobs) -> Result<Self> {
        let mut signals = Signals::new([SIGCHLD]).map_err(ShellError::Signal)?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("reaper".to_string())
            .spawn(move || {
                for _ in signals.forever() {
                    jobs.reap();
                }
            })
            .map_err(ShellError::Signal)?;

        Ok(Reaper { handle, thread: Some(thread) })
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
