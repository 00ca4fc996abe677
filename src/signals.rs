use nix::sys::signal::{signal, SigHandler, Signal};

/// Signals the shell ignores while it is running so that an interactive
/// interrupt does not kill the read loop.
const IGNORED: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// Initialize shell signal handlers
pub fn init() {
    for sig in IGNORED {
        // Note: rustyline overrides SIGINT during readline() calls, which is fine.
        if let Err(e) = unsafe { signal(sig, SigHandler::SigIgn) } {
            tracing::warn!("failed to ignore {}: {}", sig, e);
        }
    }
}

/// Restore default signal handlers (for child processes)
///
/// Called between `fork` and `exec`; an ignored disposition would otherwise
/// survive into the new program.
pub fn restore_default() {
    for sig in IGNORED {
        let _ = unsafe { signal(sig, SigHandler::SigDfl) };
    }
}
