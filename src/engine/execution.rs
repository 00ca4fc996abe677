use std::ffi::{c_char, CString};
use std::ptr;
use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};

use nix::errno::Errno;
use nix::libc::{self, STDERR_FILENO};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, write, ForkResult, Pid};
use tracing::debug;

use crate::builtins;
use crate::error::ShellError;
use crate::parser::{Command, Condition};
use crate::signals;

use super::pipe::PipeRegistry;
use super::redirect::{attach, label, Stream};
use super::state::{ExecutionResult, ShellState};

/// Child exit status when a redirect or pipe end cannot be set up.
pub const ENDPOINT_FAILURE: i32 = 1;
/// Child exit status when the program cannot be started.
pub const EXEC_FAILURE: i32 = 127;

// ── Child side ────────────────────────────────────────────────────────────

/// Write straight to fd 2; safe to call between `fork` and `exec`.
fn write_stderr(parts: &[&[u8]]) {
    for part in parts {
        let _ = write(io::stderr(), part);
    }
}

fn child_fail(what: &[u8], errno: Errno, code: i32) -> ! {
    let reason = match (code, errno) {
        (EXEC_FAILURE, Errno::ENOENT) => "command not found",
        _ => errno.desc(),
    };
    write_stderr(&[b"pipsh: ", what, b": ", reason.as_bytes(), b"\n"]);
    unsafe { libc::_exit(code) }
}

/// Wire up stdin/stdout, drop inherited pipe descriptors and replace the
/// process image. Never returns.
fn run_child(cmd: &Command, argv: &[*const c_char], close_queue: &[RawFd]) -> ! {
    signals::restore_default();

    if let Err(errno) = attach(&cmd.input, Stream::Stdin) {
        child_fail(label(&cmd.input), errno, ENDPOINT_FAILURE);
    }
    if let Err(errno) = attach(&cmd.output, Stream::Stdout) {
        child_fail(label(&cmd.output), errno, ENDPOINT_FAILURE);
    }

    // Pipe ends still open in the shell belong to sibling stages (or are our
    // own originals, already duplicated onto 0/1).
    for &fd in close_queue {
        if fd > STDERR_FILENO {
            // The shell still owns these; the child's copy is ours to close.
            drop(unsafe { OwnedFd::from_raw_fd(fd) });
        }
    }

    unsafe { libc::execvp(argv[0], argv.as_ptr()) };
    child_fail(name_bytes(cmd), Errno::last(), EXEC_FAILURE)
}

fn name_bytes(cmd: &Command) -> &[u8] {
    cmd.name().unwrap_or_default().as_bytes()
}

// ── Parent side ───────────────────────────────────────────────────────────

fn c_args(args: &[String]) -> Result<Vec<CString>, ShellError> {
    args.iter()
        .map(|arg| CString::new(arg.as_bytes()).map_err(|_| ShellError::NulArgument(arg.clone())))
        .collect()
}

/// NULL-terminated `argv` for `execvp`, borrowing from `args`.
fn exec_argv(args: &[CString]) -> Vec<*const c_char> {
    args.iter().map(|arg| arg.as_ptr()).chain([ptr::null()]).collect()
}

/// Block until `child` terminates and return its status.
fn wait_foreground(child: Pid) -> i32 {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return code,
            Ok(WaitStatus::Signaled(_, sig, _)) => return 128 + sig as i32,
            Ok(status) => debug!("ignoring {:?} while waiting for {}", status, child),
            Err(Errno::EINTR) => continue,
            Err(e) => {
                eprintln!("pipsh: {}", ShellError::Wait(e));
                return 1;
            }
        }
    }
}

/// Fork and exec an external command. Returns the status to record.
fn spawn(cmd: Command, state: &ShellState, pipes: &PipeRegistry) -> i32 {
    let c_argv = match c_args(&cmd.args) {
        Ok(c_argv) => c_argv,
        Err(e) => {
            eprintln!("pipsh: {}", e);
            return 1;
        }
    };
    // Computed before forking; the child must not allocate.
    let argv = exec_argv(&c_argv);
    let close_queue = pipes.close_queue();

    // A background child is registered while the job set is locked, so the
    // reaper cannot miss its termination.
    let mut tracked = cmd.flags.background.then(|| state.jobs.lock());

    match unsafe { fork() } {
        Ok(ForkResult::Child) => run_child(&cmd, &argv, &close_queue),
        Ok(ForkResult::Parent { child }) => {
            debug!("forked {} for {:?}", child, cmd.args);
            // The shell's copies of any pipe ends close here.
            drop(cmd);
            match tracked.as_mut() {
                Some(jobs) => {
                    jobs.insert(child);
                    0
                }
                None => {
                    let code = wait_foreground(child);
                    debug!("{} exited with {}", child, code);
                    code
                }
            }
        }
        Err(e) => {
            eprintln!("pipsh: {}", ShellError::Fork(e));
            1
        }
    }
}

fn should_run(condition: Option<Condition>, last_status: i32) -> bool {
    match condition {
        None => true,
        Some(Condition::IfSucceeded) => last_status == 0,
        Some(Condition::IfFailed) => last_status != 0,
    }
}

// ── Public API ────────────────────────────────────────────────────────────

/// Run one command descriptor and record its status in `state`.
///
/// `pipes` is the registry of the line being scanned; the child closes every
/// pipe end it still lists. Built-ins run in the shell process and ignore the
/// command's endpoints (any pipe ends are simply released).
pub fn execute(cmd: Command, state: &mut ShellState, pipes: &PipeRegistry) -> ExecutionResult {
    let Some(name) = cmd.name() else {
        return ExecutionResult::KeepRunning;
    };

    // Gated before built-in dispatch so `false && cd /` and `false && exit` are skipped too.
    if !should_run(cmd.flags.condition, state.last_status) {
        debug!("skipping {} (condition {:?}, last status {})", name, cmd.flags.condition, state.last_status);
        return ExecutionResult::KeepRunning;
    }

    if let Some(info) = builtins::registry::find_command(name) {
        debug!("built-in {}: {}", info.name, info.description);
        let (result, code) = (info.run)(&cmd.args, state);
        state.last_status = code;
        return result;
    }

    state.last_status = spawn(cmd, state, pipes);
    ExecutionResult::KeepRunning
}

// ── Tests ──────────────────────────────────────────────────────────────────
