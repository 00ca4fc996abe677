use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Failures the shell itself can hit while setting up or running a command.
///
/// None of these terminate the shell on their own: the executor reports them
/// and records a non-zero status. Only `main` treats a failure to open its
/// input source as fatal.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("pipe: {0}")]
    Pipe(#[source] Errno),

    #[error("pipe: too many open pipes (limit {capacity})")]
    PipeLimit { capacity: usize },

    #[error("fork: {0}")]
    Fork(#[source] Errno),

    #[error("wait: {0}")]
    Wait(#[source] Errno),

    #[error("{0}: argument contains a NUL byte")]
    NulArgument(String),

    #[error("{}: {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input: {0}")]
    Input(#[from] std::io::Error),

    #[error("line editor: {0}")]
    Editor(#[from] rustyline::error::ReadlineError),

    #[error("signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

impl ShellError {
    /// The errno that should mark an endpoint as unavailable when this error
    /// prevented it from being wired up.
    pub fn errno(&self) -> Errno {
        match self {
            ShellError::Pipe(e) | ShellError::Fork(e) | ShellError::Wait(e) => *e,
            ShellError::PipeLimit { .. } => Errno::EMFILE,
            ShellError::NulArgument(_) => Errno::EINVAL,
            ShellError::Script { source, .. } | ShellError::Input(source) | ShellError::Signal(source) => {
                source.raw_os_error().map(Errno::from_raw).unwrap_or(Errno::EIO)
            }
            ShellError::Editor(_) => Errno::EIO,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_limit_maps_to_emfile() {
        let err = ShellError::PipeLimit { capacity: 4 };
        assert_eq!(err.errno(), Errno::EMFILE);
        assert_eq!(err.to_string(), "pipe: too many open pipes (limit 4)");
    }

    #[test]
    fn test_script_error_mentions_path() {
        let err = ShellError::Script {
            path: PathBuf::from("/no/such/script"),
            source: std::io::Error::from_raw_os_error(nix::libc::ENOENT),
        };
        assert!(err.to_string().starts_with("/no/such/script: "));
        assert_eq!(err.errno(), Errno::ENOENT);
    }
}
