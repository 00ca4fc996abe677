//! Turning an [`Endpoint`] into the child's actual stdin/stdout.
//!
//! Everything here runs in a freshly forked child, between `fork` and
//! `execvp`, so it sticks to plain system calls: no logging and no locks.

use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{dup2_stdin, dup2_stdout};

use crate::engine::pipe::Direction;
use crate::parser::Endpoint;

/// Permissions for files created by `>` (before the umask): `rw-r--r--`.
pub const REDIRECT_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdin,
    Stdout,
}

impl Stream {
    pub fn direction(self) -> Direction {
        match self {
            Stream::Stdin => Direction::Read,
            Stream::Stdout => Direction::Write,
        }
    }
}

/// Open the file behind a `<` or `>` redirect.
pub fn open_redirect(path: &Path, direction: Direction) -> Result<OwnedFd, Errno> {
    let flags = match direction {
        Direction::Read => OFlag::O_RDONLY,
        Direction::Write => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
    };
    open(path, flags | OFlag::O_CLOEXEC, Mode::from_bits_truncate(REDIRECT_MODE))
}

fn place<Fd: AsFd>(fd: Fd, stream: Stream) -> Result<(), Errno> {
    match stream {
        Stream::Stdin => dup2_stdin(fd),
        Stream::Stdout => dup2_stdout(fd),
    }
}

/// Put `endpoint` onto `stream`. Files are opened here and their original
/// descriptor is closed again once duplicated; pipe ends are duplicated and
/// left for the close queue.
pub fn attach(endpoint: &Endpoint, stream: Stream) -> Result<(), Errno> {
    if endpoint.direction().is_some_and(|d| d != stream.direction()) {
        return Err(Errno::EBADF);
    }
    match endpoint {
        Endpoint::Inherited => Ok(()),
        Endpoint::File { path, direction } => {
            let fd = open_redirect(path, *direction)?;
            place(&fd, stream)
        }
        Endpoint::Pipe(end) => place(end, stream),
        Endpoint::Unavailable(errno) => Err(*errno),
    }
}

/// Name used when reporting a failed [`attach`].
pub fn label(endpoint: &Endpoint) -> &[u8] {
    match endpoint {
        Endpoint::File { path, .. } => path.as_os_str().as_bytes(),
        Endpoint::Pipe(_) => b"pipe",
        Endpoint::Inherited | Endpoint::Unavailable(_) => b"redirect",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_open_redirect_write_creates_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old contents that are long").unwrap();

        let fd = open_redirect(&path, Direction::Write).unwrap();
        let mut file = std::fs::File::from(fd);
        file.write_all(b"new").unwrap();
        drop(file);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_open_redirect_write_uses_rw_r_r() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");
        drop(open_redirect(&path, Direction::Write).unwrap());
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        // The umask can only remove bits.
        assert_eq!(mode & !0o644, 0);
        assert_ne!(mode & 0o600, 0);
    }

    #[test]
    fn test_open_redirect_read_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert_eq!(open_redirect(&missing, Direction::Read).unwrap_err(), Errno::ENOENT);

        let present = dir.path().join("present.txt");
        std::fs::write(&present, "data").unwrap();
        let mut file = std::fs::File::from(open_redirect(&present, Direction::Read).unwrap());
        let mut buf = String::new();
        file.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "data");
    }

    #[test]
    fn test_attach_rejects_mismatched_and_unavailable_endpoints() {
        let wrong_side = Endpoint::File {
            path: "whatever".into(),
            direction: Direction::Write,
        };
        assert_eq!(attach(&wrong_side, Stream::Stdin), Err(Errno::EBADF));
        assert_eq!(attach(&Endpoint::Unavailable(Errno::EMFILE), Stream::Stdout), Err(Errno::EMFILE));
        assert_eq!(attach(&Endpoint::Inherited, Stream::Stdout), Ok(()));
    }

    #[test]
    fn test_label_names_the_file() {
        let endpoint = Endpoint::File {
            path: "/tmp/x.txt".into(),
            direction: Direction::Read,
        };
        assert_eq!(label(&endpoint), b"/tmp/x.txt");
    }
}
