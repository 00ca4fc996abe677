//! Pipe registry for a single line scan.
//!
//! Every `|` in a line opens one pipe. Its two ends are handed out as
//! [`PipeEnd`] values that own their descriptor and are moved into the
//! command descriptors on either side of the `|`. The registry keeps a ledger
//! of the ends that are still open in the shell so that a freshly forked child
//! can close every pipe descriptor it inherited but does not own.

use std::cell::RefCell;
use std::fmt;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::rc::Rc;

use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use tracing::debug;

use crate::error::{Result, ShellError};

/// Upper bound on pipes that may be open at once while scanning a line.
pub const MAX_PIPES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipeId(usize);

impl fmt::Display for PipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipe#{}", self.0)
    }
}

/// Which side of a data flow an endpoint sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

#[derive(Debug, Default)]
struct Ledger {
    open: Vec<(PipeId, Direction, RawFd)>,
    created: usize,
}

/// One end of a pipe. Closing happens exactly once, when the value is dropped.
pub struct PipeEnd {
    id: PipeId,
    direction: Direction,
    fd: OwnedFd,
    ledger: Rc<RefCell<Ledger>>,
}

impl PipeEnd {
    pub fn id(&self) -> PipeId {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl AsFd for PipeEnd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl fmt::Debug for PipeEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeEnd")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .field("fd", &self.fd.as_raw_fd())
            .finish()
    }
}

impl Drop for PipeEnd {
    fn drop(&mut self) {
        let raw = self.fd.as_raw_fd();
        self.ledger.borrow_mut().open.retain(|&(_, _, fd)| fd != raw);
        debug!("closing {} {:?} end (fd {})", self.id, self.direction, raw);
        // `self.fd` is closed when the field itself is dropped.
    }
}

#[derive(Debug)]
pub struct PipeRegistry {
    ledger: Rc<RefCell<Ledger>>,
    capacity: usize,
}

impl PipeRegistry {
    pub fn new() -> Self {
        Self::with_capacity(MAX_PIPES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PipeRegistry {
            ledger: Rc::new(RefCell::new(Ledger::default())),
            capacity,
        }
    }

    /// Open a new pipe and return its `(read, write)` ends.
    ///
    /// Both descriptors are close-on-exec; only the copies a child places onto
    /// its standard streams survive program replacement.
    pub fn open(&mut self) -> Result<(PipeEnd, PipeEnd)> {
        if self.open_pipes() >= self.capacity {
            return Err(ShellError::PipeLimit { capacity: self.capacity });
        }

        let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(ShellError::Pipe)?;

        let mut ledger = self.ledger.borrow_mut();
        let id = PipeId(ledger.created);
        ledger.created += 1;
        ledger.open.push((id, Direction::Read, read.as_raw_fd()));
        ledger.open.push((id, Direction::Write, write.as_raw_fd()));
        drop(ledger);

        debug!("opened {} (r={}, w={})", id, read.as_raw_fd(), write.as_raw_fd());

        let end = |direction, fd| PipeEnd {
            id,
            direction,
            fd,
            ledger: Rc::clone(&self.ledger),
        };
        Ok((end(Direction::Read, read), end(Direction::Write, write)))
    }

    /// Descriptors a newly forked child must close: every pipe end still open
    /// in the shell at the moment of the fork.
    pub fn close_queue(&self) -> Vec<RawFd> {
        self.ledger.borrow().open.iter().map(|&(_, _, fd)| fd).collect()
    }

    /// Number of pipes created by this registry so far.
    pub fn created(&self) -> usize {
        self.ledger.borrow().created
    }

    /// Number of individual pipe ends that have not been released yet.
    pub fn open_ends(&self) -> usize {
        self.ledger.borrow().open.len()
    }

    /// Number of pipes with at least one end still open.
    pub fn open_pipes(&self) -> usize {
        let ledger = self.ledger.borrow();
        let mut ids: Vec<PipeId> = ledger.open.iter().map(|&(id, _, _)| id).collect();
        ids.dedup();
        ids.len()
    }
}

impl Default for PipeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
