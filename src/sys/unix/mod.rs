use std::collections::HashMap;
use std::os::fd::RawFd;
use std::time::{Duration, Instant};

use crate::{Error, EventMask, Result};

mod selector;

pub use self::selector::{PollMultiplexer, SelectMultiplexer};

/// The point in time a `wait` has to return by, kept across retries of an
/// interrupted system call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    /// `None` if there is no limit.
    at: Option<Instant>,
}

impl Deadline {
    pub(crate) fn new(timeout: Option<Duration>) -> Deadline {
        Deadline {
            // An `Instant` overflow is as good as no limit at all.
            at: timeout.and_then(|to| Instant::now().checked_add(to)),
        }
    }

    /// Time left before the deadline, `None` if there is no limit.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub(crate) fn has_expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }
}

/// Drops readiness of `fd` the new `interest` no longer covers.
pub(crate) fn narrow(ready: &mut HashMap<RawFd, EventMask>, fd: RawFd, interest: EventMask) {
    if let Some(mask) = ready.get_mut(&fd) {
        *mask &= interest;
        if mask.is_empty() {
            ready.remove(&fd);
        }
    }
}

pub(crate) fn sorted(ready: &HashMap<RawFd, EventMask>) -> Vec<(RawFd, EventMask)> {
    let mut ready: Vec<_> = ready.iter().map(|(&fd, &mask)| (fd, mask)).collect();
    ready.sort_unstable_by_key(|&(fd, _)| fd);
    ready
}

/// Rejects descriptors no system call would accept.
pub(crate) fn check_fd(fd: RawFd) -> Result<()> {
    if fd < 0 {
        log::debug!("rejecting descriptor; fd={}", fd);
        Err(Error::InvalidDescriptor(fd))
    } else {
        Ok(())
    }
}
