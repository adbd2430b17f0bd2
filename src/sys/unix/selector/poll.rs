use std::collections::HashMap;
use std::os::fd::RawFd;
use std::time::Duration;
use std::{cmp, fmt, io};

use libc::{c_int, c_short, nfds_t};
use libc::{POLLERR, POLLHUP, POLLIN, POLLNVAL, POLLOUT, POLLPRI};
use log::{debug, trace};

use crate::sys::unix::{check_fd, narrow, sorted, Deadline};
use crate::{Backend, Error, EventMask, Multiplexer, Result};

/// A [`Multiplexer`] built on `poll(2)`.
///
/// Descriptor values have no fixed bound; the number of registrations is
/// limited only by the resources of the process.
#[derive(Default)]
pub struct PollMultiplexer {
    interests: HashMap<RawFd, EventMask>,
    ready: HashMap<RawFd, EventMask>,
    /// Rebuilt from `interests` before every call to `poll(2)`.
    fdarr: Vec<libc::pollfd>,
}

impl PollMultiplexer {
    /// Creates an empty multiplexer.
    pub fn new() -> PollMultiplexer {
        PollMultiplexer::default()
    }

    fn rebuild(&mut self) {
        self.fdarr.clear();
        self.fdarr
            .extend(self.interests.iter().map(|(&fd, &interest)| libc::pollfd {
                // `poll(2)` reports hang-ups and errors whatever was asked
                // for, so descriptors without interest are left out.
                fd: if interest.is_empty() { -1 } else { fd },
                events: mask_to_poll(interest),
                revents: 0,
            }));
    }

    /// Replaces the readiness snapshot if any descriptor is ready for its
    /// interest and returns how many are.
    ///
    /// Descriptors that only reported conditions outside their interest are
    /// taken out of `fdarr` until the next `rebuild`, otherwise the following
    /// `poll(2)` would return at once with the same condition.
    fn publish(&mut self) -> usize {
        let mut ready = HashMap::new();
        for pollfd in self.fdarr.iter_mut().filter(|pollfd| pollfd.revents != 0) {
            let Some(&interest) = self.interests.get(&pollfd.fd) else {
                continue;
            };
            let mask = settle(pollfd.revents, interest);
            if mask.is_empty() {
                trace!("muting descriptor; fd={}; revents={}", pollfd.fd, pollfd.revents);
                pollfd.fd = -1;
            } else {
                ready.insert(pollfd.fd, mask);
            }
        }
        let n = ready.len();
        if n > 0 {
            self.ready = ready;
        }
        n
    }
}

impl Multiplexer for PollMultiplexer {
    fn wait(&mut self, timeout: Option<Duration>) -> Result<usize> {
        // Nothing could ever become ready, don't bother the kernel.
        if self.interests.is_empty() {
            self.ready.clear();
            return Ok(0);
        }

        self.rebuild();
        let deadline = Deadline::new(timeout);
        loop {
            let timeout = deadline.remaining().map_or(-1, to_poll_timeout);

            trace!("poll; nfds={}; timeout={}", self.fdarr.len(), timeout);
            let res = syscall!(poll(
                self.fdarr.as_mut_ptr(),
                self.fdarr.len() as nfds_t,
                timeout,
            ));
            match res {
                Ok(0) => {
                    self.ready.clear();
                    return Ok(0);
                }
                Ok(_) => {
                    let n = self.publish();
                    if n > 0 {
                        return Ok(n);
                    }
                    if deadline.has_expired() {
                        self.ready.clear();
                        return Ok(0);
                    }
                    trace!(
                        "poll woke without interest; retrying; remaining={:?}",
                        deadline.remaining()
                    );
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {
                    if deadline.has_expired() {
                        self.ready.clear();
                        return Ok(0);
                    }
                    debug!(
                        "poll interrupted; retrying; remaining={:?}",
                        deadline.remaining()
                    );
                }
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }

    fn add(&mut self, fd: RawFd, mask: EventMask) -> Result<()> {
        check_fd(fd)?;
        trace!("registering; fd={}; interest={:?}", fd, mask);
        self.interests.insert(fd, mask);
        narrow(&mut self.ready, fd, mask);
        Ok(())
    }

    fn remove(&mut self, fd: RawFd) {
        if self.interests.remove(&fd).is_some() {
            trace!("deregistering; fd={}", fd);
            self.ready.remove(&fd);
        }
    }

    fn update(&mut self, fd: RawFd, mask: EventMask) {
        if let Some(interest) = self.interests.get_mut(&fd) {
            trace!("updating; fd={}; interest={:?}", fd, mask);
            *interest = mask;
            narrow(&mut self.ready, fd, mask);
        }
    }

    fn clear(&mut self) {
        trace!("clearing; registered={}", self.interests.len());
        self.interests.clear();
        self.ready.clear();
        self.fdarr.clear();
    }

    fn events(&self, fd: RawFd) -> EventMask {
        self.ready.get(&fd).copied().unwrap_or(EventMask::NONE)
    }

    fn interest(&self, fd: RawFd) -> Option<EventMask> {
        self.interests.get(&fd).copied()
    }

    fn ready(&self) -> Vec<(RawFd, EventMask)> {
        sorted(&self.ready)
    }

    fn len(&self) -> usize {
        self.interests.len()
    }

    fn backend(&self) -> Backend {
        Backend::Poll
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}

impl fmt::Debug for PollMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct PollFds<'a>(&'a [libc::pollfd]);

        impl fmt::Debug for PollFds<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_list()
                    .entries(self.0.iter().map(|p| (p.fd, p.events, p.revents)))
                    .finish()
            }
        }

        f.debug_struct("PollMultiplexer")
            .field("interests", &self.interests)
            .field("ready", &self.ready)
            .field("fdarr", &PollFds(&self.fdarr))
            .finish()
    }
}

fn to_poll_timeout(timeout: Duration) -> c_int {
    // `Duration::as_millis` truncates, so round up. This avoids turning
    // sub-millisecond timeouts into a zero timeout, unless the caller
    // explicitly requests that by specifying a zero timeout.
    let millis = timeout
        .checked_add(Duration::from_nanos(999_999))
        .unwrap_or(timeout)
        .as_millis();
    cmp::min(millis, c_int::MAX as u128) as c_int
}

fn mask_to_poll(mask: EventMask) -> c_short {
    let mut kind = 0;

    if mask.is_readable() {
        kind |= POLLIN;
    }
    if mask.is_writable() {
        kind |= POLLOUT;
    }
    if mask.is_exceptional() {
        kind |= POLLPRI | POLLERR | POLLHUP;
    }
    kind
}

fn poll_to_mask(revents: c_short) -> EventMask {
    let mut mask = EventMask::NONE;

    if revents & POLLIN != 0 {
        mask |= EventMask::READABLE;
    }
    if revents & POLLOUT != 0 {
        mask |= EventMask::WRITABLE;
    }
    if revents & (POLLPRI | POLLERR | POLLHUP | POLLNVAL) != 0 {
        mask |= EventMask::EXCEPTIONAL;
    }
    mask
}

/// Readiness of one descriptor, limited to its interest.
///
/// Error and hang-up conditions also count as readable (a read returns
/// without blocking) and errors as writable, the way `select(2)` reports
/// them.
fn settle(revents: c_short, interest: EventMask) -> EventMask {
    let mut mask = poll_to_mask(revents);
    if revents & (POLLERR | POLLHUP | POLLNVAL) != 0 {
        mask |= EventMask::READABLE;
    }
    if revents & (POLLERR | POLLNVAL) != 0 {
        mask |= EventMask::WRITABLE;
    }
    mask & interest
}
