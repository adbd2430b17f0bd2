use std::collections::{BTreeMap, HashMap};
use std::os::fd::RawFd;
use std::time::Duration;
use std::{cmp, io, mem, ptr};

use libc::c_int;
use log::{debug, trace};

use crate::sys::unix::{check_fd, narrow, sorted, Deadline};
use crate::{Backend, Error, EventMask, Multiplexer, Result};

/// A [`Multiplexer`] built on `select(2)`.
///
/// Descriptor values are bounded by the platform's fixed-size descriptor
/// set, see [`SelectMultiplexer::CAPACITY`]. Adding a descriptor at or above
/// it fails with [`Error::LimitExceeded`]; use a [`PollMultiplexer`] when
/// descriptors can grow that large.
///
/// [`PollMultiplexer`]: crate::PollMultiplexer
#[derive(Debug, Default)]
pub struct SelectMultiplexer {
    interests: BTreeMap<RawFd, EventMask>,
    ready: HashMap<RawFd, EventMask>,
    /// Highest registered descriptor plus one, `0` when empty.
    nfds: c_int,
}

impl SelectMultiplexer {
    /// Descriptors must be strictly below this value (`FD_SETSIZE`).
    pub const CAPACITY: usize = libc::FD_SETSIZE as usize;

    /// Creates an empty multiplexer.
    pub fn new() -> SelectMultiplexer {
        SelectMultiplexer::default()
    }

    fn publish(&mut self, sets: &Sets) -> usize {
        let mut ready = HashMap::new();
        for (&fd, &interest) in self.interests.iter() {
            let mut mask = EventMask::NONE;
            if sets.read.contains(fd) {
                mask |= EventMask::READABLE;
            }
            if sets.write.contains(fd) {
                mask |= EventMask::WRITABLE;
            }
            if sets.except.contains(fd) {
                mask |= EventMask::EXCEPTIONAL;
            }
            mask &= interest;
            if !mask.is_empty() {
                ready.insert(fd, mask);
            }
        }
        self.ready = ready;
        self.ready.len()
    }
}

impl Multiplexer for SelectMultiplexer {
    fn wait(&mut self, timeout: Option<Duration>) -> Result<usize> {
        if self.interests.is_empty() {
            self.ready.clear();
            return Ok(0);
        }

        let deadline = Deadline::new(timeout);
        loop {
            let mut sets = Sets::new(&self.interests);
            let mut tv = deadline.remaining().map(to_timeval);
            let tvp = tv
                .as_mut()
                .map_or(ptr::null_mut(), |tv| tv as *mut libc::timeval);

            trace!(
                "select; nfds={}; timeout={:?}",
                self.nfds,
                deadline.remaining()
            );
            let res = syscall!(select(
                self.nfds,
                sets.read.as_mut_ptr(),
                sets.write.as_mut_ptr(),
                sets.except.as_mut_ptr(),
                tvp,
            ));
            match res {
                Ok(0) => {
                    self.ready.clear();
                    return Ok(0);
                }
                Ok(_) => return Ok(self.publish(&sets)),
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {
                    if deadline.has_expired() {
                        self.ready.clear();
                        return Ok(0);
                    }
                    debug!(
                        "select interrupted; retrying; remaining={:?}",
                        deadline.remaining()
                    );
                }
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }

    fn add(&mut self, fd: RawFd, mask: EventMask) -> Result<()> {
        check_fd(fd)?;
        if fd as usize >= Self::CAPACITY {
            debug!(
                "rejecting descriptor; fd={}; capacity={}",
                fd,
                Self::CAPACITY
            );
            return Err(Error::LimitExceeded {
                fd,
                capacity: Self::CAPACITY,
            });
        }

        trace!("registering; fd={}; interest={:?}", fd, mask);
        self.interests.insert(fd, mask);
        self.nfds = cmp::max(self.nfds, fd + 1);
        narrow(&mut self.ready, fd, mask);
        Ok(())
    }

    fn remove(&mut self, fd: RawFd) {
        if self.interests.remove(&fd).is_none() {
            return;
        }

        trace!("deregistering; fd={}", fd);
        self.ready.remove(&fd);
        if fd + 1 == self.nfds {
            self.nfds = self
                .interests
                .last_key_value()
                .map_or(0, |(&last, _)| last + 1);
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
        self.nfds = 0;
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
        Backend::Select
    }

    fn capacity(&self) -> Option<usize> {
        Some(Self::CAPACITY)
    }
}

/// The three descriptor sets handed to `select(2)`.
struct Sets {
    read: FdSet,
    write: FdSet,
    except: FdSet,
}

impl Sets {
    fn new(interests: &BTreeMap<RawFd, EventMask>) -> Sets {
        let mut sets = Sets {
            read: FdSet::new(),
            write: FdSet::new(),
            except: FdSet::new(),
        };
        for (&fd, &interest) in interests.iter() {
            if interest.is_readable() {
                sets.read.insert(fd);
            }
            if interest.is_writable() {
                sets.write.insert(fd);
            }
            if interest.is_exceptional() {
                sets.except.insert(fd);
            }
        }
        sets
    }
}

/// Safe wrapper around `fd_set`.
///
/// Every descriptor passed in has been checked against
/// [`SelectMultiplexer::CAPACITY`] on registration.
struct FdSet(libc::fd_set);

impl FdSet {
    fn new() -> FdSet {
        // SAFETY: `fd_set` is plain old data, `FD_ZERO` puts it in its
        // canonical empty state.
        unsafe {
            let mut set: libc::fd_set = mem::zeroed();
            libc::FD_ZERO(&mut set);
            FdSet(set)
        }
    }

    fn insert(&mut self, fd: RawFd) {
        debug_assert!(fd >= 0 && (fd as usize) < SelectMultiplexer::CAPACITY);
        // SAFETY: `fd` is within `0..FD_SETSIZE`.
        unsafe { libc::FD_SET(fd, &mut self.0) }
    }

    fn contains(&self, fd: RawFd) -> bool {
        // SAFETY: `fd` is within `0..FD_SETSIZE`.
        unsafe { libc::FD_ISSET(fd, &self.0) }
    }

    fn as_mut_ptr(&mut self) -> *mut libc::fd_set {
        &mut self.0
    }
}

/// Converts a timeout into the `timeval` `select(2)` expects.
///
/// Sub-microsecond remainders round up so a non-zero timeout never becomes
/// a zero one.
fn to_timeval(timeout: Duration) -> libc::timeval {
    let timeout = timeout
        .checked_add(Duration::from_nanos(999))
        .unwrap_or(timeout);
    libc::timeval {
        tv_sec: cmp::min(timeout.as_secs(), libc::time_t::MAX as u64) as libc::time_t,
        tv_usec: timeout.subsec_micros() as libc::suseconds_t,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::to_timeval;

    #[test]
    fn timeval_splits_seconds() {
        let tv = to_timeval(Duration::from_millis(2_500));
        assert_eq!(tv.tv_sec, 2);
        assert_eq!(tv.tv_usec, 500_000);
    }

    #[test]
    fn timeval_rounds_up() {
        let tv = to_timeval(Duration::from_nanos(1));
        assert_eq!(tv.tv_sec, 0);
        assert_eq!(tv.tv_usec, 1);

        let tv = to_timeval(Duration::ZERO);
        assert_eq!(tv.tv_sec, 0);
        assert_eq!(tv.tv_usec, 0);
    }
}
