use std::fmt;
use std::os::fd::RawFd;
use std::time::Duration;

use crate::{Backend, EventMask, Result};

/// Waits on many file descriptors at once and reports which are ready.
///
/// A multiplexer keeps two things per descriptor: the *interest* registered
/// through [`add`] and [`update`], and the *readiness* observed by the most
/// recent [`wait`]. Interest survives across calls to `wait`; readiness is
/// replaced by every successful `wait` and is always a subset of the
/// interest it was observed under.
///
/// Descriptors are plain integers owned by the caller. A multiplexer never
/// closes them, and closing a descriptor that is still registered leaves
/// the outcome of the next `wait` up to the platform.
///
/// Implementations are single-owner: registration changes must not race
/// with a `wait` in flight on another thread, which the `&mut self`
/// receivers enforce.
///
/// ```no_run
/// use std::time::Duration;
/// use fdmux::{EventMask, Multiplexer};
/// # fn main() -> fdmux::Result<()> {
/// # let fd = 0;
/// let mut mux = fdmux::create("poll")?;
/// mux.add(fd, EventMask::READABLE)?;
///
/// if mux.wait(Some(Duration::from_millis(100)))? > 0 {
///     assert!(mux.events(fd).is_readable());
/// }
/// # Ok(())
/// # }
/// ```
///
/// [`add`]: Multiplexer::add
/// [`update`]: Multiplexer::update
/// [`wait`]: Multiplexer::wait
pub trait Multiplexer: fmt::Debug + Send {
    /// Blocks until at least one registered descriptor is ready for a kind
    /// in its interest, or until `timeout` elapses.
    ///
    /// `Some(Duration::ZERO)` checks once and returns, `None` blocks with no
    /// limit. Returns the number of ready descriptors, `0` on timeout.
    /// Interrupted system calls are retried with the time remaining.
    ///
    /// On error the registrations and the previous readiness are left as
    /// they were.
    fn wait(&mut self, timeout: Option<Duration>) -> Result<usize>;

    /// Registers `fd` with interest `mask`, replacing any prior
    /// registration of the same descriptor.
    fn add(&mut self, fd: RawFd, mask: EventMask) -> Result<()>;

    /// Deregisters `fd`. Does nothing if it was not registered.
    fn remove(&mut self, fd: RawFd);

    /// Replaces the interest of an already registered `fd`. Does nothing,
    /// and in particular does not register it, if `fd` is unknown.
    fn update(&mut self, fd: RawFd, mask: EventMask);

    /// Deregisters every descriptor.
    fn clear(&mut self);

    /// Readiness of `fd` as observed by the last [`wait`], `NONE` if the
    /// descriptor is not registered or was not ready.
    ///
    /// [`wait`]: Multiplexer::wait
    fn events(&self, fd: RawFd) -> EventMask;

    /// The interest `fd` is registered with, `None` if it is not.
    fn interest(&self, fd: RawFd) -> Option<EventMask>;

    /// Every descriptor reported ready by the last `wait`, ordered by
    /// descriptor value.
    fn ready(&self) -> Vec<(RawFd, EventMask)>;

    /// Number of registered descriptors.
    fn len(&self) -> usize;

    /// Returns true if no descriptor is registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The system call this multiplexer is built on.
    fn backend(&self) -> Backend;

    /// Upper bound on descriptor values, `None` if the backend has none.
    fn capacity(&self) -> Option<usize>;
}
