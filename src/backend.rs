use std::fmt;
use std::str::FromStr;

use log::trace;

use crate::{Error, Multiplexer, PollMultiplexer, Result, SelectMultiplexer};

/// The system call a [`Multiplexer`] is built on.
///
/// Parsed from the selector strings `"select"` and `"poll"`, case-sensitive.
///
/// ```
/// use fdmux::Backend;
///
/// let backend: Backend = "poll".parse()?;
/// assert_eq!(backend, Backend::Poll);
/// assert_eq!(backend.to_string(), "poll");
/// assert!("epoll".parse::<Backend>().is_err());
/// # Ok::<(), fdmux::Error>(())
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// `select(2)`, bounded by `FD_SETSIZE`.
    Select,
    /// `poll(2)`, no fixed bound.
    Poll,
}

impl Backend {
    /// The selector string of this backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Backend::Select => "select",
            Backend::Poll => "poll",
        }
    }

    /// Creates a fresh, empty multiplexer of this kind.
    pub fn create(self) -> Box<dyn Multiplexer> {
        trace!("creating multiplexer; backend={}", self);
        match self {
            Backend::Select => Box::new(SelectMultiplexer::new()),
            Backend::Poll => Box::new(PollMultiplexer::new()),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(selector: &str) -> Result<Backend> {
        match selector {
            "select" => Ok(Backend::Select),
            "poll" => Ok(Backend::Poll),
            _ => Err(Error::UnsupportedBackend(selector.to_owned())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates a multiplexer from a backend selector string, `"select"` or
/// `"poll"`.
///
/// The caller owns the returned handle. Any other selector fails with
/// [`Error::UnsupportedBackend`].
///
/// ```
/// use fdmux::{Backend, Multiplexer};
///
/// let mux = fdmux::create("select")?;
/// assert_eq!(mux.backend(), Backend::Select);
/// assert!(fdmux::create("SELECT").is_err());
/// # Ok::<(), fdmux::Error>(())
/// ```
pub fn create(selector: &str) -> Result<Box<dyn Multiplexer>> {
    selector.parse::<Backend>().map(Backend::create)
}
