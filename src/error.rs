use std::os::fd::RawFd;
use std::{error, fmt, io};

/// A specialized `Result` type for multiplexer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by a [`Multiplexer`] or the backend factory.
///
/// [`Multiplexer`]: crate::Multiplexer
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The descriptor value does not fit the backend's fixed capacity.
    ///
    /// Only the select backend has such a bound; switch to the poll backend
    /// or refuse the descriptor.
    LimitExceeded {
        /// The rejected descriptor.
        fd: RawFd,
        /// Descriptors must be strictly below this value.
        capacity: usize,
    },
    /// The blocking multiplex system call failed for a reason other than
    /// an interrupt.
    Io(io::Error),
    /// The backend selector string named no known backend.
    UnsupportedBackend(String),
    /// A negative descriptor was passed in.
    InvalidDescriptor(RawFd),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LimitExceeded { fd, capacity } => write!(
                f,
                "file descriptor {} exceeds limit {}",
                fd, capacity
            ),
            Error::Io(err) => write!(f, "multiplex system call failed: {}", err),
            Error::UnsupportedBackend(name) => write!(f, "unknown backend: {:?}", name),
            Error::InvalidDescriptor(fd) => write!(f, "invalid file descriptor {}", fd),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
