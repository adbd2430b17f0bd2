#![deny(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unused_imports,
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Readiness multiplexing over `select(2)` and `poll(2)`.
//!
//! A [`Multiplexer`] watches many file descriptors at once and reports which
//! of them are readable, writable or in an exceptional state. Two backends
//! implement it:
//!
//! * [`SelectMultiplexer`], on `select(2)`, limited to descriptors below
//!   `FD_SETSIZE`.
//! * [`PollMultiplexer`], on `poll(2)`, without a fixed bound.
//!
//! Pick one at runtime with [`create`] and a selector string.
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
//! use std::fs::File;
//! use std::time::Duration;
//!
//! use fdmux::{EventMask, Multiplexer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut fds = [0; 2];
//! assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
//! let receiver = unsafe { OwnedFd::from_raw_fd(fds[0]) };
//! let mut sender = File::from(unsafe { OwnedFd::from_raw_fd(fds[1]) });
//!
//! let mut mux = fdmux::create("poll")?;
//! mux.add(receiver.as_raw_fd(), EventMask::READABLE)?;
//!
//! // Nothing written yet.
//! assert_eq!(mux.wait(Some(Duration::ZERO))?, 0);
//!
//! sender.write_all(b"x")?;
//! assert_eq!(mux.wait(Some(Duration::from_secs(1)))?, 1);
//! assert!(mux.events(receiver.as_raw_fd()).is_readable());
//! # Ok(())
//! # }
//! ```
//!
//! # Descriptor ownership
//!
//! Descriptors are plain integers. The caller opens and closes them; a
//! multiplexer never does.

#[macro_use]
mod macros;

mod backend;
mod error;
mod event_mask;
mod multiplexer;
mod sys;

pub use backend::{create, Backend};
pub use error::{Error, Result};
pub use event_mask::EventMask;
pub use multiplexer::Multiplexer;
pub use sys::{PollMultiplexer, SelectMultiplexer};
