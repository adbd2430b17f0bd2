//! Platform specific backends.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use self::unix::{PollMultiplexer, SelectMultiplexer};

#[cfg(not(unix))]
compile_error!("fdmux is built on select(2) and poll(2) and only supports unix platforms");
