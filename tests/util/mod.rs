// Not all functions are used by all tests.
#![allow(dead_code)]

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, RawFd};
use std::sync::Once;
use std::time::Duration;

use fdmux::{Backend, EventMask, Multiplexer};
use log::error;

pub const BACKENDS: [Backend; 2] = [Backend::Select, Backend::Poll];

pub fn init() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        env_logger::try_init().expect("unable to initialise logger");
    })
}

pub fn init_with_mux(backend: Backend) -> Box<dyn Multiplexer> {
    init();
    backend.create()
}

pub fn assert_sync<T: Sync>() {}
pub fn assert_send<T: Send>() {}

/// An anonymous pipe, both ends closed on drop.
pub struct Pipe {
    pub receiver: File,
    pub sender: File,
}

impl Pipe {
    pub fn new() -> Pipe {
        let mut fds: [RawFd; 2] = [-1, -1];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            panic!("unable to create pipe: {}", io::Error::last_os_error());
        }
        // SAFETY: `pipe(2)` just handed us both descriptors.
        unsafe {
            Pipe {
                receiver: File::from_raw_fd(fds[0]),
                sender: File::from_raw_fd(fds[1]),
            }
        }
    }

    pub fn rfd(&self) -> RawFd {
        self.receiver.as_raw_fd()
    }

    pub fn wfd(&self) -> RawFd {
        self.sender.as_raw_fd()
    }

    pub fn send(&mut self, data: &[u8]) {
        self.sender.write_all(data).expect("unable to write to pipe");
    }
}

/// Waits until `expected` shows up, accepting a couple of spurious empty
/// rounds.
pub fn expect_ready(mux: &mut dyn Multiplexer, expected: &[(RawFd, EventMask)]) {
    for _ in 0..3 {
        mux.wait(Some(Duration::from_millis(500)))
            .expect("unable to wait");

        if expected
            .iter()
            .all(|&(fd, mask)| mux.events(fd).contains(mask))
        {
            return;
        }
    }

    for &(fd, mask) in expected {
        if !mux.events(fd).contains(mask) {
            error!("missing readiness: fd={}; want={:?}; got={:?}", fd, mask, mux.events(fd));
        }
    }
    panic!("expected readiness not found, see above");
}

pub fn expect_nothing_ready(mux: &mut dyn Multiplexer) {
    let n = mux.wait(Some(Duration::from_millis(50))).expect("unable to wait");
    if n != 0 {
        for (fd, mask) in mux.ready() {
            error!("unexpected readiness: fd={}; mask={:?}", fd, mask);
        }
        panic!("descriptors ready, but didn't expect any, see above");
    }
}

/// Assert that `result` is an error and the formatted error (via
/// `fmt::Display`) contains `expected_msg`.
pub fn assert_error<T, E: fmt::Display>(result: Result<T, E>, expected_msg: &str) {
    match result {
        Ok(_) => panic!("unexpected OK result"),
        Err(err) => assert!(
            err.to_string().contains(expected_msg),
            "wanted: {}, got: {}",
            expected_msg,
            err
        ),
    }
}
