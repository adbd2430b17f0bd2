//! A signal delivered while blocked in `wait` must not surface as an error.

use std::sync::Once;
use std::thread::{self, sleep};
use std::time::{Duration, Instant};
use std::{mem, ptr};

use fdmux::{Backend, EventMask};

mod util;

use util::{init_with_mux, Pipe};

extern "C" fn noop(_: libc::c_int) {}

/// Installs a handler for `SIGUSR1` without `SA_RESTART`, so blocking calls
/// fail with `EINTR`.
fn install_handler() {
    static INSTALL: Once = Once::new();

    INSTALL.call_once(|| unsafe {
        let mut action: libc::sigaction = mem::zeroed();
        action.sa_sigaction = noop as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = 0;
        libc::sigemptyset(&mut action.sa_mask);
        assert_eq!(libc::sigaction(libc::SIGUSR1, &action, ptr::null_mut()), 0);
    })
}

struct Target(libc::pthread_t);

// SAFETY: only used to address the thread with `pthread_kill`.
unsafe impl Send for Target {}

impl Target {
    fn current() -> Target {
        Target(unsafe { libc::pthread_self() })
    }

    fn interrupt(&self) {
        assert_eq!(unsafe { libc::pthread_kill(self.0, libc::SIGUSR1) }, 0);
    }
}

fn interrupted_wait_keeps_waiting(backend: Backend) {
    install_handler();
    let mut mux = init_with_mux(backend);
    let pipe = Pipe::new();
    mux.add(pipe.rfd(), EventMask::READABLE).unwrap();

    let target = Target::current();
    let handle = thread::spawn(move || {
        for _ in 0..3 {
            sleep(Duration::from_millis(50));
            target.interrupt();
        }
    });

    let start = Instant::now();
    assert_eq!(mux.wait(Some(Duration::from_millis(400))).unwrap(), 0);
    assert!(start.elapsed() >= Duration::from_millis(350));
    assert_eq!(mux.events(pipe.rfd()), EventMask::NONE);

    handle.join().unwrap();
}

fn interrupted_wait_sees_readiness(backend: Backend) {
    install_handler();
    let mut mux = init_with_mux(backend);
    let pipe = Pipe::new();
    mux.add(pipe.rfd(), EventMask::READABLE).unwrap();

    let target = Target::current();
    let mut sender = pipe.sender.try_clone().unwrap();
    let handle = thread::spawn(move || {
        use std::io::Write;

        sleep(Duration::from_millis(50));
        target.interrupt();
        sleep(Duration::from_millis(50));
        sender.write_all(b"x").unwrap();
    });

    assert_eq!(mux.wait(None).unwrap(), 1);
    assert!(mux.events(pipe.rfd()).is_readable());

    handle.join().unwrap();
}

#[test]
fn select_interrupted_wait_keeps_waiting() {
    interrupted_wait_keeps_waiting(Backend::Select);
}

#[test]
fn poll_interrupted_wait_keeps_waiting() {
    interrupted_wait_keeps_waiting(Backend::Poll);
}

#[test]
fn select_interrupted_wait_sees_readiness() {
    interrupted_wait_sees_readiness(Backend::Select);
}

#[test]
fn poll_interrupted_wait_sees_readiness() {
    interrupted_wait_sees_readiness(Backend::Poll);
}
