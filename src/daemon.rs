//! Running in the background
//!
//! With `--daemonize` the invoking process does not return until every
//! dockapp has been swallowed. It forks the daemon and then blocks waiting for
//! a single `SIGUSR1`, which the daemon sends once through its [`Handshake`].
//! A daemon that gives up before that point sends `SIGUSR2` instead and the
//! invoking process exits with a failure status.

use anyhow::{anyhow, Context, Result};
use daemonize::Daemonize;
use nix::{
    sys::signal::{kill, SigSet, Signal},
    unistd::Pid,
};
use std::{env, fs::OpenOptions, process};

/// The daemon's side of the startup handshake
#[derive(Debug, Default)]
pub(crate) struct Handshake {
    /// Process waiting for the signal; `None` once it was sent or when not
    /// running as a daemon
    parent:   Option<Pid>,
    /// Whether startup has been reported complete
    complete: bool,
}

impl Handshake {
    /// A handshake nobody waits on
    pub(crate) const fn none() -> Self {
        Self {
            parent:   None,
            complete: false,
        }
    }

    /// A handshake reporting to `parent`
    pub(crate) const fn with_parent(parent: Pid) -> Self {
        Self {
            parent:   Some(parent),
            complete: false,
        }
    }

    /// Whether startup has been reported complete
    pub(crate) const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Report that startup is complete. Only the first call signals the parent
    pub(crate) fn notify(&mut self) {
        self.complete = true;

        if let Some(parent) = self.parent.take() {
            log::info!("startup complete, releasing pid {}", parent);
            Self::send(parent, Signal::SIGUSR1);
        }
    }

    /// Send `signal` to the waiting process
    fn send(parent: Pid, signal: Signal) {
        if let Err(e) = kill(parent, signal) {
            log::warn!("failed to signal pid {}: {}", parent, e);
        }
    }
}

impl Drop for Handshake {
    fn drop(&mut self) {
        if let Some(parent) = self.parent.take() {
            log::debug!("startup failed, releasing pid {}", parent);
            Self::send(parent, Signal::SIGUSR2);
        }
    }
}

/// Fork into the background.
///
/// Only the daemon returns. The invoking process exits 0 once it receives the
/// handshake signal.
pub(crate) fn daemonize() -> Result<Handshake> {
    let parent = Pid::this();

    // Blocked before forking so a signal sent early is not lost
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGUSR1);
    mask.add(Signal::SIGUSR2);
    mask.thread_block().context("failed to block the handshake signals")?;

    let mut daemon = Daemonize::new()
        .working_directory(env::current_dir().context("failed to get current directory")?)
        .umask(0o022)
        .exit_action(move || match mask.wait() {
            Ok(Signal::SIGUSR1) => {},
            Ok(_) => process::exit(1),
            Err(e) => {
                crate::pmdock_error!("failed waiting for the daemon: {}", e);
                process::exit(1);
            },
        });

    // Keep reporting errors where the user can see them
    if let Ok(stdout) = OpenOptions::new().write(true).open("/dev/stdout") {
        daemon = daemon.stdout(stdout);
    }
    if let Ok(stderr) = OpenOptions::new().write(true).open("/dev/stderr") {
        daemon = daemon.stderr(stderr);
    }

    daemon
        .start()
        .map_err(|e| anyhow!("failed to daemonize: {}", e))?;

    mask.thread_unblock()
        .context("failed to unblock the handshake signals")?;

    Ok(Handshake::with_parent(parent))
}

#[cfg(test)]
mod tests {
    use super::Handshake;
    use nix::{sys::signal::Signal, unistd::Pid};
    use std::{os::unix::process::ExitStatusExt, process::Command};

    #[test]
    fn without_parent_only_marks_completion() {
        let mut handshake = Handshake::none();
        assert!(!handshake.is_complete());
        handshake.notify();
        assert!(handshake.is_complete());
    }

    #[test]
    fn parent_is_signaled_exactly_once() {
        let mut waiter = Command::new("sleep").arg("30").spawn().unwrap();
        let mut handshake = Handshake::with_parent(Pid::from_raw(waiter.id() as i32));

        handshake.notify();
        handshake.notify();

        let status = waiter.wait().unwrap();
        assert_eq!(status.signal(), Some(Signal::SIGUSR1 as i32));
        assert!(handshake.is_complete());
    }

    #[test]
    fn dropping_before_completion_reports_failure() {
        let mut waiter = Command::new("sleep").arg("30").spawn().unwrap();
        drop(Handshake::with_parent(Pid::from_raw(waiter.id() as i32)));

        let status = waiter.wait().unwrap();
        assert_eq!(status.signal(), Some(Signal::SIGUSR2 as i32));
    }
}
