//! Signals delivered as readable data instead of asynchronous handlers

use anyhow::{Context, Result};
use nix::{
    errno::Errno,
    sys::{
        signal::{SigSet, Signal},
        signalfd::{SfdFlags, SignalFd},
    },
};
use std::{
    convert::TryFrom,
    os::unix::io::{AsRawFd, RawFd},
};

/// Something the event loop has to act upon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notice {
    /// Shut down
    Terminate(Signal),
    /// At least one child process changed state
    ChildExited,
}

impl Notice {
    /// Interpret a received signal
    fn from_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::SIGTERM | Signal::SIGINT => Some(Self::Terminate(signal)),
            Signal::SIGCHLD => Some(Self::ChildExited),
            _ => None,
        }
    }
}

/// Queue of pending [`Notice`]s, readable through a file descriptor
pub(crate) struct SignalQueue {
    /// Receives the blocked signals
    fd: SignalFd,
}

impl SignalQueue {
    /// Block the handled signals and start queueing them
    pub(crate) fn install() -> Result<Self> {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGTERM);
        mask.add(Signal::SIGINT);
        mask.add(Signal::SIGCHLD);
        mask.thread_block().context("failed to block signals")?;

        let fd = SignalFd::with_flags(&mask, SfdFlags::SFD_NONBLOCK | SfdFlags::SFD_CLOEXEC)
            .context("failed to create signalfd")?;

        Ok(Self { fd })
    }

    /// Take every pending notice
    pub(crate) fn drain(&mut self) -> Result<Vec<Notice>> {
        let mut notices = vec![];

        loop {
            match self.fd.read_signal() {
                Ok(Some(info)) => {
                    let signal = Signal::try_from(info.ssi_signo as i32)
                        .context("received an unknown signal")?;
                    log::debug!("received {}", signal);

                    if let Some(notice) = Notice::from_signal(signal) {
                        if !notices.contains(&notice) {
                            notices.push(notice);
                        }
                    }
                },
                Ok(None) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e).context("failed to read from signalfd"),
            }
        }

        Ok(notices)
    }
}

impl AsRawFd for SignalQueue {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::Notice;
    use nix::sys::signal::Signal;

    #[test]
    fn signals_map_to_notices() {
        assert_eq!(
            Notice::from_signal(Signal::SIGTERM),
            Some(Notice::Terminate(Signal::SIGTERM))
        );
        assert_eq!(
            Notice::from_signal(Signal::SIGINT),
            Some(Notice::Terminate(Signal::SIGINT))
        );
        assert_eq!(Notice::from_signal(Signal::SIGCHLD), Some(Notice::ChildExited));
        assert_eq!(Notice::from_signal(Signal::SIGHUP), None);
    }
}
