//! The main loop: X events and queued signals, handled one at a time

use crate::{
    panel::Panel,
    signals::{Notice, SignalQueue},
    x::{xconnection::XConnection, Backend},
};
use anyhow::{Context, Result};
use nix::{
    errno::Errno,
    poll::{poll, PollFd, PollFlags},
    sys::signal::Signal,
};
use std::os::unix::io::AsRawFd;

/// What the loop does after handling a batch of notices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Keep running
    Continue,
    /// Shut down because of the given signal
    Exit(Signal),
}

/// Owns everything the loop dispatches to
pub(crate) struct EventLoop {
    /// Connection to the server
    xconn:   XConnection,
    /// Application state
    panel:   Panel,
    /// Pending signals
    signals: SignalQueue,
}

impl EventLoop {
    /// Create a new [`EventLoop`]
    pub(crate) const fn new(xconn: XConnection, panel: Panel, signals: SignalQueue) -> Self {
        Self {
            xconn,
            panel,
            signals,
        }
    }

    /// The application state
    pub(crate) const fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Run until a terminating signal arrives. Losing the connection is an
    /// error
    pub(crate) fn run(&mut self) -> Result<Signal> {
        loop {
            // Replies read while handling an event can leave more events
            // queued inside the connection, so drain before polling
            while let Some(event) = self.xconn.poll_for_event()? {
                self.panel.handle_event(&self.xconn, event)?;
            }
            self.xconn.flush()?;

            self.wait()?;

            let notices = self.signals.drain()?;
            if let Flow::Exit(signal) = dispatch(&mut self.panel, &notices) {
                log::info!("received {}, shutting down", signal);
                return Ok(signal);
            }
        }
    }

    /// Block until the connection or the signal queue becomes readable
    fn wait(&self) -> Result<()> {
        let mut fds = [
            PollFd::new(self.xconn.fd(), PollFlags::POLLIN),
            PollFd::new(self.signals.as_raw_fd(), PollFlags::POLLIN),
        ];

        match poll(&mut fds, -1) {
            Ok(_) | Err(Errno::EINTR) => Ok(()),
            Err(e) => Err(e).context("failed to poll for events"),
        }
    }
}

/// Act on queued signals
pub(crate) fn dispatch(panel: &mut Panel, notices: &[Notice]) -> Flow {
    let mut flow = Flow::Continue;

    for notice in notices {
        match notice {
            Notice::ChildExited => panel.reap_children(),
            Notice::Terminate(signal) => flow = Flow::Exit(*signal),
        }
    }

    flow
}
