//! Starting, signaling and reaping the processes behind the tiles

use crate::{
    error::Error,
    tile::{Tile, Tiles},
};
use nix::{
    errno::Errno,
    sys::{
        signal::{kill, Signal},
        wait::{waitpid, WaitPidFlag, WaitStatus},
    },
    unistd::Pid,
};
use serde::{Deserialize, Serialize};
use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

/// Shell used when commands run in [`ExecMode::Shell`]
pub(crate) const DEFAULT_SHELL: &str = "/bin/sh";

// ============================= ExecMode ============================= [[[

/// How a tile's command line is turned into a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ExecMode {
    /// Split into words and executed without a shell
    Direct,
    /// Passed to `$shell -c`
    Shell,
}

impl Default for ExecMode {
    fn default() -> Self {
        Self::Direct
    }
}

// ]]] === ExecMode ===

/// Split `line` into an argument vector the way a POSIX shell would quote it
pub(crate) fn split_command(line: &str) -> Result<Vec<String>, Error> {
    match shlex::split(line) {
        Some(argv) if !argv.is_empty() => Ok(argv),
        Some(_) => Err(Error::config(format!("empty command `{}`", line))),
        None => Err(Error::config(format!(
            "unbalanced quotes in command `{}`",
            line
        ))),
    }
}

/// Whether `err` means no process could be created, rather than the program
/// failing to execute
fn is_fork_failure(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error().map(Errno::from_i32),
        Some(Errno::EAGAIN | Errno::ENOMEM)
    )
}

// ============================ Supervisor ============================ [[[

/// Owns the processes started for the panel's tiles
#[derive(Debug)]
pub(crate) struct Supervisor {
    /// How commands are executed
    mode:     ExecMode,
    /// Shell used in [`ExecMode::Shell`]
    shell:    PathBuf,
    /// Processes started by clicking a launcher, kept only to be reaped
    launched: Vec<Pid>,
}

impl Supervisor {
    /// Create a new [`Supervisor`]
    pub(crate) fn new<P: AsRef<Path>>(mode: ExecMode, shell: P) -> Self {
        Self {
            mode,
            shell: shell.as_ref().to_path_buf(),
            launched: vec![],
        }
    }

    /// Processes started from launchers that have not been reaped yet
    #[cfg(test)]
    pub(crate) fn launched(&self) -> &[Pid] {
        &self.launched
    }

    /// Build the [`Command`] running `line`
    pub(crate) fn command(&self, line: &str) -> Result<Command, Error> {
        match self.mode {
            ExecMode::Direct => {
                let argv = split_command(line)?;
                let mut command = Command::new(&argv[0]);
                command.args(&argv[1..]);
                Ok(command)
            },
            ExecMode::Shell => {
                let mut command = Command::new(&self.shell);
                command.arg("-c").arg(line);
                Ok(command)
            },
        }
    }

    /// Start a process for `line`.
    ///
    /// A program that cannot be executed only costs this one command and gives
    /// `None`. Failing to create the process at all is an [`Error::Spawn`].
    fn spawn(&self, line: &str) -> Result<Option<Pid>, Error> {
        let mut command = self.command(line)?;

        match command.spawn() {
            Ok(child) => Ok(Some(Pid::from_raw(child.id() as i32))),
            Err(source) if is_fork_failure(&source) => Err(Error::Spawn {
                command: line.to_owned(),
                source,
            }),
            Err(e) => {
                log::error!("failed to execute `{}`: {}", line, e);
                Ok(None)
            },
        }
    }

    /// Start the command of `tile` and record its process on it
    pub(crate) fn start(&mut self, tile: &mut Tile) -> Result<(), Error> {
        let pid = self.spawn(tile.command())?;
        if let Some(pid) = pid {
            log::info!(
                "started {} `{}` with pid {}",
                tile.kind(),
                tile.command(),
                pid
            );
        }
        tile.set_pid(pid);
        Ok(())
    }

    /// Run `line` on behalf of a launcher without waiting for it
    pub(crate) fn launch(&mut self, line: &str) -> Result<(), Error> {
        if let Some(pid) = self.spawn(line)? {
            log::info!("launched `{}` with pid {}", line, pid);
            self.launched.push(pid);
        }
        Ok(())
    }

    /// Send `SIGTERM` to every tile's process. Does not wait for them
    pub(crate) fn terminate_all(&self, tiles: &Tiles) {
        for (tile, pid) in tiles.iter().filter_map(|t| t.pid().map(|pid| (t, pid))) {
            log::debug!("terminating `{}` (pid {})", tile.command(), pid);
            if let Err(e) = kill(pid, Signal::SIGTERM) {
                log::debug!("failed to signal pid {}: {}", pid, e);
            }
        }
    }

    /// Collect every child that has exited, returning how many there were.
    ///
    /// A dockapp that exits loses its process id but keeps its window.
    pub(crate) fn reap(&mut self, tiles: &mut Tiles) -> usize {
        let mut reaped = 0;

        for tile in tiles.iter_mut() {
            if let Some(pid) = tile.pid() {
                if Self::has_exited(pid) {
                    log::warn!("`{}` (pid {}) exited", tile.command(), pid);
                    tile.set_pid(None);
                    reaped += 1;
                }
            }
        }

        let before = self.launched.len();
        self.launched.retain(|&pid| !Self::has_exited(pid));
        reaped + before - self.launched.len()
    }

    /// Reap `pid` if it has exited
    fn has_exited(pid: Pid) -> bool {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => false,
            Ok(status) => {
                log::trace!("reaped {:?}", status);
                true
            },
            // Not our child (anymore)
            Err(Errno::ECHILD) => true,
            Err(e) => {
                log::debug!("waitpid({}) failed: {}", pid, e);
                false
            },
        }
    }
}

// ]]] === Supervisor ===

#[cfg(test)]
mod tests {
    use super::{is_fork_failure, split_command, ExecMode, Supervisor, DEFAULT_SHELL};
    use crate::tile::{Tile, Tiles};
    use nix::{
        errno::Errno,
        sys::{
            signal::{kill, Signal},
            wait::{waitpid, WaitPidFlag, WaitStatus},
        },
    };
    use std::{fs, io, os::unix::fs::PermissionsExt, thread, time::Duration};
    use tempfile::tempdir;

    fn program_and_args(supervisor: &Supervisor, line: &str) -> Vec<String> {
        let command = supervisor.command(line).unwrap();
        std::iter::once(command.get_program())
            .chain(command.get_args())
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn direct_mode_splits_like_a_shell() {
        let supervisor = Supervisor::new(ExecMode::Direct, DEFAULT_SHELL);
        assert_eq!(program_and_args(&supervisor, "wmclock -12 -title 'a clock'"), vec![
            "wmclock", "-12", "-title", "a clock"
        ]);
    }

    #[test]
    fn shell_mode_passes_the_line_untouched() {
        let supervisor = Supervisor::new(ExecMode::Shell, DEFAULT_SHELL);
        assert_eq!(program_and_args(&supervisor, "xterm -e 'top' &"), vec![
            "/bin/sh", "-c", "xterm -e 'top' &"
        ]);
    }

    #[test]
    fn unsplittable_commands_are_config_errors() {
        assert!(split_command("xterm -e 'top").unwrap_err().wants_usage());
        assert!(split_command("   ").is_err());
    }

    #[test]
    fn missing_programs_only_affect_their_tile() {
        let mut supervisor = Supervisor::new(ExecMode::Direct, DEFAULT_SHELL);
        let mut tile = Tile::dockapp(0, "pmdock-surely-not-installed", "nothing");
        supervisor.start(&mut tile).unwrap();
        assert!(tile.pid().is_none());
    }

    #[test]
    fn unexecutable_programs_only_affect_their_command() {
        let dir = tempdir().unwrap();
        let program = dir.path().join("not-a-program");
        fs::write(&program, b"\x00\x01\x02garbage").unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
        let line = program.to_string_lossy().into_owned();

        let mut supervisor = Supervisor::new(ExecMode::Direct, DEFAULT_SHELL);
        let mut tile = Tile::dockapp(0, line.as_str(), "nothing");
        assert!(supervisor.start(&mut tile).is_ok());
        assert!(supervisor.launch(&line).is_ok());
    }

    #[test]
    fn only_process_creation_failures_are_fatal() {
        assert!(is_fork_failure(&io::Error::from_raw_os_error(Errno::EAGAIN as i32)));
        assert!(is_fork_failure(&io::Error::from_raw_os_error(Errno::ENOMEM as i32)));
        for errno in [Errno::ENOEXEC, Errno::ENOTDIR, Errno::ELOOP, Errno::ETXTBSY, Errno::E2BIG] {
            assert!(!is_fork_failure(&io::Error::from_raw_os_error(errno as i32)));
        }
        assert!(!is_fork_failure(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[test]
    fn terminating_signals_every_running_tile() {
        let mut supervisor = Supervisor::new(ExecMode::Direct, DEFAULT_SHELL);
        let mut tiles = Tiles::new(vec![
            Tile::dockapp(0, "sleep 30", "sleep"),
            Tile::dockapp(1, "sleep 30", "sleep"),
        ]);
        supervisor.start(tiles.get_mut(0).unwrap()).unwrap();
        supervisor.start(tiles.get_mut(1).unwrap()).unwrap();
        let running = tiles.get(0).unwrap().pid().unwrap();
        let cleared = tiles.get(1).unwrap().pid().unwrap();
        tiles.get_mut(1).unwrap().set_pid(None);

        supervisor.terminate_all(&tiles);

        assert!(matches!(
            waitpid(running, None),
            Ok(WaitStatus::Signaled(pid, Signal::SIGTERM, _)) if pid == running
        ));
        assert_eq!(
            waitpid(cleared, Some(WaitPidFlag::WNOHANG)),
            Ok(WaitStatus::StillAlive)
        );

        kill(cleared, Signal::SIGKILL).unwrap();
        waitpid(cleared, None).unwrap();
    }

    #[test]
    fn launching_tracks_one_process() {
        let mut supervisor = Supervisor::new(ExecMode::Direct, DEFAULT_SHELL);
        supervisor.launch("true").unwrap();
        assert_eq!(supervisor.launched().len(), 1);
    }

    #[test]
    fn exited_dockapps_are_reaped_and_cleared() {
        let mut supervisor = Supervisor::new(ExecMode::Direct, DEFAULT_SHELL);
        let mut tiles = Tiles::new(vec![Tile::dockapp(0, "true", "true")]);
        supervisor.start(tiles.get_mut(0).unwrap()).unwrap();
        assert!(tiles.get(0).unwrap().pid().is_some());

        let mut reaped = 0;
        for _ in 0..500 {
            reaped += supervisor.reap(&mut tiles);
            if reaped > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(reaped, 1);
        assert!(tiles.get(0).unwrap().pid().is_none());
    }
}
