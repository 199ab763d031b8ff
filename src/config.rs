//! Configuration options

use crate::{
    cli::Opts,
    error::Error,
    geometry::{Layout, Orientation, Point},
    process::{split_command, ExecMode, DEFAULT_SHELL},
    render::Image,
    tile::{Tile, TileKind, Tiles},
    utils::{deserialize_absolute_path, deserialize_shellexpand},
    x::property::MotifHints,
};
use anyhow::{Context, Result};
use clap::{ArgMatches, FromArgMatches};
use colored::Colorize;
use directories::ProjectDirs;
use format_serde_error::SerdeError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{
    env,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Configuration file name
const CONFIG_FILE: &str = "pmdock.yml";

/// Default shell to run commands within when shell mode is enabled
pub(crate) static SHELL: Lazy<PathBuf> =
    Lazy::new(|| PathBuf::from(env::var("PMDOCK_SHELL").unwrap_or_else(|_| DEFAULT_SHELL.to_owned())));

// =============== GlobalSettings ================= [[[

/// Global configuration settings, read from the optional settings file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GlobalSettings {
    /// Whether logs should be written to a file
    #[serde(alias = "log-to-file")]
    pub(crate) log_to_file: bool,

    /// The directory to write the log to
    #[serde(alias = "log-dir", deserialize_with = "deserialize_shellexpand")]
    pub(crate) log_dir: Option<PathBuf>,

    /// The shell used to run commands in [`ExecMode::Shell`]
    #[serde(deserialize_with = "deserialize_absolute_path")]
    pub(crate) shell: Option<PathBuf>,

    /// How tile commands are executed
    #[serde(alias = "exec-mode")]
    pub(crate) exec_mode: ExecMode,

    /// Number of reads of a dockapp's `WM_HINTS` looking for its icon window
    #[serde(alias = "icon-attempts")]
    pub(crate) icon_attempts: u32,

    /// Pause after a read that found no icon window (milliseconds)
    #[serde(alias = "icon-retry-delay")]
    pub(crate) icon_retry_delay: u64,

    /// Pause after detecting a window manager (milliseconds)
    #[serde(alias = "wm-settle-delay")]
    pub(crate) wm_settle_delay: u64,

    /// Each pause of the unmap/reparent workaround (milliseconds)
    #[serde(alias = "reparent-delay")]
    pub(crate) reparent_delay: u64,
} // ]]] === Global Settings ===

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            log_to_file:      false,
            log_dir:          None,
            shell:            Some(SHELL.to_path_buf()),
            exec_mode:        ExecMode::Direct,
            icon_attempts:    2_u32,
            icon_retry_delay: 100_u64,
            wm_settle_delay:  100_u64,
            reparent_delay:   50_u64,
        }
    }
}

impl GlobalSettings {
    // NOTE: SerdeError doesn't always point out correct error

    /// Load the settings file from a given path
    pub(crate) fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("{}: {}", "Configuration path".bright_blue(), path.display());

        let file = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: '{}'", path.display()))?;
        let res = serde_yaml::from_str(&file).map_err(|e| SerdeError::new(file, e))?;

        Ok(res)
    }

    /// Load `path` if given, otherwise the default file when it exists
    pub(crate) fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_file().filter(|p| p.is_file()) {
                Some(path) => Self::load(path),
                None => Ok(Self::default()),
            },
        }
    }

    /// The shell used in [`ExecMode::Shell`]
    pub(crate) fn shell(&self) -> &Path {
        self.shell.as_deref().unwrap_or_else(|| SHELL.as_path())
    }
}

/// `$PMDOCK_CONFIG_DIR/pmdock.yml`, else `$XDG_CONFIG_HOME/pmdock/pmdock.yml`
pub(crate) fn default_config_file() -> Option<PathBuf> {
    env::var_os("PMDOCK_CONFIG_DIR")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| ProjectDirs::from("", "", env!("CARGO_PKG_NAME")).map(|p| p.config_dir().to_path_buf()))
        .map(|dir| dir.join(CONFIG_FILE))
}

// ================ PanelSettings ================= [[[

/// How the panel window is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PanelSettings {
    /// Position of the panel on the root window
    pub(crate) origin:       Point,
    /// Orientation and tile size
    pub(crate) layout:       Layout,
    /// Requested decorations and window functions
    pub(crate) motif:        MotifHints,
    /// Ask to be kept above other windows
    pub(crate) above:        bool,
    /// Ask to be shown on every desktop
    pub(crate) all_desktops: bool,
} // ]]] === Panel Settings ===

// ================== Tile Specs ================== [[[

/// A tile as defined on the command line, before its icon is decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TileSpec {
    /// `-r NAME -c COMMAND -t dockapp`
    Dockapp {
        /// Command starting the dockapp
        command:       String,
        /// Resource name its window is recognized by
        resource_name: String,
    },
    /// `-i ICON -c COMMAND -t launcher`
    Launcher {
        /// Command run when clicked
        command: String,
        /// Image shown in the tile
        icon:    PathBuf,
    },
}

impl TileSpec {
    /// The tile's command line
    pub(crate) fn command(&self) -> &str {
        match self {
            Self::Dockapp { command, .. } | Self::Launcher { command, .. } => command,
        }
    }

    /// Build the tile at `index`, decoding a launcher's icon
    pub(crate) fn into_tile(self, index: usize) -> Result<Tile, Error> {
        match self {
            Self::Dockapp {
                command,
                resource_name,
            } => Ok(Tile::dockapp(index, command, resource_name)),
            Self::Launcher { command, icon } => {
                Ok(Tile::launcher(index, command, Image::load(icon)?))
            },
        }
    }
}

/// One of the tile-defining arguments, in command-line order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TileArg {
    /// `-r`
    Resource(String),
    /// `-i`
    Icon(PathBuf),
    /// `-c`
    Command(String),
    /// `-t`
    Kind(String),
}

/// Group the tile arguments into tiles.
///
/// `-r`, `-i` and `-c` set pending values which the next `-t` consumes. Values
/// left pending after the last `-t` are ignored.
pub(crate) fn assemble_tiles<I>(args: I) -> Result<Vec<TileSpec>, Error>
where
    I: IntoIterator<Item = TileArg>,
{
    let mut tiles = vec![];
    let mut resource = None;
    let mut icon = None;
    let mut command = None;

    for arg in args {
        match arg {
            TileArg::Resource(name) => resource = Some(name),
            TileArg::Icon(path) => icon = Some(path),
            TileArg::Command(line) => command = Some(line),
            TileArg::Kind(kind) => {
                let command = command
                    .take()
                    .ok_or_else(|| Error::config("-t requires preceding -c to specify command"))?;

                let tile = match TileKind::from_str(&kind) {
                    Ok(TileKind::Dockapp) => TileSpec::Dockapp {
                        command,
                        resource_name: resource.take().ok_or_else(|| {
                            Error::config("dockapp type requires preceding -r to specify resource name")
                        })?,
                    },
                    Ok(TileKind::Launcher) => TileSpec::Launcher {
                        command,
                        icon: icon.take().ok_or_else(|| {
                            Error::config("launcher type requires preceding -i to specify icon")
                        })?,
                    },
                    Err(_) => {
                        return Err(Error::config(format!(
                            "invalid type '{}' (must be 'dockapp' or 'launcher')",
                            kind
                        )));
                    },
                };

                resource = None;
                icon = None;
                tiles.push(tile);
            },
        }
    }

    if tiles.is_empty() {
        return Err(Error::config("no tiles specified"));
    }

    Ok(tiles)
}

// ]]] === Tile Specs ===

// =================== Config ===================== [[[

/// Everything the panel is started with
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Settings file contents
    pub(crate) global:     GlobalSettings,
    /// Panel window settings
    pub(crate) panel:      PanelSettings,
    /// Image drawn behind every tile
    pub(crate) background: PathBuf,
    /// Tiles in panel order
    pub(crate) tiles:      Vec<TileSpec>,
    /// Fork into the background
    pub(crate) daemonize:  bool,
    /// Number of `-v` flags
    pub(crate) verbose:    u8,
}

impl Config {
    /// Build the configuration from parsed arguments and the settings file.
    ///
    /// Invalid tile definitions are returned as [`Error::Config`]
    pub(crate) fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let opts = Opts::from_arg_matches(matches).context("failed to read arguments")?;
        let mut global = GlobalSettings::load_or_default(opts.config.as_deref())?;
        if opts.shell {
            global.exec_mode = ExecMode::Shell;
        }

        let tiles = assemble_tiles(tile_args(matches, &opts))?;
        if global.exec_mode == ExecMode::Direct {
            for tile in &tiles {
                split_command(tile.command())?;
            }
        }

        let orientation = if opts.horizontal {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };

        Ok(Self {
            global,
            panel: PanelSettings {
                origin:       Point::new(opts.x, opts.y),
                layout:       Layout::new(orientation, opts.tile_size),
                motif:        MotifHints::new(opts.functions, opts.decorations),
                above:        opts.above,
                all_desktops: opts.all_desktops,
            },
            background: opts.background,
            tiles,
            daemonize: opts.daemonize,
            verbose: opts.verbose,
        })
    }

    /// Build the tiles, decoding every launcher icon
    pub(crate) fn load_tiles(&self) -> Result<Tiles, Error> {
        self.tiles
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, spec)| spec.into_tile(index))
            .collect::<Result<Vec<_>, _>>()
            .map(Tiles::new)
    }
} // ]]] === Config ===

/// The `-r`, `-i`, `-c` and `-t` arguments in the order they were given
fn tile_args(matches: &ArgMatches, opts: &Opts) -> Vec<TileArg> {
    let indexed = |id: &str| -> Vec<usize> {
        matches.indices_of(id).map(Iterator::collect).unwrap_or_default()
    };

    let mut args = indexed("resource")
        .into_iter()
        .zip(opts.resource.iter().cloned().map(TileArg::Resource))
        .chain(
            indexed("icon")
                .into_iter()
                .zip(opts.icon.iter().cloned().map(TileArg::Icon)),
        )
        .chain(
            indexed("command")
                .into_iter()
                .zip(opts.command.iter().cloned().map(TileArg::Command)),
        )
        .chain(
            indexed("kind")
                .into_iter()
                .zip(opts.kind.iter().cloned().map(TileArg::Kind)),
        )
        .collect::<Vec<_>>();

    args.sort_by_key(|(index, _)| *index);
    args.into_iter().map(|(_, arg)| arg).collect()
}

#[cfg(test)]
mod tests {
    use super::{assemble_tiles, Config, GlobalSettings, TileArg, TileSpec};
    use crate::{
        cli::Opts,
        error::Error,
        geometry::{Orientation, Point},
        process::ExecMode,
    };
    use clap::IntoApp;
    use std::path::PathBuf;

    fn config(args: &[&str]) -> anyhow::Result<Config> {
        let matches = Opts::into_app()
            .try_get_matches_from(std::iter::once("pmdock").chain(args.iter().copied()))
            .expect("arguments parse");
        Config::from_matches(&matches)
    }

    fn config_error(args: &[&str]) -> String {
        let err = config(args).expect_err("configuration is rejected");
        let err = err.downcast_ref::<Error>().expect("a configuration error");
        assert!(err.wants_usage());
        err.to_string()
    }

    #[test]
    fn groups_follow_command_line_order() {
        let config = config(&[
            "-r", "wmclock", "-c", "wmclock -12", "-t", "dockapp", "-i", "term.png", "-c", "xterm",
            "-t", "launcher", "-c", "wmcpu", "-r", "wmcpu", "-t", "dockapp",
        ])
        .expect("valid configuration");

        assert_eq!(config.tiles, vec![
            TileSpec::Dockapp {
                command:       "wmclock -12".into(),
                resource_name: "wmclock".into(),
            },
            TileSpec::Launcher {
                command: "xterm".into(),
                icon:    PathBuf::from("term.png"),
            },
            TileSpec::Dockapp {
                command:       "wmcpu".into(),
                resource_name: "wmcpu".into(),
            },
        ]);
    }

    #[test]
    fn panel_options_are_collected() {
        let config = config(&[
            "-H", "-a", "-A", "-x", "-10", "-y", "20", "-s", "48", "-D", "0x2", "-f", "010", "-d",
            "-vv", "-r", "w", "-c", "w", "-t", "dockapp",
        ])
        .expect("valid configuration");

        assert_eq!(config.panel.origin, Point::new(-10, 20));
        assert_eq!(config.panel.layout.orientation, Orientation::Horizontal);
        assert_eq!(config.panel.layout.tile_size, 48);
        assert_eq!(config.panel.motif.decorations, 2);
        assert_eq!(config.panel.motif.functions, 8);
        assert!(config.panel.above);
        assert!(config.panel.all_desktops);
        assert!(config.daemonize);
        assert_eq!(config.verbose, 2);
        assert_eq!(config.background, PathBuf::from("tile-default.png"));
    }

    #[test]
    fn defaults_give_a_column_of_64_pixel_tiles() {
        let config = config(&["-r", "w", "-c", "w", "-t", "dockapp"]).expect("valid configuration");

        assert_eq!(config.panel.origin, Point::new(0, 0));
        assert_eq!(config.panel.layout.orientation, Orientation::Vertical);
        assert_eq!(config.panel.layout.tile_size, 64);
        assert_eq!(config.panel.motif.to_property(), [0x03, 0, 0, 0, 0]);
        assert!(!config.daemonize);
    }

    #[test]
    fn type_without_command_is_rejected() {
        assert_eq!(
            config_error(&["-r", "wmclock", "-t", "dockapp"]),
            "-t requires preceding -c to specify command"
        );
    }

    #[test]
    fn dockapp_needs_a_resource_name() {
        assert_eq!(
            config_error(&["-c", "wmclock", "-t", "dockapp"]),
            "dockapp type requires preceding -r to specify resource name"
        );
    }

    #[test]
    fn launcher_needs_an_icon() {
        assert_eq!(
            config_error(&["-r", "xterm", "-c", "xterm", "-t", "launcher"]),
            "launcher type requires preceding -i to specify icon"
        );
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert_eq!(
            config_error(&["-c", "xterm", "-t", "applet"]),
            "invalid type 'applet' (must be 'dockapp' or 'launcher')"
        );
    }

    #[test]
    fn a_panel_needs_tiles() {
        assert_eq!(config_error(&["-H"]), "no tiles specified");
        assert_eq!(config_error(&["-r", "w", "-c", "w"]), "no tiles specified");
    }

    #[test]
    fn pending_values_are_consumed_by_each_type() {
        let err = assemble_tiles(vec![
            TileArg::Resource("wmclock".into()),
            TileArg::Command("wmclock".into()),
            TileArg::Kind("dockapp".into()),
            TileArg::Command("wmcpu".into()),
            TileArg::Kind("dockapp".into()),
        ])
        .expect_err("the resource name is not reused");

        assert_eq!(
            err.to_string(),
            "dockapp type requires preceding -r to specify resource name"
        );
    }

    #[test]
    fn leftover_values_are_ignored() {
        let tiles = assemble_tiles(vec![
            TileArg::Icon("a.png".into()),
            TileArg::Command("xterm".into()),
            TileArg::Kind("launcher".into()),
            TileArg::Command("ignored".into()),
        ])
        .expect("valid tiles");

        assert_eq!(tiles.len(), 1);
    }

    #[test]
    fn unsplittable_commands_need_shell_mode() {
        assert_eq!(
            config_error(&["-r", "w", "-c", "w 'unbalanced", "-t", "dockapp"]),
            "unbalanced quotes in command `w 'unbalanced`"
        );

        let config = config(&["-S", "-r", "w", "-c", "w 'unbalanced", "-t", "dockapp"])
            .expect("the shell gets the line unchanged");
        assert_eq!(config.global.exec_mode, ExecMode::Shell);
    }

    #[test]
    fn missing_icons_fail_to_load() {
        let config = config(&["-i", "/nonexistent/icon.png", "-c", "xterm", "-t", "launcher"])
            .expect("valid configuration");

        assert!(matches!(config.load_tiles(), Err(Error::Image { .. })));
    }

    #[test]
    fn dockapp_tiles_are_indexed_in_order() {
        let config = config(&["-r", "a", "-c", "a", "-t", "dockapp", "-r", "b", "-c", "b", "-t", "dockapp"])
            .expect("valid configuration");
        let tiles = config.load_tiles().expect("no images to load");

        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles.get(1).map(|t| (t.index(), t.resource_name())), Some((1, Some("b"))));
    }

    #[test]
    fn settings_accept_kebab_case() {
        let settings: GlobalSettings = serde_yaml::from_str(
            "icon-attempts: 4\nicon-retry-delay: 250\nwm-settle-delay: 0\nreparent-delay: 10\nexec-mode: shell\n",
        )
        .expect("valid settings");

        assert_eq!(settings.icon_attempts, 4);
        assert_eq!(settings.icon_retry_delay, 250);
        assert_eq!(settings.wm_settle_delay, 0);
        assert_eq!(settings.reparent_delay, 10);
        assert_eq!(settings.exec_mode, ExecMode::Shell);
        assert!(!settings.log_to_file);
    }

    #[test]
    fn settings_default_timings() {
        let settings = GlobalSettings::default();

        assert_eq!(settings.icon_attempts, 2);
        assert_eq!(settings.icon_retry_delay, 100);
        assert_eq!(settings.wm_settle_delay, 100);
        assert_eq!(settings.reparent_delay, 50);
        assert_eq!(settings.exec_mode, ExecMode::Direct);
    }
}
