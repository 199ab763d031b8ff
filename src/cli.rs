//! The command line arguments

use crate::{
    core::{DEFAULT_BACKGROUND, DEFAULT_TILE_SIZE},
    utils::wants_color,
};
use clap::{crate_description, crate_version, AppSettings, Parser, ValueHint};
use once_cell::sync::Lazy;
use std::{num::ParseIntError, path::PathBuf};

/// Options for the [`pmdock`] program
#[derive(Parser, Clone, Debug, PartialEq)]
#[clap(
    version = crate_version!(),
    about = <String as AsRef<str>>::as_ref(&APP_ABOUT),
    after_help =  <String as AsRef<str>>::as_ref(&AFTER_HELP),
    override_usage =  <String as AsRef<str>>::as_ref(&OVERRIDE_HELP),
    max_term_width = 100,
    color = clap::ColorChoice::Auto,
    global_setting = AppSettings::DeriveDisplayOrder,
)]
pub(crate) struct Opts {
    /// Show on all virtual desktops
    #[clap(short = 'a', long = "all-desktops")]
    pub(crate) all_desktops: bool,

    /// Show on top of all windows
    #[clap(short = 'A', long = "above")]
    pub(crate) above: bool,

    /// X coordinate of the panel
    #[clap(
        short = 'x',
        value_name = "POSITION",
        default_value = "0",
        allow_hyphen_values = true
    )]
    pub(crate) x: i32,

    /// Y coordinate of the panel
    #[clap(
        short = 'y',
        value_name = "POSITION",
        default_value = "0",
        allow_hyphen_values = true
    )]
    pub(crate) y: i32,

    /// Tile size in pixels
    #[clap(
        short = 's',
        long = "size",
        value_name = "SIZE",
        default_value_t = DEFAULT_TILE_SIZE,
        validator = |s: &str| match s.parse::<u32>() {
            Ok(size) if size > 0 => Ok(()),
            _ => Err(format!("invalid tile size: {}", s)),
        },
    )]
    pub(crate) tile_size: u32,

    /// Tile background image
    #[clap(
        short = 'b',
        long = "background",
        value_name = "IMAGE",
        default_value = DEFAULT_BACKGROUND,
        value_hint = ValueHint::FilePath,
    )]
    pub(crate) background: PathBuf,

    /// Use horizontal layout
    #[clap(short = 'H', long = "horizontal")]
    pub(crate) horizontal: bool,

    /// Window decorations hints
    #[clap(
        short = 'D',
        long = "decorations",
        value_name = "DECOR",
        default_value = "0x00",
        parse(try_from_str = parse_mask),
        long_help = "\
        Decorations field of the `_MOTIF_WM_HINTS` set on the panel. Accepts decimal, \
                     hexadecimal (0x) or octal (leading 0) numbers. The default asks for no \
                     decorations at all"
    )]
    pub(crate) decorations: u32,

    /// Window functions hints
    #[clap(
        short = 'f',
        long = "functions",
        value_name = "FUNCS",
        default_value = "0x00",
        parse(try_from_str = parse_mask),
        long_help = "\
        Functions field of the `_MOTIF_WM_HINTS` set on the panel. Accepts decimal, \
                     hexadecimal (0x) or octal (leading 0) numbers"
    )]
    pub(crate) functions: u32,

    /// Daemonize after swallowing all dockapps
    #[clap(
        short = 'd',
        long = "daemonize",
        long_help = "\
        Send the panel to the background. The invoking process returns once every dockapp has \
                     been swallowed, so scripts can start programs that rely on the panel \
                     afterwards"
    )]
    pub(crate) daemonize: bool,

    /// Resource name for dockapp in the next tile
    #[clap(
        short = 'r',
        long = "resource",
        value_name = "NAME",
        multiple_occurrences = true,
        number_of_values = 1
    )]
    pub(crate) resource: Vec<String>,

    /// Icon path for launcher in the next tile
    #[clap(
        short = 'i',
        long = "icon",
        value_name = "ICON",
        multiple_occurrences = true,
        number_of_values = 1,
        value_hint = ValueHint::FilePath,
    )]
    pub(crate) icon: Vec<PathBuf>,

    /// Command to execute in the next tile
    #[clap(
        short = 'c',
        long = "command",
        value_name = "COMMAND",
        multiple_occurrences = true,
        number_of_values = 1,
        allow_hyphen_values = true,
        value_hint = ValueHint::CommandString,
    )]
    pub(crate) command: Vec<String>,

    /// Add tile (dockapp or launcher)
    #[clap(
        short = 't',
        long = "type",
        value_name = "TYPE",
        multiple_occurrences = true,
        number_of_values = 1,
        long_help = "\
        Close the current tile definition. A `dockapp` needs -r and -c before it, a \
                     `launcher` needs -i and -c. Tiles appear in the order of their -t flags"
    )]
    pub(crate) kind: Vec<String>,

    /// Run tile commands through `/bin/sh -c`
    #[clap(
        short = 'S',
        long = "shell",
        long_help = "\
        Hand every tile command to the shell instead of splitting it into words and executing \
                     it directly. Needed for commands using pipes, redirections or variables"
    )]
    pub(crate) shell: bool,

    /// Display debugging messages on various levels
    #[clap(
        long,
        short,
        parse(from_occurrences),
        long_help = "
        Set the verbosity level of the program. There are 2 extra levels after the default (INFO). \
                     If `-v` is used, DEBUG messages are displayed, and if `-vv` is used TRACE \
                     messages are displayed. The verbosity can also be set with the `PMDOCK_LOG` \
                     environment variable"
    )]
    pub(crate) verbose: u8,

    /// Location of configuration file
    #[clap(
        long,
        takes_value = true,
        number_of_values = 1,
        value_name = "file",
        value_hint = ValueHint::FilePath,
        long_help = "\
        Specify the location of the configuration file. The default location is \
                `$XDG_CONFIG_HOME/pmdock/pmdock.yml`, which is read only if it exists"
    )]
    pub(crate) config: Option<PathBuf>,
}

/// Parse a bitmask the way `strtoul` with base 0 does
pub(crate) fn parse_mask(s: &str) -> Result<u32, ParseIntError> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        u32::from_str_radix(&s[1..], 8)
    } else {
        s.parse()
    }
}

// =============== Prettify Help ==================

/// Yellow ansi code
const YELLOW: &str = "\x1b[0;33m";
/// Green ansi code
const GREEN: &str = "\x1b[0;32m";
/// Bold-red ansi code
const BRED: &str = "\x1b[01;38;5;1m";
/// Reset colors
const RES: &str = "\x1b[0m";

/// Colored options used in the output of `--help`
pub(crate) static APP_ABOUT: Lazy<String> = Lazy::new(|| {
    wants_color()
        .then(|| {
            format!(
                "{}DESCRIPTION: {}{}{}",
                YELLOW,
                GREEN,
                crate_description!(),
                RES
            )
        })
        .unwrap_or_else(|| crate_description!().to_owned())
});

/// Colorized message to override the generated help message
pub(crate) static OVERRIDE_HELP: Lazy<String> = Lazy::new(|| {
    wants_color()
        .then(|| {
            format!(
                "{}pmdock{} [{}OPTIONS{}] [-r NAME|-i ICON] -c COMMAND -t TYPE ...",
                BRED, RES, GREEN, RES
            )
        })
        .unwrap_or_else(|| String::from("pmdock [OPTIONS] [-r NAME|-i ICON] -c COMMAND -t TYPE ..."))
});

/// Colorized message displayed after the help message
pub(crate) static AFTER_HELP: Lazy<String> = Lazy::new(|| {
    wants_color()
        .then(|| {
            format!(
                "Example: {}pmdock{} {}-H -r wmclock -c wmclock -t dockapp -i term.png -c xterm -t \
                 launcher{}",
                BRED, RES, GREEN, RES
            )
        })
        .unwrap_or_else(|| {
            String::from(
                "Example: pmdock -H -r wmclock -c wmclock -t dockapp -i term.png -c xterm -t launcher",
            )
        })
});

#[cfg(test)]
mod tests {
    use super::parse_mask;

    #[test]
    fn masks_parse_like_strtoul() {
        assert_eq!(parse_mask("0"), Ok(0));
        assert_eq!(parse_mask("42"), Ok(42));
        assert_eq!(parse_mask("0x1f"), Ok(0x1f));
        assert_eq!(parse_mask("0X02"), Ok(2));
        assert_eq!(parse_mask("017"), Ok(0o17));
        assert!(parse_mask("0x").is_err());
        assert!(parse_mask("lots").is_err());
    }
}
