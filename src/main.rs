//! A panel swallowing Window Maker dockapps and holding application launchers

#![deny(
    clippy::all,
    clippy::complexity,
    clippy::correctness,
    clippy::nursery,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    bad_style,
    ellipsis_inclusive_range_patterns,
    exported_private_dependencies,
    ill_formed_attribute_input,
    improper_ctypes,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_abi,
    no_mangle_generic_items,
    non_shorthand_field_patterns,
    noop_method_call,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    pub_use_of_private_extern_crate,
    semicolon_in_expressions_from_macros,
    unconditional_recursion,
    unreachable_pub,
    unsafe_code,
    while_true
)]
#![allow(
    clippy::redundant_pub_crate,
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::doc_markdown,
    clippy::exit,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::struct_excessive_bools,
    clippy::too_many_lines,
    clippy::upper_case_acronyms,
    clippy::unused_self
)]
#![cfg_attr(
    any(test),
    allow(
        clippy::expect_fun_call,
        clippy::expect_used,
        clippy::panic,
        clippy::unwrap_used,
        clippy::wildcard_enum_match_arm,
    )
)]

mod cli;
mod config;
mod core;
mod daemon;
mod error;
mod events;
mod geometry;
mod macros;
mod panel;
mod process;
mod render;
mod signals;
mod swallow;
mod tile;
mod utils;
mod x;

use crate::{
    cli::Opts,
    config::Config,
    daemon::Handshake,
    error::Error,
    events::EventLoop,
    panel::Panel,
    process::Supervisor,
    render::Image,
    signals::SignalQueue,
    swallow::Timing,
    tile::Tiles,
    x::{utils::XUtility, xconnection::XConnection},
};
use anyhow::Result;
use clap::IntoApp;
use colored::Colorize;
use std::process::exit;

fn main() {
    let matches = match Opts::into_app().try_get_matches() {
        Ok(matches) => matches,
        // `--help` and `--version`
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            drop(e.print());
            exit(1);
        },
    };

    let config = match Config::from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            pmdock_error!("{:#}", e);
            if e.downcast_ref::<Error>().map_or(false, Error::wants_usage) {
                eprintln!("\n{}", Opts::into_app().render_usage());
            }
            exit(1);
        },
    };

    let background =
        Image::load(&config.background).unwrap_or_else(|e| pmdock_fatal!("{}", e));
    let tiles = config
        .load_tiles()
        .unwrap_or_else(|e| pmdock_fatal!("{}", e));

    let handshake = if config.daemonize {
        daemon::daemonize().unwrap_or_else(|e| pmdock_fatal!("{:#}", e))
    } else {
        Handshake::none()
    };

    let _logger = utils::initialize_logging(&config)
        .unwrap_or_else(|e| pmdock_fatal!("failed to initialize logging: {:#}", e));

    log::debug!("{}: {:#?}", "Panel settings".bright_blue(), config.panel);

    if let Err(e) = run(&config, tiles, &background, handshake) {
        log::error!("{:#}", e);
        exit(1);
    }
}

/// Bring up the panel and serve events until a terminating signal arrives.
/// Every tile's process is terminated on the way out
fn run(config: &Config, tiles: Tiles, background: &Image, handshake: Handshake) -> Result<()> {
    let signals = SignalQueue::install()?;

    let (conn, screen_num) = XUtility::setup_connection()?;
    let xconn = XConnection::new(conn, screen_num, &config.panel, tiles.len())?;

    let mut panel = Panel::new(
        config.panel.layout,
        tiles,
        background,
        Timing::from(&config.global),
        Supervisor::new(config.global.exec_mode, config.global.shell()),
        handshake,
    );
    panel.realize(&xconn)?;
    let started = panel.start(&xconn);

    let mut event_loop = EventLoop::new(xconn, panel, signals);
    let res = started.and_then(|_| event_loop.run().map(drop));
    event_loop.panel().terminate_children();

    res
}

// vim: ft=rust:et:sw=4:ts=2:sts=4:tw=99:fdm=marker:fmr=[[[,]]]:
