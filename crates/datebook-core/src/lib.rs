pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod event;
pub mod grid;
pub mod render;
pub mod state;
pub mod store;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use crate::grid::MonthRef;
use crate::state::CalendarState;
use crate::store::EventStore;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting datebook"
    );

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(cli.overrides.into_iter().map(|kv| (kv.key, kv.value)))?;
    debug!(today = %cfg.today, color = cfg.color, "configuration resolved");

    let store = EventStore::seeded().context("failed to build the seed events")?;
    let month = MonthRef::containing(cfg.today);
    let mut state = CalendarState::new(month, store);
    let mut renderer = render::Renderer::new(&cfg);

    if cli.rest.is_empty() {
        commands::session(&mut state, &cfg, &mut renderer)?;
    } else {
        let tokens: Vec<String> = cli
            .rest
            .into_iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();
        let inv = cli::Invocation::parse(tokens)?;
        commands::dispatch(&mut state, &cfg, &mut renderer, inv)?;
    }

    info!("done");
    Ok(())
}
