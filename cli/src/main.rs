mod transport;

use board::core::board::Board;
use clap::Parser;
use racedisplay::core::dispatcher::{LogUnhandled, MessageDispatcher};
use racedisplay::core::handle_messages::handle_messages;
use racedisplay::core::race::RaceStateMachine;
use racedisplay::post::race_result::RaceResult;
use racedisplay::pre::display_opts::DisplayOpts;
use racedisplay::pre::read_display_config::read_display_config;
use std::io;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// init_tracing installs the log subscriber. Logs go to stderr such that they do not mix with the
/// board on stdout; `RUST_LOG` overrides the default level.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get display options from the command line arguments
    let opts: DisplayOpts = DisplayOpts::parse();
    init_tracing(opts.debug);
    opts.validate()?;

    // get display configuration
    let file_config = if let Some(config_path) = &opts.config {
        info!(path = %config_path.display(), "Reading display configuration");
        Some(read_display_config(config_path)?)
    } else {
        None
    };
    let race_config = opts.race_config(file_config);

    info!(
        tick_ms = race_config.tick_period.as_millis() as u64,
        after_leaderboard = ?race_config.after_leaderboard,
        "Starting race display"
    );

    // EXECUTION -----------------------------------------------------------------------------------
    // transport session runs on its own thread and hands over events through the channel
    let (tx, rx) = flume::unbounded();
    let transport = transport::spawn_line_transport(
        opts.input.clone(),
        Duration::from_millis(opts.interval_ms),
        tx,
    )?;

    let mut board = Board::new(io::stdout(), !opts.plain);
    let mut race = RaceStateMachine::new(race_config);
    let mut dispatcher = MessageDispatcher::new(LogUnhandled);
    handle_messages(&rx, &mut race, &mut dispatcher, &mut board)?;

    match transport.join() {
        Ok(result) => result?,
        Err(_) => anyhow::bail!("Transport thread panicked!"),
    }

    // POST-PROCESSING -----------------------------------------------------------------------------
    if let Some(export_path) = &opts.export {
        let result = RaceResult::from_race(&race);
        let path = result.write_csv_to_file(export_path)?;
        info!(
            path = %path,
            competitors = result.rows.len(),
            final_results = result.final_results,
            "Standings exported"
        );
    }

    Ok(())
}
