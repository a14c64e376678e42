use crate::core::clock::TICK_PERIOD;
use crate::core::race::{AfterLeaderboard, RaceConfig};
use crate::pre::read_display_config::DisplayConfig;
use clap::Parser;
use helpers::general::InputValueError;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "race-display",
    about = "Live race clock and standings for drone races"
)]
pub struct DisplayOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Keep the race finished after the final leaderboard until a cancel arrives
    #[clap(long)]
    pub hold_finished: bool,

    /// Print the board without clearing the terminal in between
    #[clap(long)]
    pub plain: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to a JSON-lines file with one race message per line (OPTIONAL: stdin if not set)
    #[clap(short, long)]
    pub input: Option<PathBuf>,

    /// Set path to the JSON display configuration file
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Set path of the CSV file the final standings are written to on exit
    #[clap(short, long)]
    pub export: Option<PathBuf>,

    /// Set delay in milliseconds between two replayed messages
    #[clap(long, default_value = "0")]
    pub interval_ms: u64,

    /// Set clock period in milliseconds, should be in the range [1, 1000] (default 100)
    #[clap(short, long)]
    pub tick_ms: Option<u64>,
}

impl DisplayOpts {
    /// validate checks the numeric options for their allowed ranges.
    pub fn validate(&self) -> Result<(), InputValueError> {
        if let Some(tick_ms) = self.tick_ms {
            if !(1..=1000).contains(&tick_ms) {
                return Err(InputValueError {
                    name: "tick_ms",
                    value: tick_ms as f64,
                });
            }
        }
        if self.interval_ms > 60_000 {
            return Err(InputValueError {
                name: "interval_ms",
                value: self.interval_ms as f64,
            });
        }
        Ok(())
    }

    /// race_config merges the command line options with the optional configuration file. Command
    /// line options win.
    pub fn race_config(&self, file: Option<DisplayConfig>) -> RaceConfig {
        let file = file.unwrap_or_default();

        let tick_period = self
            .tick_ms
            .or(file.tick_ms)
            .map_or(TICK_PERIOD, Duration::from_millis);
        let after_leaderboard = if self.hold_finished {
            AfterLeaderboard::RemainFinished
        } else {
            file.after_leaderboard
        };

        RaceConfig {
            tick_period,
            after_leaderboard,
            labels: file.labels,
        }
    }
}
