use crate::core::race::AfterLeaderboard;
use crate::interfaces::display_interface::ColumnLabels;
use anyhow::Context;
use helpers::general::InputValueError;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

/// DisplayConfig holds the optional display settings of a JSON configuration file. Every key may
/// be left out.
///
/// * `labels` - Header texts of the standings view
/// * `after_leaderboard` - `return_to_canceled` or `remain_finished`
/// * `tick_ms` - (ms) Period of the local clock emulation
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub labels: ColumnLabels,
    pub after_leaderboard: AfterLeaderboard,
    pub tick_ms: Option<u64>,
}

/// read_display_config reads the JSON file and decodes it into the display configuration struct.
pub fn read_display_config(filepath: &Path) -> anyhow::Result<DisplayConfig> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open display configuration file {}!",
            filepath.display()
        ))?;
    let config: DisplayConfig = serde_json::from_reader(&fh).context(format!(
        "Failed to parse display configuration file {}!",
        filepath.display()
    ))?;

    if let Some(tick_ms) = config.tick_ms {
        if !(1..=1000).contains(&tick_ms) {
            return Err(InputValueError {
                name: "tick_ms",
                value: tick_ms as f64,
            }
            .into());
        }
    }
    Ok(config)
}
