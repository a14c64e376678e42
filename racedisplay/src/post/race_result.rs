use crate::core::race::RaceStateMachine;
use crate::interfaces::display_interface::Column;
use anyhow::Context;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// StandingsRow is one competitor of the exported standings, every value as displayed. Field order
/// follows the column order of the board.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StandingsRow {
    pub id: u32,
    pub position: String,
    pub name: String,
    pub drone: String,
    pub points: String,
    pub laps: String,
    pub time: String,
    pub lag: String,
    pub lap: String,
    pub gate: String,
    pub status: String,
}

/// RaceResult contains the standings of the last race in display order, ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceResult {
    pub race_name: String,
    pub final_results: bool,
    pub headers: Vec<String>,
    pub rows: Vec<StandingsRow>,
}

impl RaceResult {
    pub fn from_race(race: &RaceStateMachine) -> RaceResult {
        let labels = &race.config().labels;
        let mut headers = vec![String::from("Id")];
        for &column in Column::ALL.iter() {
            if column == Column::LastLap {
                headers.push(race.lap_column_label().to_owned());
            } else {
                headers.push(labels.label(column).to_owned());
            }
        }

        let rows = race
            .standings()
            .records()
            .iter()
            .map(|record| StandingsRow {
                id: record.id,
                position: record.cell(Column::Position),
                name: record.cell(Column::Name),
                drone: record.cell(Column::Drone),
                points: record.cell(Column::Points),
                laps: record.cell(Column::Laps),
                time: record.cell(Column::Time),
                lag: record.cell(Column::Lag),
                lap: record.cell(Column::LastLap),
                gate: record.cell(Column::Gate),
                status: record.cell(Column::Status),
            })
            .collect();

        RaceResult {
            race_name: race.race().map(|r| r.name.to_owned()).unwrap_or_default(),
            final_results: race.has_final_results(),
            headers,
            rows,
        }
    }

    /// write_csv writes the header line and one line per competitor to the given writer.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        wtr.write_record(&self.headers)
            .context("Failed to write standings header!")?;
        for row in self.rows.iter() {
            wtr.serialize(row)
                .context(format!("Failed to write standings of competitor {}!", row.id))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// write_csv_to_file writes the standings to a CSV file and returns its path.
    pub fn write_csv_to_file(&self, path: &Path) -> anyhow::Result<String> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)
            .context(format!("Failed to open export file {}!", path.display()))?;
        self.write_csv(file)?;

        Ok(path.to_string_lossy().into_owned())
    }
}
