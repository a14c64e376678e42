use serde::Deserialize;

/// Column identifies one column of the standings view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Position,
    Name,
    Drone,
    Points,
    Laps,
    Time,
    Lag,
    LastLap,
    Gate,
    Status,
}

impl Column {
    /// Display order of the standings columns.
    pub const ALL: [Column; 10] = [
        Column::Position,
        Column::Name,
        Column::Drone,
        Column::Points,
        Column::Laps,
        Column::Time,
        Column::Lag,
        Column::LastLap,
        Column::Gate,
        Column::Status,
    ];
}

/// ColumnLabels holds the header texts of the standings view. `best_lap` replaces the `last_lap`
/// header once the final leaderboard was applied.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ColumnLabels {
    pub position: String,
    pub name: String,
    pub drone: String,
    pub points: String,
    pub laps: String,
    pub time: String,
    pub lag: String,
    pub last_lap: String,
    pub best_lap: String,
    pub gate: String,
    pub status: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        ColumnLabels {
            position: String::from("Pos"),
            name: String::from("Pilot"),
            drone: String::from("Drone"),
            points: String::from("Points"),
            laps: String::from("Laps"),
            time: String::from("Time"),
            lag: String::from("Gap"),
            last_lap: String::from("Last lap"),
            best_lap: String::from("Best lap"),
            gate: String::from("Gate"),
            status: String::from("Status"),
        }
    }
}

impl ColumnLabels {
    /// label returns the initial header text of the given column.
    pub fn label(&self, column: Column) -> &str {
        match column {
            Column::Position => &self.position,
            Column::Name => &self.name,
            Column::Drone => &self.drone,
            Column::Points => &self.points,
            Column::Laps => &self.laps,
            Column::Time => &self.time,
            Column::Lag => &self.lag,
            Column::LastLap => &self.last_lap,
            Column::Gate => &self.gate,
            Column::Status => &self.status,
        }
    }

    /// headers returns all columns in display order together with their header text.
    pub fn headers(&self) -> Vec<(Column, String)> {
        Column::ALL
            .iter()
            .map(|&column| (column, self.label(column).to_owned()))
            .collect()
    }
}

/// DisplayPort is the sink exposed by the rendering layer. The race state machine pushes all
/// visible changes through it and never reads anything back.
pub trait DisplayPort {
    /// Set the big title text (race name, countdown or running clock).
    fn set_title(&mut self, text: &str);

    /// Set the status/prompt line, `None` clears it.
    fn set_status(&mut self, text: Option<&str>);

    /// Drop all rows and install the given column headers.
    fn reset_standings(&mut self, headers: &[(Column, String)]);

    /// Append one row for a competitor.
    fn append_row(&mut self, id: u32, cells: &[(Column, String)]);

    /// Update one cell of the row belonging to the given competitor.
    fn update_cell(&mut self, id: u32, column: Column, value: &str);

    /// Change the header text of one column.
    fn relabel_column(&mut self, column: Column, label: &str);

    /// Show or hide the standings view.
    fn show_standings(&mut self, visible: bool);

    /// Called by the message loop once an event was handled completely.
    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
