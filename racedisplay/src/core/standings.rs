use crate::core::clock::format;
use crate::interfaces::display_interface::Column;
use crate::pre::message::{CompetitorEntry, DroneStatus, Field, Position};
use helpers::general::{number_text, seconds_to_deciseconds};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStatus {
    Grounded,
    InFlight,
    Arrived,
    DeclaredDown,
}

impl Default for FlightStatus {
    fn default() -> Self {
        FlightStatus::Grounded
    }
}

impl FlightStatus {
    /// from_finish maps the `finish` field of a drone status: null means the drone is still
    /// flying, true that it cleared the race and false that it was declared down.
    pub fn from_finish(finish: Option<bool>) -> FlightStatus {
        match finish {
            None => FlightStatus::InFlight,
            Some(true) => FlightStatus::Arrived,
            Some(false) => FlightStatus::DeclaredDown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FlightStatus::Grounded => "grounded",
            FlightStatus::InFlight => "flying",
            FlightStatus::Arrived => "arrived",
            FlightStatus::DeclaredDown => "down",
        }
    }
}

/// CompetitorRecord is one row of the standings. Times are stored in deciseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorRecord {
    pub id: u32,
    pub name: String,
    pub drone: String,
    pub position: Option<Position>,
    pub points: f64,
    pub elapsed_ds: u64,
    pub laps: u32,
    pub lag_ds: Option<u64>,
    pub last_lap_ds: Option<u64>,
    pub last_gate: String,
    pub flight_status: FlightStatus,
}

impl CompetitorRecord {
    pub fn new(entry: &CompetitorEntry) -> CompetitorRecord {
        CompetitorRecord {
            id: entry.id,
            name: entry.name.to_owned(),
            drone: entry.drone.to_owned(),
            position: None,
            points: 0.0,
            elapsed_ds: 0,
            laps: 0,
            lag_ds: None,
            last_lap_ds: None,
            last_gate: String::from("-"),
            flight_status: FlightStatus::Grounded,
        }
    }

    /// cell returns the displayed text of one column.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Position => self
                .position
                .as_ref()
                .map_or_else(|| String::from("-"), |position| position.to_string()),
            Column::Name => self.name.to_owned(),
            Column::Drone => self.drone.to_owned(),
            Column::Points => number_text(self.points),
            Column::Laps => self.laps.to_string(),
            Column::Time => format_ds(self.elapsed_ds),
            Column::Lag => self.lag_ds.map_or_else(|| String::from("-"), format_ds),
            Column::LastLap => self.last_lap_ds.map_or_else(|| String::from("-"), format_ds),
            Column::Gate => self.last_gate.to_owned(),
            Column::Status => self.flight_status.label().to_owned(),
        }
    }

    /// cells returns the displayed text of all columns in display order.
    pub fn cells(&self) -> Vec<(Column, String)> {
        Column::ALL
            .iter()
            .map(|&column| (column, self.cell(column)))
            .collect()
    }

    /// apply overwrites every attribute the status carries and returns the touched columns.
    /// Missing or null fields keep their previous value.
    pub fn apply(&mut self, status: &DroneStatus) -> Vec<Column> {
        let mut touched = Vec::new();

        if let Some(position) = &status.position {
            self.position = Some(position.to_owned());
            touched.push(Column::Position);
        }
        if let Some(points) = status.points {
            self.points = points;
            touched.push(Column::Points);
        }
        if let Some(laps) = status.laps {
            self.laps = laps;
            touched.push(Column::Laps);
        }
        if let Some(elapsed_s) = status.elapsed_s {
            self.elapsed_ds = seconds_to_deciseconds(elapsed_s);
            touched.push(Column::Time);
        }
        if let Some(lag_s) = status.lag_s {
            self.lag_ds = Some(seconds_to_deciseconds(lag_s));
            touched.push(Column::Lag);
        }
        if let Some(lap_time_s) = status.lap_time_s {
            self.last_lap_ds = Some(seconds_to_deciseconds(lap_time_s));
            touched.push(Column::LastLap);
        }
        if let Some(gate) = status.gate_label() {
            self.last_gate = gate;
            touched.push(Column::Gate);
        }
        match &status.finish {
            Field::Absent => {}
            Field::Null => {
                self.flight_status = FlightStatus::from_finish(None);
                touched.push(Column::Status);
            }
            Field::Value(finish) => {
                self.flight_status = FlightStatus::from_finish(Some(*finish));
                touched.push(Column::Status);
            }
        }

        touched
    }
}

fn format_ds(deciseconds: u64) -> String {
    format(deciseconds as f64 / 10.0)
}

/// Standings holds one record per competitor of the current race, in setup order.
#[derive(Debug, Default)]
pub struct Standings {
    records: Vec<CompetitorRecord>,
    index: HashMap<u32, usize>,
}

impl Standings {
    /// reset replaces all records by default records for the given competitors. Repeated ids
    /// keep their first entry.
    pub fn reset(&mut self, competitors: &[CompetitorEntry]) {
        self.records.clear();
        self.index.clear();

        for entry in competitors.iter() {
            if self.index.contains_key(&entry.id) {
                warn!(id = entry.id, "Duplicate competitor id in setup, keeping the first entry");
                continue;
            }
            self.index.insert(entry.id, self.records.len());
            self.records.push(CompetitorRecord::new(entry));
        }
    }

    /// apply_update applies one drone status and returns the touched cells with their new text.
    /// Unknown ids leave the table untouched and return `None`.
    pub fn apply_update(&mut self, status: &DroneStatus) -> Option<Vec<(Column, String)>> {
        let record = match self.index.get(&status.id) {
            Some(&idx) => &mut self.records[idx],
            None => {
                debug!(id = status.id, "Ignoring status of unknown competitor");
                return None;
            }
        };

        let touched = record.apply(status);
        Some(
            touched
                .into_iter()
                .map(|column| (column, record.cell(column)))
                .collect(),
        )
    }

    /// apply_leaderboard applies every record of the final leaderboard with the same rule as
    /// apply_update and returns the touched cells per known competitor.
    pub fn apply_leaderboard(
        &mut self,
        drones: &[DroneStatus],
    ) -> Vec<(u32, Vec<(Column, String)>)> {
        drones
            .iter()
            .filter_map(|status| self.apply_update(status).map(|cells| (status.id, cells)))
            .collect()
    }

    pub fn get(&self, id: u32) -> Option<&CompetitorRecord> {
        self.index.get(&id).map(|&idx| &self.records[idx])
    }

    pub fn records(&self) -> &[CompetitorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<CompetitorEntry> {
        vec![
            CompetitorEntry {
                id: 7,
                name: String::from("Alice"),
                drone: String::from("X4"),
            },
            CompetitorEntry {
                id: 3,
                name: String::from("Bob"),
                drone: String::from("Quad"),
            },
        ]
    }

    fn status(id: u32) -> DroneStatus {
        DroneStatus {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn reset_creates_default_records_in_order() {
        let mut standings = Standings::default();
        standings.reset(&entries());

        assert_eq!(standings.len(), 2);
        let ids: Vec<u32> = standings.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 3]);

        let record = standings.get(3).unwrap();
        assert_eq!(record.name, "Bob");
        assert_eq!(record.points, 0.0);
        assert_eq!(record.laps, 0);
        assert_eq!(record.elapsed_ds, 0);
        assert_eq!(record.flight_status, FlightStatus::Grounded);
        assert_eq!(
            record.cells(),
            vec![
                (Column::Position, String::from("-")),
                (Column::Name, String::from("Bob")),
                (Column::Drone, String::from("Quad")),
                (Column::Points, String::from("0")),
                (Column::Laps, String::from("0")),
                (Column::Time, String::from("00:00.0")),
                (Column::Lag, String::from("-")),
                (Column::LastLap, String::from("-")),
                (Column::Gate, String::from("-")),
                (Column::Status, String::from("grounded")),
            ]
        );
    }

    #[test]
    fn reset_replaces_previous_competitors() {
        let mut standings = Standings::default();
        standings.reset(&entries());
        standings.reset(&entries()[1..]);

        assert_eq!(standings.len(), 1);
        assert!(standings.get(7).is_none());
        assert!(standings.get(3).is_some());
    }

    #[test]
    fn reset_skips_duplicate_ids() {
        let mut competitors = entries();
        competitors.push(CompetitorEntry {
            id: 7,
            name: String::from("Impostor"),
            drone: String::from("-"),
        });

        let mut standings = Standings::default();
        standings.reset(&competitors);
        assert_eq!(standings.len(), 2);
        assert_eq!(standings.get(7).unwrap().name, "Alice");
    }

    #[test]
    fn fractional_points_are_shown_as_sent() {
        let mut standings = Standings::default();
        standings.reset(&entries());

        let mut scored = status(3);
        scored.points = Some(4.5);
        let cells = standings.apply_update(&scored).unwrap();
        assert_eq!(cells, vec![(Column::Points, String::from("4.5"))]);

        scored.points = Some(6.0);
        standings.apply_update(&scored);
        assert_eq!(standings.get(3).unwrap().cell(Column::Points), "6");
    }

    #[test]
    fn update_of_laps_touches_only_laps() {
        let mut standings = Standings::default();
        standings.reset(&entries());
        let mut seeded = status(7);
        seeded.points = Some(12.0);
        seeded.lag_s = Some(1.5);
        seeded.gate = Field::Value(serde_json::json!("G2"));
        seeded.finish = Field::Null;
        standings.apply_update(&seeded);

        let before_7 = standings.get(7).unwrap().clone();
        let before_3 = standings.get(3).unwrap().clone();

        let mut laps = status(7);
        laps.laps = Some(3);
        let cells = standings.apply_update(&laps).unwrap();

        assert_eq!(cells, vec![(Column::Laps, String::from("3"))]);
        let after_7 = standings.get(7).unwrap();
        assert_eq!(after_7.laps, 3);
        assert_eq!(
            CompetitorRecord {
                laps: before_7.laps,
                ..after_7.clone()
            },
            before_7
        );
        assert_eq!(standings.get(3).unwrap(), &before_3);
    }

    #[test]
    fn missing_lag_and_lap_keep_previous_values() {
        let mut standings = Standings::default();
        standings.reset(&entries());

        let mut first = status(3);
        first.lag_s = Some(2.0);
        first.lap_time_s = Some(31.27);
        standings.apply_update(&first);

        let mut second = status(3);
        second.elapsed_s = Some(62.5);
        let cells = standings.apply_update(&second).unwrap();

        assert_eq!(cells, vec![(Column::Time, String::from("01:02.5"))]);
        let record = standings.get(3).unwrap();
        assert_eq!(record.lag_ds, Some(20));
        assert_eq!(record.last_lap_ds, Some(313));
        assert_eq!(record.cell(Column::LastLap), "00:31.3");
    }

    #[test]
    fn finish_field_drives_flight_status() {
        let mut standings = Standings::default();
        standings.reset(&entries());

        let mut flying = status(7);
        flying.finish = Field::Null;
        standings.apply_update(&flying);
        assert_eq!(standings.get(7).unwrap().flight_status, FlightStatus::InFlight);

        let mut down = status(7);
        down.finish = Field::Value(false);
        standings.apply_update(&down);
        assert_eq!(
            standings.get(7).unwrap().flight_status,
            FlightStatus::DeclaredDown
        );

        let mut arrived = status(7);
        arrived.finish = Field::Value(true);
        let cells = standings.apply_update(&arrived).unwrap();
        assert_eq!(cells, vec![(Column::Status, String::from("arrived"))]);
    }

    #[test]
    fn gate_is_reset_by_falsy_value() {
        let mut standings = Standings::default();
        standings.reset(&entries());

        let mut passed = status(3);
        passed.gate = Field::Value(serde_json::json!("G1"));
        standings.apply_update(&passed);
        assert_eq!(standings.get(3).unwrap().last_gate, "G1");

        let mut cleared = status(3);
        cleared.gate = Field::Value(serde_json::json!(""));
        standings.apply_update(&cleared);
        assert_eq!(standings.get(3).unwrap().last_gate, "-");
    }

    #[test]
    fn unknown_ids_do_not_create_rows() {
        let mut standings = Standings::default();
        standings.reset(&entries());

        let mut stray = status(99);
        stray.laps = Some(1);
        assert!(standings.apply_update(&stray).is_none());
        assert_eq!(standings.len(), 2);
        assert!(standings.get(99).is_none());
    }

    #[test]
    fn leaderboard_applies_every_known_record() {
        let mut standings = Standings::default();
        standings.reset(&entries());

        let mut first = status(3);
        first.position = Some(Position::Rank(1));
        first.lap_time_s = Some(28.0);
        let mut second = status(7);
        second.position = Some(Position::Rank(2));
        let applied = standings.apply_leaderboard(&[first, second, status(42)]);

        let ids: Vec<u32> = applied.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![3, 7]);
        assert_eq!(standings.get(3).unwrap().cell(Column::Position), "1");
        assert_eq!(standings.get(3).unwrap().cell(Column::LastLap), "00:28.0");
        assert_eq!(standings.get(7).unwrap().cell(Column::Position), "2");
    }
}
