use crate::core::clock::{format, Clock, TICK_PERIOD};
use crate::core::standings::Standings;
use crate::interfaces::display_interface::{Column, ColumnLabels, DisplayPort};
use crate::interfaces::transport_interface::TransportEvent;
use crate::pre::message::{
    Action, DroneStatus, LeaderboardPayload, RaceDescriptor, SetupPayload, WarmupPayload,
};
use serde::Deserialize;
use std::fmt::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceState {
    Canceled,
    Setup,
    Running,
    Finished,
}

impl Default for RaceState {
    fn default() -> Self {
        RaceState::Canceled
    }
}

/// AfterLeaderboard selects the state reached once the final leaderboard was applied.
/// `ReturnToCanceled` is ready for the next setup right away, `RemainFinished` keeps the race
/// finished until an explicit cancel arrives.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AfterLeaderboard {
    ReturnToCanceled,
    RemainFinished,
}

impl Default for AfterLeaderboard {
    fn default() -> Self {
        AfterLeaderboard::ReturnToCanceled
    }
}

/// * `tick_period` - Period of the local clock emulation
/// * `after_leaderboard` - State reached after the final leaderboard
/// * `labels` - Header texts of the standings view
#[derive(Debug, Clone)]
pub struct RaceConfig {
    pub tick_period: Duration,
    pub after_leaderboard: AfterLeaderboard,
    pub labels: ColumnLabels,
}

impl Default for RaceConfig {
    fn default() -> Self {
        RaceConfig {
            tick_period: TICK_PERIOD,
            after_leaderboard: AfterLeaderboard::default(),
            labels: ColumnLabels::default(),
        }
    }
}

/// RaceStateMachine interprets the race messages. It owns the clock and the standings and pushes
/// every visible change to the display. Messages that are not expected in the current state are
/// ignored without touching anything.
#[derive(Debug)]
pub struct RaceStateMachine {
    config: RaceConfig,
    state: RaceState,
    race: Option<RaceDescriptor>,
    clock: Clock,
    standings: Standings,
    final_results: bool,
}

impl RaceStateMachine {
    pub fn new(config: RaceConfig) -> RaceStateMachine {
        RaceStateMachine {
            clock: Clock::new(config.tick_period),
            config,
            state: RaceState::Canceled,
            race: None,
            standings: Standings::default(),
            final_results: false,
        }
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn standings(&self) -> &Standings {
        &self.standings
    }

    pub fn race(&self) -> Option<&RaceDescriptor> {
        self.race.as_ref()
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// has_final_results is true once a leaderboard was applied to the current standings.
    pub fn has_final_results(&self) -> bool {
        self.final_results
    }

    /// lap_column_label returns the current header of the lap time column.
    pub fn lap_column_label(&self) -> &str {
        if self.final_results {
            &self.config.labels.best_lap
        } else {
            &self.config.labels.last_lap
        }
    }

    // ---------------------------------------------------------------------------------------------
    // MESSAGE HANDLERS ----------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// handle_setup installs a new race and its competitors (Canceled -> Setup).
    pub fn handle_setup(&mut self, setup: SetupPayload, display: &mut dyn DisplayPort) {
        if !self.expect(RaceState::Canceled, Action::Setup) {
            return;
        }

        display.set_title("");
        display.set_status(None);
        display.reset_standings(&self.config.labels.headers());

        self.standings.reset(&setup.competitors);
        self.final_results = false;
        for record in self.standings.records() {
            display.append_row(record.id, &record.cells());
        }
        display.show_standings(true);

        display.set_title(&setup.race.name);
        display.set_status(Some(&race_summary(&setup.race)));

        info!(
            race = %setup.race.name,
            competitors = self.standings.len(),
            "Race set up"
        );
        self.race = Some(setup.race);
        self.state = RaceState::Setup;
    }

    /// handle_warmup shows the warm-up text in the title and, once `start` is set, starts the race
    /// clock instead (Setup -> Running). The start text is not shown.
    pub fn handle_warmup(
        &mut self,
        warmup: &WarmupPayload,
        now: Instant,
        display: &mut dyn DisplayPort,
    ) {
        if !self.expect(RaceState::Setup, Action::Warmup) {
            return;
        }

        if !warmup.start {
            display.set_title(&warmup.text);
            return;
        }

        self.clock.start(now);
        display.set_title(&self.clock.text());

        info!("Race started");
        self.state = RaceState::Running;
    }

    /// handle_update applies a live drone status while the race is running.
    pub fn handle_update(&mut self, status: &DroneStatus, display: &mut dyn DisplayPort) {
        if !self.expect(RaceState::Running, Action::Update) {
            return;
        }

        if let Some(cells) = self.standings.apply_update(status) {
            for (column, value) in cells.iter() {
                display.update_cell(status.id, *column, value);
            }
        }
    }

    /// handle_finish stops the clock (Running -> Finished).
    pub fn handle_finish(&mut self, display: &mut dyn DisplayPort) {
        if !self.expect(RaceState::Running, Action::Finish) {
            return;
        }

        self.clock.stop();
        self.state = RaceState::Finished;
        display.set_status(Some("Race finished! Waiting for the final leaderboard..."));

        info!(elapsed = %self.clock.text(), "Race finished");
    }

    /// handle_leaderboard applies the authoritative final results (Finished -> Canceled, or stays
    /// Finished with `AfterLeaderboard::RemainFinished`). The final table stays visible.
    pub fn handle_leaderboard(
        &mut self,
        leaderboard: &LeaderboardPayload,
        display: &mut dyn DisplayPort,
    ) {
        if !self.expect(RaceState::Finished, Action::Leaderboard) {
            return;
        }

        for (id, cells) in self.standings.apply_leaderboard(&leaderboard.drones) {
            for (column, value) in cells.iter() {
                display.update_cell(id, *column, value);
            }
        }
        self.final_results = true;
        display.relabel_column(Column::LastLap, &self.config.labels.best_lap);
        display.set_status(Some("Final results"));

        self.state = match self.config.after_leaderboard {
            AfterLeaderboard::ReturnToCanceled => RaceState::Canceled,
            AfterLeaderboard::RemainFinished => RaceState::Finished,
        };
        info!(
            drones = leaderboard.drones.len(),
            state = ?self.state,
            "Final leaderboard applied"
        );
    }

    /// handle_cancel stops the clock and hides the display from any state.
    pub fn handle_cancel(&mut self, display: &mut dyn DisplayPort) {
        self.clock.stop();

        display.set_title("");
        display.set_status(None);
        display.show_standings(false);

        if self.state != RaceState::Canceled {
            info!(from = ?self.state, "Race canceled");
        }
        self.state = RaceState::Canceled;
    }

    /// handle_connection renders connectivity changes as status prose. Neither the state nor the
    /// standings are touched.
    pub fn handle_connection(&mut self, event: &TransportEvent, display: &mut dyn DisplayPort) {
        if let Some(text) = event.status_text() {
            info!(status = %text, "Connection status changed");
            display.set_status(Some(&text));
        }
    }

    /// tick fires the due clock ticks and pushes the clock text to the title. Returns the number
    /// of ticks fired.
    pub fn tick(&mut self, now: Instant, display: &mut dyn DisplayPort) -> u32 {
        let fired = self.clock.fire_due(now);
        if fired > 0 {
            display.set_title(&self.clock.text());
        }
        fired
    }

    fn expect(&self, expected: RaceState, action: Action) -> bool {
        if self.state == expected {
            return true;
        }
        debug!(
            action = action.tag(),
            state = ?self.state,
            expected = ?expected,
            "Ignoring message in the wrong state"
        );
        false
    }
}

impl Default for RaceStateMachine {
    fn default() -> Self {
        RaceStateMachine::new(RaceConfig::default())
    }
}

/// race_summary composes the prose shown after a setup: the active gates, the time limit and the
/// number of laps, the latter two only if relevant.
pub fn race_summary(race: &RaceDescriptor) -> String {
    let mut summary = String::new();

    if race.gates.is_empty() {
        summary.push_str("No active gate.");
    } else {
        write!(&mut summary, "Active gates: {}.", race.gates.join(", ")).unwrap();
    }
    if let Some(time_limit_ds) = race.time_limit_ds {
        write!(
            &mut summary,
            " Time limit: {}.",
            format(time_limit_ds as f64 / 10.0)
        )
        .unwrap();
    }
    match race.lap_target {
        Some(laps) if laps > 0 => {
            write!(&mut summary, " Laps to complete: {}.", laps).unwrap();
        }
        _ => {}
    }

    summary
}
