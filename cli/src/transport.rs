use anyhow::Context;
use flume::Sender;
use racedisplay::interfaces::transport_interface::TransportEvent;
use racedisplay::pre::message::Message;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::thread::{self, sleep, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// spawn_line_transport starts the transport session on its own thread. It reads one JSON message
/// per line from the given file (stdin if `None`) and forwards the decoded messages.
pub fn spawn_line_transport(
    input: Option<PathBuf>,
    interval: Duration,
    tx: Sender<TransportEvent>,
) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
    let handle = thread::Builder::new()
        .name(String::from("transport"))
        .spawn(move || match input {
            Some(path) => {
                let fh = File::open(&path)
                    .context(format!("Failed to open message file {}!", path.display()))?;
                run_line_transport(BufReader::new(fh), interval, &tx)
            }
            None => run_line_transport(io::stdin().lock(), interval, &tx),
        })
        .context("Failed to spawn transport thread!")?;
    Ok(handle)
}

/// run_line_transport reports the session as opened, forwards every decodable line and reports
/// the session as closed at the end of the input. Lines that cannot be decoded are logged and
/// dropped, empty lines and lines starting with `#` are skipped.
pub fn run_line_transport<R: BufRead>(
    reader: R,
    interval: Duration,
    tx: &Sender<TransportEvent>,
) -> anyhow::Result<()> {
    send(tx, TransportEvent::Opened)?;

    for (i, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                send(tx, TransportEvent::Error(err.to_string()))?;
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match Message::decode(line) {
            Ok(message) => {
                debug!(line = i + 1, action = ?message.action(), "Received message");
                send(tx, TransportEvent::Message(message))?;
            }
            Err(err) => {
                let reason = format!("{:#}", err);
                warn!(line = i + 1, error = %reason, "Dropping malformed message");
                continue;
            }
        }

        if interval > Duration::from_millis(0) {
            sleep(interval);
        }
    }

    send(tx, TransportEvent::Closed)
}

fn send(tx: &Sender<TransportEvent>, event: TransportEvent) -> anyhow::Result<()> {
    tx.send(event)
        .context("Failed to send transport event to the display loop!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn forwards_decodable_lines_between_open_and_close() {
        let input = "\
            {\"action\": \"setup\", \"pilotes\": [{\"id\": 1}]}\n\
            \n\
            # comment\n\
            {not json\n\
            {\"action\": \"finish\"}\n";
        let (tx, rx) = flume::unbounded();
        run_line_transport(Cursor::new(input), Duration::from_millis(0), &tx).unwrap();
        drop(tx);

        let events: Vec<TransportEvent> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], TransportEvent::Opened);
        assert!(matches!(events[1], TransportEvent::Message(Message::Setup(_))));
        assert_eq!(events[2], TransportEvent::Message(Message::Finish));
        assert_eq!(events[3], TransportEvent::Closed);
    }

    #[test]
    fn replays_sample_race_onto_board() {
        use board::core::board::Board;
        use racedisplay::core::dispatcher::{LogUnhandled, MessageDispatcher};
        use racedisplay::core::handle_messages::handle_messages;
        use racedisplay::core::race::{RaceState, RaceStateMachine};
        use racedisplay::interfaces::display_interface::Column;

        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../input/sample_race.jsonl");
        let (tx, rx) = flume::unbounded();
        let transport = spawn_line_transport(Some(path), Duration::from_millis(0), tx).unwrap();

        let mut board = Board::new(Vec::new(), false);
        let mut race = RaceStateMachine::default();
        let mut dispatcher = MessageDispatcher::new(LogUnhandled);
        handle_messages(&rx, &mut race, &mut dispatcher, &mut board).unwrap();
        transport.join().unwrap().unwrap();

        assert_eq!(race.state(), RaceState::Canceled);
        assert!(race.has_final_results());
        assert!(board.title().starts_with("00:"));
        assert_eq!(board.status(), Some("Connection to the race server closed"));
        assert_eq!(board.header(Column::LastLap), Some("Best lap"));
        assert_eq!(board.cell(2, Column::Position), Some("1"));
        assert_eq!(board.cell(1, Column::Lag), Some("00:00.7"));
        assert_eq!(board.cell(1, Column::Status), Some("arrived"));
    }

    #[test]
    fn sample_race_declares_no_drone_down() {
        use racedisplay::pre::message::Field;

        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../input/sample_race.jsonl");
        let (tx, rx) = flume::unbounded();
        run_line_transport(
            BufReader::new(File::open(path).unwrap()),
            Duration::from_millis(0),
            &tx,
        )
        .unwrap();
        drop(tx);

        let updates: Vec<_> = rx
            .iter()
            .filter_map(|event| match event {
                TransportEvent::Message(Message::Update(status)) => Some(status),
                _ => None,
            })
            .collect();
        assert_eq!(updates.len(), 6);
        assert!(updates.iter().all(|status| status.finish != Field::Value(false)));
        assert_eq!(updates[0].finish, Field::Null);
    }

    #[test]
    fn fails_when_display_loop_is_gone() {
        let (tx, rx) = flume::unbounded();
        drop(rx);
        let result = run_line_transport(
            Cursor::new("{\"action\": \"cancel\"}\n"),
            Duration::from_millis(0),
            &tx,
        );
        assert!(result.is_err());
    }
}
