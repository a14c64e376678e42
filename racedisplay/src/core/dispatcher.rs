use crate::core::race::RaceStateMachine;
use crate::interfaces::display_interface::DisplayPort;
use crate::pre::message::Message;
use serde_json::Value;
use std::time::Instant;
use tracing::warn;

/// UnhandledSink receives every message whose action has no handler.
pub trait UnhandledSink {
    fn unhandled(&mut self, message: &Value);
}

/// LogUnhandled writes unhandled messages to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogUnhandled;

impl UnhandledSink for LogUnhandled {
    fn unhandled(&mut self, message: &Value) {
        warn!(message = %message, "No handler for message");
    }
}

/// MessageDispatcher routes each message to the race state machine handler of its action, or to
/// the unhandled sink.
#[derive(Debug, Default)]
pub struct MessageDispatcher<S> {
    sink: S,
}

impl<S: UnhandledSink> MessageDispatcher<S> {
    pub fn new(sink: S) -> MessageDispatcher<S> {
        MessageDispatcher { sink }
    }

    /// dispatch hands the message to its handler. It never fails: messages that do not fit the
    /// current state are dropped by the state machine itself.
    pub fn dispatch(
        &mut self,
        race: &mut RaceStateMachine,
        message: Message,
        now: Instant,
        display: &mut dyn DisplayPort,
    ) {
        match message {
            Message::Setup(setup) => race.handle_setup(setup, display),
            Message::Warmup(warmup) => race.handle_warmup(&warmup, now, display),
            Message::Update(status) => race.handle_update(&status, display),
            Message::Finish => race.handle_finish(display),
            Message::Leaderboard(leaderboard) => race.handle_leaderboard(&leaderboard, display),
            Message::Cancel => race.handle_cancel(display),
            Message::Other(value) => self.sink.unhandled(&value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::race::tests::{Call, Recorder};
    use crate::core::race::RaceState;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Collect {
        messages: Vec<Value>,
    }

    impl UnhandledSink for Collect {
        fn unhandled(&mut self, message: &Value) {
            self.messages.push(message.to_owned());
        }
    }

    fn dispatch_all(texts: &[&str]) -> (RaceStateMachine, Recorder, MessageDispatcher<Collect>) {
        let mut race = RaceStateMachine::default();
        let mut display = Recorder::default();
        let mut dispatcher = MessageDispatcher::new(Collect::default());
        for text in texts {
            let message = Message::decode(text).unwrap();
            dispatcher.dispatch(&mut race, message, Instant::now(), &mut display);
        }
        (race, display, dispatcher)
    }

    #[test]
    fn routes_known_actions() {
        let (race, _, dispatcher) = dispatch_all(&[
            r#"{"action": "setup", "course": {"nom": "Cup", "portes": ["A"]},
                "pilotes": [{"id": 1, "nom": "Alice", "drone": "X4"}]}"#,
            r#"{"action": "warmup", "texte": "GO!", "start": true}"#,
            r#"{"action": "update", "id": 1, "tours": 2}"#,
        ]);

        assert_eq!(race.state(), RaceState::Running);
        assert_eq!(race.standings().get(1).unwrap().laps, 2);
        assert!(dispatcher.sink.messages.is_empty());
    }

    #[test]
    fn unknown_actions_go_to_sink_untouched() {
        let (race, display, dispatcher) = dispatch_all(&[
            r#"{"action": "setup", "pilotes": [{"id": 1}]}"#,
            r#"{"action": "pause", "reason": "rain"}"#,
        ]);

        assert_eq!(race.state(), RaceState::Setup);
        assert_eq!(
            dispatcher.sink.messages,
            vec![json!({"action": "pause", "reason": "rain"})]
        );
        assert!(!display
            .calls
            .iter()
            .any(|call| matches!(call, Call::Cell(..))));
    }

    #[test]
    fn out_of_order_actions_are_dropped() {
        let (race, display, dispatcher) = dispatch_all(&[
            r#"{"action": "update", "id": 1, "tours": 2}"#,
            r#"{"action": "finish"}"#,
            r#"{"action": "leaderboard", "drones": [{"id": 1, "position": 1}]}"#,
            r#"{"action": "warmup", "texte": "GO!", "start": true}"#,
        ]);

        assert_eq!(race.state(), RaceState::Canceled);
        assert!(race.standings().is_empty());
        assert!(display.calls.is_empty());
        assert!(dispatcher.sink.messages.is_empty());
    }
}
