use crate::core::dispatcher::{MessageDispatcher, UnhandledSink};
use crate::core::race::RaceStateMachine;
use crate::interfaces::display_interface::DisplayPort;
use crate::interfaces::transport_interface::TransportEvent;
use flume::{Receiver, RecvTimeoutError};
use std::time::Instant;
use tracing::{debug, info};

/// handle_messages runs the display loop: it handles the transport events one after the other and
/// fires the clock ticks in between while the race is running. It returns once the transport side
/// has disconnected.
pub fn handle_messages<S: UnhandledSink>(
    rx: &Receiver<TransportEvent>,
    race: &mut RaceStateMachine,
    dispatcher: &mut MessageDispatcher<S>,
    display: &mut dyn DisplayPort,
) -> anyhow::Result<()> {
    loop {
        // wait for the next event, but not longer than until the next clock tick
        let received = match race.clock().next_due() {
            Some(due) => rx.recv_deadline(due),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(TransportEvent::Message(message)) => {
                debug!(action = ?message.action(), "Handling message");
                dispatcher.dispatch(race, message, Instant::now(), display);
            }
            Ok(event) => race.handle_connection(&event, display),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        // a busy transport must not starve the clock
        race.tick(Instant::now(), display);
        display.flush()?;
    }

    info!(state = ?race.state(), "Transport disconnected, leaving the display loop");
    Ok(())
}
