use crate::pre::message::Message;

/// TransportEvent is what the transport session hands over to the message loop: either a decoded
/// message or a change of the connection status.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Message(Message),
    Closed,
    Error(String),
}

impl TransportEvent {
    /// status_text returns the prose shown for connectivity events, `None` for messages.
    pub fn status_text(&self) -> Option<String> {
        match self {
            TransportEvent::Opened => Some(String::from("Connected to the race server")),
            TransportEvent::Closed => Some(String::from("Connection to the race server closed")),
            TransportEvent::Error(reason) => Some(format!("Connection error: {}", reason)),
            TransportEvent::Message(_) => None,
        }
    }
}
