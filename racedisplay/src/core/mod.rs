pub mod clock;
pub mod dispatcher;
pub mod handle_messages;
pub mod race;
pub mod standings;
