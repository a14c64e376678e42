pub mod display_interface;
pub mod transport_interface;
