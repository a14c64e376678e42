pub mod display_opts;
pub mod message;
pub mod read_display_config;
