//! CLI command handlers.

mod down;

pub use down::run_down;
