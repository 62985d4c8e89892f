//! # Hair Sim Entry Point
//!
//! Opens a window and runs the hair demo. Window, device and event handling
//! live in the `app` module.
//!
//! Usage: `hair_sim [settings.ron]`. Without an argument the demo reads
//! `hair_settings.ron` from the working directory, falling back to the
//! built-in defaults when that file does not exist.
//!
//! Set `RUST_LOG=info` (or `debug`, `trace`) to see scene and frame logs.

fn main() {
    hair_sim::app::run();
}
