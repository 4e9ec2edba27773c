//! Scorekeeper - Two-player scoreboard in the terminal
//!
//! Demonstrates:
//! - Six elements on an in-memory page wired into one scoreboard
//! - Game over detaching the player listeners
//! - Reset re-attaching them
//! - The play-to input clamping to 1
//!
//! Run with: cargo run --example scorekeeper
//! Logs go to stderr: RUST_LOG=debug cargo run --example scorekeeper 2> scorekeeper.log

use reactive_element::scoreboard::{page, Scoreboard, ScoreboardConfig};
use reactive_element::terminal::{run, KeyBindings};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = ScoreboardConfig::default();
    let doc = page(&config);

    let board = match Scoreboard::mount(&doc, &config) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("Failed to mount: {}", e);
            return;
        }
    };

    if let Err(e) = run(&board, &doc, &config, &KeyBindings::default()) {
        eprintln!("Terminal error: {}", e);
    }
}
