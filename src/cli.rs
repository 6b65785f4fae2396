//! Command line arguments.

use std::time::Duration;

use clap::{ArgAction, Parser};

use baton::config::{Config, DEFAULT_INITIATOR_MESSAGE, DEFAULT_RESPONDER_MESSAGE, DEFAULT_TURNS};

/// Two threads take turns printing, ordered by nothing but three mutexes.
#[derive(Parser, Debug)]
#[command(name = "baton")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Turns each thread takes.
    #[arg(short = 'n', long, default_value_t = DEFAULT_TURNS)]
    pub turns: usize,

    /// Line printed by the main thread on each of its turns.
    #[arg(long, default_value = DEFAULT_INITIATOR_MESSAGE)]
    pub initiator_message: String,

    /// Line printed by the spawned thread on each of its turns.
    #[arg(long, default_value = DEFAULT_RESPONDER_MESSAGE)]
    pub responder_message: String,

    /// Sleep a random 0..=MS milliseconds before each line.
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub jitter_ms: u64,

    /// Prefix each line with its turn number.
    #[arg(long)]
    pub numbered: bool,

    /// Log more (repeat for debug and trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            turns: self.turns,
            initiator_message: self.initiator_message.clone(),
            responder_message: self.responder_message.clone(),
            jitter: Duration::from_millis(self.jitter_ms),
            numbered: self.numbered,
        }
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
