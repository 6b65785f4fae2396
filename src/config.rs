use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::worker::Role;

pub const DEFAULT_TURNS: usize = 10;
pub const DEFAULT_INITIATOR_MESSAGE: &str = "main";
pub const DEFAULT_RESPONDER_MESSAGE: &str = "routine";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{role} message must be a single line")]
    MultiLineMessage { role: &'static str },
}

/// What each side prints and how many turns it takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub turns: usize,
    pub initiator_message: String,
    pub responder_message: String,
    /// Upper bound of a random pause before each emission.
    pub jitter: Duration,
    pub numbered: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            turns: DEFAULT_TURNS,
            initiator_message: DEFAULT_INITIATOR_MESSAGE.to_string(),
            responder_message: DEFAULT_RESPONDER_MESSAGE.to_string(),
            jitter: Duration::ZERO,
            numbered: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for role in [Role::Initiator, Role::Responder] {
            if self.message(role).contains(&['\n', '\r'][..]) {
                return Err(ConfigError::MultiLineMessage { role: role.name() });
            }
        }
        Ok(())
    }

    pub fn message(&self, role: Role) -> &str {
        match role {
            Role::Initiator => &self.initiator_message,
            Role::Responder => &self.responder_message,
        }
    }

    /// Output line for `role`'s turn, without the newline.
    pub fn line(&self, role: Role, turn: usize) -> String {
        if self.numbered {
            format!("{turn} {}", self.message(role))
        } else {
            self.message(role).to_string()
        }
    }

    /// Random pause in `0..=jitter`.
    pub fn pause(&self) -> Duration {
        if self.jitter.is_zero() {
            return Duration::ZERO;
        }
        let max = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}
