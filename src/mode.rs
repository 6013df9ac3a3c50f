//! View mode and the counter type it implies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which items the reader is looking at.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    All,
    Starred,
    #[default]
    Unread,
}

impl Mode {
    /// Cycle All → Unread → Starred → All.
    pub fn next(self) -> Mode {
        match self {
            Mode::All => Mode::Unread,
            Mode::Unread => Mode::Starred,
            Mode::Starred => Mode::All,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mode::All => "All",
            Mode::Starred => "Starred",
            Mode::Unread => "Unread",
        };
        f.write_str(label)
    }
}

/// Which counter the channel should report per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountType {
    Starred,
    Unread,
}

impl CountType {
    /// Starred mode counts starred items; every other mode counts unread.
    pub fn for_mode(mode: Mode) -> CountType {
        match mode {
            Mode::Starred => CountType::Starred,
            Mode::All | Mode::Unread => CountType::Unread,
        }
    }
}
