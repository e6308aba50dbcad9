//! Command request lines.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Command lines asserted by the host during one cycle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandSet: u8 {
        const START   = 0x01;
        const STOP    = 0x02;
        const HOME    = 0x04;
        const ABORT   = 0x08;
        const PAUSE   = 0x10;
        const PROCEED = 0x20;
        const RETRY   = 0x40;
        const RESET   = 0x80;
    }
}

/// A single command after arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Abort,
    Stop,
    Home,
    Start,
    Pause,
    Proceed,
    Retry,
    Reset,
}

impl Command {
    /// Arbitration order, highest priority first (Abort > Stop > rest).
    pub const PRIORITY: [Self; 8] = [
        Self::Abort,
        Self::Stop,
        Self::Home,
        Self::Start,
        Self::Pause,
        Self::Proceed,
        Self::Retry,
        Self::Reset,
    ];

    /// Request line carrying this command.
    pub const fn flag(self) -> CommandSet {
        match self {
            Self::Abort => CommandSet::ABORT,
            Self::Stop => CommandSet::STOP,
            Self::Home => CommandSet::HOME,
            Self::Start => CommandSet::START,
            Self::Pause => CommandSet::PAUSE,
            Self::Proceed => CommandSet::PROCEED,
            Self::Retry => CommandSet::RETRY,
            Self::Reset => CommandSet::RESET,
        }
    }

    /// Position in [`Command::PRIORITY`] (0 = highest).
    pub const fn rank(self) -> usize {
        match self {
            Self::Abort => 0,
            Self::Stop => 1,
            Self::Home => 2,
            Self::Start => 3,
            Self::Pause => 4,
            Self::Proceed => 5,
            Self::Retry => 6,
            Self::Reset => 7,
        }
    }
}

impl From<Command> for CommandSet {
    fn from(command: Command) -> Self {
        command.flag()
    }
}
