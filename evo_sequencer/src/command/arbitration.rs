//! Command arbitration.
//!
//! Only the highest-priority asserted command is considered in a cycle.
//! Everything else asserted alongside it is dropped, never queued, and does
//! not fall through when the selected command turns out to be inapplicable.

use evo_common::sequencer::command::{Command, CommandSet};

/// Result of arbitrating one cycle's command lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Arbitration {
    /// Winning command.
    pub selected: Option<Command>,
    /// Asserted lines that lost.
    pub dropped: CommandSet,
}

impl Arbitration {
    pub fn resolve(requested: CommandSet) -> Self {
        match select(requested) {
            Some(command) => Self {
                selected: Some(command),
                dropped: requested.difference(command.flag()),
            },
            None => Self::default(),
        }
    }

    #[inline]
    pub fn is(&self, command: Command) -> bool {
        self.selected == Some(command)
    }
}

/// Highest-priority command in `requested`.
pub fn select(requested: CommandSet) -> Option<Command> {
    Command::PRIORITY
        .into_iter()
        .find(|command| requested.contains(command.flag()))
}
