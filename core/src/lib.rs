use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

pub use cell::*;
pub use error::*;
pub use field::*;
pub use game::*;
pub use kind::*;
pub use migrate::*;
pub use profile::*;
pub use rng::*;
pub use scheduler::*;
pub use session::*;
pub use settings::*;
pub use stats::*;
pub use storage::*;
pub use timer::*;
pub use types::*;
pub use variant::*;
pub use view::*;

pub mod consts;

mod cell;
mod error;
mod field;
mod game;
mod kind;
mod migrate;
mod profile;
mod rng;
mod scheduler;
mod session;
mod settings;
mod stats;
mod storage;
mod timer;
mod types;
mod variant;
mod view;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub kind: GameKind,
    /// Calendar day the game is played on, in the player's local time.
    pub today: NaiveDate,
    /// Seed for everything that is not part of the daily puzzle.
    pub seed: u64,
    pub field_size: Coord2,
}

impl GameConfig {
    pub const DEFAULT_FIELD_SIZE: Coord2 = (6, 6);

    pub const fn daily(kind: GameKind, today: NaiveDate, seed: u64) -> Self {
        Self {
            kind,
            today,
            seed,
            field_size: Self::DEFAULT_FIELD_SIZE,
        }
    }

    pub const fn with_field_size(self, field_size: Coord2) -> Self {
        Self { field_size, ..self }
    }

    /// Days since the kind's first issue.
    pub fn issue(&self) -> i64 {
        (self.today - self.kind.first_issue_date()).num_days()
    }
}

/// Outcome of any input or timer event
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Outcome {
    NoChange,
    Changed,
    Won,
    Lost,
}

impl Outcome {
    /// Whether the UI should redraw
    pub const fn has_update(self) -> bool {
        use Outcome::*;
        match self {
            NoChange => false,
            Changed => true,
            Won => true,
            Lost => true,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Used to merge outcomes of cascaded events
impl BitOr for Outcome {
    type Output = Outcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use Outcome::*;
        match (self, rhs) {
            (Lost, _) => Lost,
            (_, Lost) => Lost,
            (Won, _) => Won,
            (_, Won) => Won,
            (Changed, _) => Changed,
            (_, Changed) => Changed,
            (NoChange, NoChange) => NoChange,
        }
    }
}

impl From<GameResult> for Outcome {
    fn from(result: GameResult) -> Self {
        match result {
            GameResult::Win => Self::Won,
            GameResult::Loss => Self::Lost,
        }
    }
}

impl From<bool> for Outcome {
    fn from(changed: bool) -> Self {
        if changed { Self::Changed } else { Self::NoChange }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_counts_days_since_kind_epoch() {
        let today = NaiveDate::from_ymd_opt(2023, 5, 28).unwrap();

        assert_eq!(GameConfig::daily(GameKind::Classic, today, 0).issue(), 422);
        assert_eq!(GameConfig::daily(GameKind::Binary, today, 0).issue(), 1);
        assert_eq!(GameConfig::daily(GameKind::Matcher, today, 0).issue(), 62);
    }

    #[test]
    fn outcomes_merge_by_priority() {
        use Outcome::*;

        assert_eq!(NoChange | NoChange, NoChange);
        assert_eq!(NoChange | Changed, Changed);
        assert_eq!(Won | Changed, Won);
        assert_eq!(Won | Lost, Lost);
        assert!(!NoChange.has_update());
        assert!(Won.has_update());
    }
}
