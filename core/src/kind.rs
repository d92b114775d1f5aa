use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The mini-games of the collection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Classic,
    Binary,
    Matcher,
    Filler,
    Jewels,
    Puzzle,
    Pattern,
    Aimlab,
}

/// Keys of the persisted snapshot of a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StoredProperty {
    Field,
    Settings,
    Stats,
    GameOver,
    Result,
    Clicks,
    StartTime,
    ActiveCell,
}

impl StoredProperty {
    pub const fn key(self) -> &'static str {
        use StoredProperty::*;
        match self {
            Field => "field",
            Settings => "settings",
            Stats => "stats",
            GameOver => "gameOver",
            Result => "result",
            Clicks => "clicks",
            StartTime => "startTime",
            ActiveCell => "activeCell",
        }
    }
}

impl GameKind {
    pub const ALL: [GameKind; 8] = [
        Self::Classic,
        Self::Binary,
        Self::Matcher,
        Self::Filler,
        Self::Jewels,
        Self::Puzzle,
        Self::Pattern,
        Self::Aimlab,
    ];

    /// Identifier used for storage keys and seeds.
    pub const fn id(self) -> &'static str {
        use GameKind::*;
        match self {
            Classic => "egdle",
            Binary => "binary",
            Matcher => "matcher",
            Filler => "filler",
            Jewels => "jewels",
            Puzzle => "puzzle",
            Pattern => "pattern",
            Aimlab => "aimlab",
        }
    }

    pub const fn name(self) -> &'static str {
        use GameKind::*;
        match self {
            Classic => "Egdle Classic",
            Binary => "Egdle Binary",
            Matcher => "Egdle Pairs",
            Filler => "Egdle Filler",
            Jewels => "Egdle Crush",
            Puzzle => "Egdle Puzzle",
            Pattern => "Egdle Pattern",
            Aimlab => "Egdle Reflex",
        }
    }

    /// Daily kinds deal the same puzzle to everyone on a given day.
    pub const fn is_daily(self) -> bool {
        matches!(self, Self::Classic | Self::Binary | Self::Matcher)
    }

    pub fn first_issue_date(self) -> NaiveDate {
        let (year, month, day) = match self {
            Self::Binary => (2023, 5, 27),
            Self::Matcher => (2023, 3, 27),
            _ => (2022, 4, 1),
        };
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    /// Extra seed component, none of the shipped games uses one.
    pub const fn seed_offset(self) -> u32 {
        0
    }

    pub fn storage_key(self) -> String {
        format!("egdle2-{}", self.id())
    }

    pub const fn stored_properties(self) -> &'static [StoredProperty] {
        use StoredProperty::*;
        match self {
            Self::Classic => &[Field, Settings, Stats, GameOver, Result],
            Self::Binary => &[Field, Settings, Stats, GameOver, Result, Clicks, StartTime],
            Self::Matcher => &[Field, Settings, Stats, GameOver, Result, ActiveCell],
            _ => &[Settings, Stats],
        }
    }

    pub fn stores(self, property: StoredProperty) -> bool {
        self.stored_properties().contains(&property)
    }

    /// Classic and Pairs are playable right away, the rest wait for a start.
    pub const fn fresh_phase(self) -> Phase {
        match self {
            Self::Classic | Self::Matcher => Phase::Running,
            _ => Phase::NotStarted,
        }
    }

    /// Whether runs are started explicitly by the player.
    pub const fn has_runs(self) -> bool {
        !matches!(self, Self::Classic | Self::Matcher)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown game {0:?}")]
pub struct UnknownGame(pub String);

impl FromStr for GameKind {
    type Err = UnknownGame;

    /// Accepts the identifier, `classic` is an alias of `egdle`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "classic" {
            return Ok(Self::Classic);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| UnknownGame(s.to_owned()))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    NotStarted,
    Running,
    Ended,
}

impl Phase {
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Stored form of the phase.
    pub const fn game_over(self) -> bool {
        !self.is_running()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameResult {
    Win,
    Loss,
}

impl GameResult {
    pub const fn is_win(self) -> bool {
        matches!(self, Self::Win)
    }

    pub const fn from_win(win: bool) -> Self {
        if win { Self::Win } else { Self::Loss }
    }
}
