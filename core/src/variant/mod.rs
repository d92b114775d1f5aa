use serde_json::Value;

use crate::*;

pub use aimlab::*;
pub use binary::*;
pub use classic::*;
pub use filler::*;
pub use jewels::*;
pub use matcher::*;
pub use pattern::*;
pub use puzzle::*;

mod aimlab;
mod binary;
mod classic;
mod filler;
mod jewels;
mod matcher;
mod pattern;
mod puzzle;

/// Rules of one kind of game, driven by [`Game`].
pub(crate) trait Strategy {
    fn stats(&self) -> StatsRef<'_>;

    fn stats_header_mut(&mut self) -> &mut StatsHeader;

    fn restore_stats(&mut self, value: Value) -> serde_json::Result<()>;

    fn stats_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.stats())
    }

    /// Called when the player skipped at least one day.
    fn reset_streak(&mut self) {}

    fn before_load(&mut self, _core: &mut GameCore) {}

    fn after_load(&mut self, _core: &mut GameCore, _storage: &dyn Storage, _now: Millis) {}

    fn start_new_run(&mut self, core: &mut GameCore, _now: Millis) -> Result<Outcome> {
        Err(GameError::Unsupported {
            kind: core.kind,
            operation: "start_new_run",
        })
    }

    /// Handles a click on a cell that accepted it.
    fn on_click(&mut self, core: &mut GameCore, index: CellIndex, now: Millis) -> Outcome;

    fn on_timer(&mut self, core: &mut GameCore, event: TimerEvent, now: Millis) -> Outcome {
        match event {
            TimerEvent::Timeout if core.phase.is_running() => {
                core.end_game(GameResult::Loss, now);
                Outcome::Lost
            }
            _ => Outcome::NoChange,
        }
    }

    fn accepts_option(&self, _key: SettingKey, _value: &SettingValue) -> bool {
        true
    }

    fn on_option_changed(&mut self, _core: &mut GameCore, _key: SettingKey, _now: Millis) -> Outcome {
        Outcome::NoChange
    }

    fn select_color(&mut self, core: &mut GameCore, _color: CellColor, _now: Millis) -> Outcome {
        log::warn!("{}: color selection is not supported", core.kind.id());
        Outcome::NoChange
    }

    fn share_text(&self, core: &GameCore, url: &str) -> String;
}

/// Per-kind state and rules.
#[derive(Clone, Debug)]
pub enum Variant {
    Classic(Classic),
    Binary(Binary),
    Matcher(Matcher),
    Filler(Filler),
    Jewels(Jewels),
    Puzzle(Puzzle),
    Pattern(Pattern),
    Aimlab(Aimlab),
}

impl Variant {
    pub(crate) fn new(core: &mut GameCore) -> Result<Self> {
        Ok(match core.kind {
            GameKind::Classic => Self::Classic(Classic::new(core)),
            GameKind::Binary => Self::Binary(Binary::new(core)),
            GameKind::Matcher => Self::Matcher(Matcher::new(core)),
            GameKind::Filler => Self::Filler(Filler::new(core)),
            GameKind::Jewels => Self::Jewels(Jewels::new(core)),
            GameKind::Puzzle => Self::Puzzle(Puzzle::new(core)?),
            GameKind::Pattern => Self::Pattern(Pattern::new(core)?),
            GameKind::Aimlab => Self::Aimlab(Aimlab::new(core)),
        })
    }

    pub(crate) fn strategy(&self) -> &dyn Strategy {
        match self {
            Self::Classic(rules) => rules,
            Self::Binary(rules) => rules,
            Self::Matcher(rules) => rules,
            Self::Filler(rules) => rules,
            Self::Jewels(rules) => rules,
            Self::Puzzle(rules) => rules,
            Self::Pattern(rules) => rules,
            Self::Aimlab(rules) => rules,
        }
    }

    pub(crate) fn strategy_mut(&mut self) -> &mut dyn Strategy {
        match self {
            Self::Classic(rules) => rules,
            Self::Binary(rules) => rules,
            Self::Matcher(rules) => rules,
            Self::Filler(rules) => rules,
            Self::Jewels(rules) => rules,
            Self::Puzzle(rules) => rules,
            Self::Pattern(rules) => rules,
            Self::Aimlab(rules) => rules,
        }
    }

    pub fn stats(&self) -> StatsRef<'_> {
        self.strategy().stats()
    }
}

/// Formats like `Number.prototype.toPrecision`, for share texts.
pub(crate) fn to_precision(value: f64, digits: i32) -> String {
    let magnitude = if value == 0.0 {
        1
    } else {
        value.abs().log10().floor() as i32 + 1
    };
    let decimals = (digits - magnitude).max(0) as usize;
    format!("{:.*}", decimals, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_counts_significant_digits() {
        assert_eq!(to_precision(0.0, 4), "0.000");
        assert_eq!(to_precision(50.0, 4), "50.00");
        assert_eq!(to_precision(200.0 / 3.0, 4), "66.67");
        assert_eq!(to_precision(100.0, 4), "100.0");
        assert_eq!(to_precision(0.25, 4), "0.2500");
    }
}
