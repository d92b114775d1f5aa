//! Emoji, palettes and timings shared by the variants.

use crate::{CellColor, Millis};

pub mod emoji {
    pub const FOOD: [&str; 13] = [
        "🍒", "🍓", "🌶️", "🍄", "🍉", "🍅", "🥩", "🍟", "🍏", "🧁", "🌹", "🦀", "🦐",
    ];
    pub const DEATH: &str = "🍳";
    pub const GOOD: &str = "🥚";
    pub const HARD_MODE: &str = "♨️";
    pub const EASY_MODE: &str = "⭐";
    /// Gem faces, indexed like [`super::JEWEL_COLORS`].
    pub const JEWELS: [&str; 6] = ["🪨", "🍒", "🍋", "🍏", "🫐", "🌸"];
}

/// Delay between a cell hiding and accepting clicks again.
pub const CELL_ACTIVATION_DELAY: Millis = 300;

pub const CLASSIC_HIDE_DELAY: Millis = 1500;
pub const MATCHER_HIDE_DELAY: Millis = 1000;
pub const MATCHER_CONFETTI_DELAY: Millis = 1500;
/// Matcher nags once the player reaches this many clicks.
pub const MATCHER_ADVICE_CLICKS: u32 = 100;
pub const MATCHER_ADVICE: &str = "U nab? 💢";

pub const BINARY_VERIFY_DELAY: Millis = 1000;

pub const SWAP_SETTLE_DELAY: Millis = 300;
pub const REFILL_FIRST_DELAY: Millis = 400;
pub const REFILL_STEP_DELAY: Millis = 300;
pub const COUNTDOWN_STEP: Millis = 1000;
/// Seconds on the jewels clock, also the cap for combo bonuses.
pub const JEWELS_MAX_TIME: i32 = 20;
pub const JEWELS_RESULT_DELAY: Millis = 500;

pub const PATTERN_STEP: Millis = 1300;
pub const PATTERN_SPEEDUP: Millis = 69;
pub const PATTERN_STARTING_EGGS: usize = 4;
pub const PATTERN_STARTING_LIVES: u32 = 3;

pub const RESULT_CLEAR_DELAY: Millis = 800;
pub const AIMLAB_CONFETTI_DELAY: Millis = 1200;

pub const PUZZLE_MAX_SHUFFLES: u32 = 10_000;

pub const MATCHER_COLORS: [CellColor; 6] = [
    CellColor::Red,
    CellColor::Yellow,
    CellColor::Green,
    CellColor::Cyan,
    CellColor::Blue,
    CellColor::Gray,
];

pub const FILLER_COLORS: [CellColor; 6] = [
    CellColor::Red,
    CellColor::Yellow,
    CellColor::Green,
    CellColor::Cyan,
    CellColor::Purple,
    CellColor::Gray,
];

/// The first entry is the helper color used to break up initial runs.
pub const JEWEL_COLORS: [CellColor; 6] = [
    CellColor::Gray,
    CellColor::Red,
    CellColor::Yellow,
    CellColor::Green,
    CellColor::Blue,
    CellColor::Pink,
];

/// Every named cell color, sampled by the pattern and reflex games.
pub const PALETTE: [CellColor; 8] = [
    CellColor::Red,
    CellColor::Yellow,
    CellColor::Purple,
    CellColor::Green,
    CellColor::Blue,
    CellColor::Gray,
    CellColor::Cyan,
    CellColor::Brown,
];

/// Sliding puzzle sizes offered in the settings, indexed by the `gridSizes` option.
pub const PUZZLE_GRID_SIZES: [&str; 5] = ["3x3", "4x4", "5x5", "6x6", "7x7"];
pub const PUZZLE_DEFAULT_GRID: usize = 3;
