use serde::Serialize;

use crate::consts::FILLER_COLORS;
use crate::*;

/// What a UI draws for one cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView<'a> {
    pub content: &'a str,
    pub visible: bool,
    pub enabled: bool,
    pub locked: bool,
    pub winner: bool,
    pub loser: bool,
    pub finisher: bool,
    pub traveling: bool,
    /// CSS background, transparent without a color.
    pub background: &'static str,
    pub color: Option<CellColor>,
}

impl<'a> From<&'a Cell> for CellView<'a> {
    fn from(cell: &'a Cell) -> Self {
        Self {
            content: &cell.content,
            visible: cell.visible,
            enabled: cell.enabled,
            locked: cell.locked,
            winner: cell.winner,
            loser: cell.loser,
            finisher: cell.finisher,
            traveling: cell.traveling,
            background: cell.bgcolor.map_or(CellColor::EMPTY_RGBA, CellColor::rgba),
            color: cell.color,
        }
    }
}

/// State only some kinds of game have.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VariantDetails<'a> {
    Classic,
    Binary {
        field_error: Option<&'a str>,
    },
    Matcher,
    Filler {
        active_color: Option<CellColor>,
        palette: &'static [CellColor],
    },
    Jewels {
        score: u32,
        time_left: i32,
    },
    Puzzle {
        grid_size: &'static str,
    },
    Pattern {
        level: u32,
        lives: u32,
        eggs: usize,
    },
    Aimlab {
        remaining: usize,
    },
}

impl<'a> VariantDetails<'a> {
    fn of(game: &'a Game) -> Self {
        match game.variant() {
            Variant::Classic(_) => Self::Classic,
            Variant::Binary(rules) => Self::Binary {
                field_error: rules.field_error(),
            },
            Variant::Matcher(_) => Self::Matcher,
            Variant::Filler(rules) => Self::Filler {
                active_color: rules.active_color(),
                palette: &FILLER_COLORS,
            },
            Variant::Jewels(rules) => Self::Jewels {
                score: rules.score(),
                time_left: rules.time_left(),
            },
            Variant::Puzzle(_) => Self::Puzzle {
                grid_size: Puzzle::grid_label(game.settings()),
            },
            Variant::Pattern(rules) => Self::Pattern {
                level: rules.level(),
                lives: rules.lives(),
                eggs: rules.eggs(),
            },
            Variant::Aimlab(rules) => Self::Aimlab {
                remaining: rules.remaining(),
            },
        }
    }
}

/// Read-only projection of a game for rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView<'a> {
    pub id: &'static str,
    pub name: &'static str,
    pub issue: i64,
    pub width: Coord,
    pub height: Coord,
    pub cells: Vec<CellView<'a>>,
    pub phase: Phase,
    pub game_over: bool,
    pub result: Option<GameResult>,
    pub clicks: u32,
    pub elapsed: Millis,
    pub timer: String,
    pub active_cell: Option<CellIndex>,
    pub settings: &'a Settings,
    pub locked_settings: Vec<SettingKey>,
    pub stats: StatsRef<'a>,
    pub details: VariantDetails<'a>,
}

impl<'a> GameView<'a> {
    pub fn new(game: &'a Game, now: Millis) -> Self {
        let elapsed = game.elapsed(now);
        let (width, height) = game.field().dims();

        Self {
            id: game.kind().id(),
            name: game.kind().name(),
            issue: game.issue(),
            width,
            height,
            cells: game.field().iter().map(CellView::from).collect(),
            phase: game.phase(),
            game_over: game.is_game_over(),
            result: game.result(),
            clicks: game.clicks(),
            elapsed,
            timer: format_timer(elapsed, game.is_game_over()),
            active_cell: game.active_cell(),
            settings: game.settings(),
            locked_settings: game.locked_settings().collect(),
            stats: game.stats(),
            details: VariantDetails::of(game),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn game(kind: GameKind) -> Game {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        Game::new(GameConfig::daily(kind, today, 4)).unwrap()
    }

    #[test]
    fn view_serializes_camel_case() {
        let mut game = game(GameKind::Classic);
        game.click(0, 1_000).unwrap();

        let value = serde_json::to_value(GameView::new(&game, 2_000)).unwrap();
        assert_eq!(value["id"], "egdle");
        assert_eq!(value["name"], "Egdle Classic");
        assert_eq!(value["cells"].as_array().unwrap().len(), 36);
        assert_eq!(value["gameOver"], game.is_game_over());
        assert_eq!(value["activeCell"], serde_json::Value::Null);
        assert_eq!(value["settings"]["hardMode"], false);
        assert_eq!(value["lockedSettings"][0], "hardMode");
        assert_eq!(value["details"]["kind"], "classic");
        assert!(value["cells"][0]["visible"].as_bool().unwrap());
    }

    #[test]
    fn cells_carry_css_backgrounds() {
        let mut cell = Cell::new("🍒");
        assert_eq!(CellView::from(&cell).background, CellColor::EMPTY_RGBA);

        cell.paint(CellColor::Red);
        assert_eq!(CellView::from(&cell).background, "rgba(192, 96, 96, 0.2)");
    }

    #[test]
    fn details_follow_the_variant() {
        let filler = game(GameKind::Filler);
        let value = serde_json::to_value(GameView::new(&filler, 0)).unwrap();
        assert_eq!(value["details"]["kind"], "filler");
        assert_eq!(value["details"]["palette"].as_array().unwrap().len(), 6);
        assert_eq!(value["details"]["activeColor"], serde_json::Value::Null);

        let puzzle = game(GameKind::Puzzle);
        let view = GameView::new(&puzzle, 0);
        assert_eq!(view.details, VariantDetails::Puzzle { grid_size: "6x6" });
        assert_eq!(view.timer, "00:00.00");

        let pattern = game(GameKind::Pattern);
        let value = serde_json::to_value(GameView::new(&pattern, 0)).unwrap();
        assert_eq!(value["details"]["kind"], "pattern");
        assert_eq!(value["details"]["lives"], 3);
    }
}
