use rand::prelude::*;
use serde_json::Value;
use std::collections::{BTreeSet, VecDeque};

use crate::consts::{FILLER_COLORS, RESULT_CLEAR_DELAY, emoji};
use crate::variant::Strategy;
use crate::*;

/// Paints every owned cell `color` and takes over the same colored area
/// touching them. Returns how many cells are owned afterwards.
pub fn flood_fill(field: &mut Field, color: CellColor) -> usize {
    let mut queue = VecDeque::new();
    for index in 0..field.size() {
        let cell = &mut field[index];
        if cell.winner {
            cell.paint(color);
            queue.push_back(index);
        }
    }

    let mut visited = BTreeSet::new();
    while let Some(index) = queue.pop_front() {
        if !visited.insert(index) || field[index].bgcolor != Some(color) {
            continue;
        }

        for neighbor in field.neighbors(index) {
            if field[neighbor].bgcolor == Some(color) && !visited.contains(&neighbor) {
                queue.push_back(neighbor);
            }
        }

        let cell = &mut field[index];
        if !cell.winner {
            log::trace!("filler: took cell {}", index);
        }
        cell.winner = true;
        cell.content = emoji::GOOD.to_owned();
    }

    field.iter().filter(|cell| cell.winner).count()
}

/// Flood the board from the top left corner, one color at a time.
#[derive(Clone, Debug)]
pub struct Filler {
    stats: FillerStats,
    active_color: Option<CellColor>,
}

impl Filler {
    pub(crate) fn new(core: &mut GameCore) -> Self {
        let mut filler = Self {
            stats: FillerStats::default(),
            active_color: None,
        };
        filler.reset(core, true);
        filler
    }

    pub fn filler_stats(&self) -> &FillerStats {
        &self.stats
    }

    /// Color of the owned area.
    pub fn active_color(&self) -> Option<CellColor> {
        self.active_color
    }

    fn reset(&mut self, core: &mut GameCore, first_time: bool) {
        core.phase = Phase::NotStarted;
        core.clicks = 0;
        core.reset_timer();

        for index in 0..core.field.size() {
            let color = *FILLER_COLORS.choose(&mut core.rng).unwrap_or(&FILLER_COLORS[0]);
            let cell = &mut core.field[index];
            cell.clear("", true);
            if !first_time {
                cell.paint(color);
            }
            cell.visible = true;
            cell.enabled = false;
        }
    }

    fn fill(&mut self, core: &mut GameCore, color: CellColor, now: Millis) -> Outcome {
        core.active_cell = None;
        self.active_color = Some(color);
        core.clicks += 1;

        let owned = flood_fill(&mut core.field, color);
        if owned < core.field.size() {
            return Outcome::Changed;
        }

        let time = core.end_game(GameResult::Win, now);
        self.stats.record.record(time, core.clicks);
        core.scheduler.schedule(now, RESULT_CLEAR_DELAY, TimerEvent::ClearResult);
        Outcome::Won
    }
}

impl Strategy for Filler {
    fn stats(&self) -> StatsRef<'_> {
        StatsRef::Filler(&self.stats)
    }

    fn stats_header_mut(&mut self) -> &mut StatsHeader {
        &mut self.stats.header
    }

    fn restore_stats(&mut self, value: Value) -> serde_json::Result<()> {
        self.stats = serde_json::from_value(value)?;
        Ok(())
    }

    fn after_load(&mut self, core: &mut GameCore, _storage: &dyn Storage, _now: Millis) {
        self.reset(core, true);
    }

    fn start_new_run(&mut self, core: &mut GameCore, now: Millis) -> Result<Outcome> {
        self.stats.header.games += 1;
        self.reset(core, false);
        core.phase = Phase::Running;
        core.start_timer(now);

        let color = *FILLER_COLORS.choose(&mut core.rng).unwrap_or(&FILLER_COLORS[0]);
        let starter = &mut core.field[0];
        starter.winner = true;
        starter.content = emoji::GOOD.to_owned();
        starter.bgcolor = Some(color);

        let outcome = self.fill(core, color, now);
        // the opening fill is free
        core.clicks -= 1;
        Ok(outcome)
    }

    fn on_click(&mut self, _core: &mut GameCore, _index: CellIndex, _now: Millis) -> Outcome {
        Outcome::NoChange
    }

    fn select_color(&mut self, core: &mut GameCore, color: CellColor, now: Millis) -> Outcome {
        if !FILLER_COLORS.contains(&color) {
            log::warn!("filler: {} is not on the palette", color);
            return Outcome::NoChange;
        }
        self.fill(core, color, now)
    }

    fn share_text(&self, core: &GameCore, url: &str) -> String {
        let record = &self.stats.record;
        let mut text = format!("🥚 {}", core.kind.name());

        if record.runs > 0 {
            text += &format!(
                "\n🏁 Last run: {} ({})",
                format_timer(record.last_time, true),
                record.last_clicks
            );
            text += &format!("\nAverage in {} runs:", record.runs);
            text += &format!("\n⏱️ ~{}", format_timer(record.last_time, true));
            text += &format!("\n👆 ~{:.2} clicks", record.avg_clicks);
            text += "\nPersonal best:";
            text += &format!("\n⏱️🎖️ {}", format_timer(record.best_time, true));
            text += &format!("\n👆🎖️ {} clicks", record.best_clicks);
        }

        text.push('\n');
        text.push_str(url);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn painted(rows: [&str; 3]) -> Field {
        let mut field = Field::new((3, 3)).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for (x, tag) in row.chars().enumerate() {
                let color = match tag {
                    'r' => CellColor::Red,
                    'g' => CellColor::Green,
                    _ => CellColor::Cyan,
                };
                field[y * 3 + x].paint(color);
            }
        }
        field[0].winner = true;
        field
    }

    fn filler() -> Game {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        Game::new(GameConfig::daily(GameKind::Filler, today, 11)).unwrap()
    }

    fn rules(game: &Game) -> &Filler {
        match game.variant() {
            Variant::Filler(rules) => rules,
            _ => unreachable!(),
        }
    }

    #[test]
    fn flood_takes_connected_cells_only() {
        let mut field = painted(["rgg", "ggc", "cgr"]);

        assert_eq!(flood_fill(&mut field, CellColor::Green), 6);
        assert!(field[7].winner);
        assert!(!field[5].winner && !field[6].winner && !field[8].winner);
        assert_eq!(field[0].bgcolor, Some(CellColor::Green));
        assert_eq!(field[3].content, emoji::GOOD);

        assert_eq!(flood_fill(&mut field, CellColor::Cyan), 8);
        assert_eq!(flood_fill(&mut field, CellColor::Red), 9);
    }

    #[test]
    fn owned_color_takes_nothing_new() {
        let mut field = painted(["rgg", "ggc", "cgr"]);
        assert_eq!(flood_fill(&mut field, CellColor::Green), 6);
        let owners: Vec<_> = field.iter().map(|cell| cell.winner).collect();

        assert_eq!(flood_fill(&mut field, CellColor::Green), 6);
        assert_eq!(field.iter().map(|cell| cell.winner).collect::<Vec<_>>(), owners);
    }

    #[test]
    fn diagonals_do_not_connect() {
        let mut field = painted(["rcr", "crc", "rcr"]);
        assert_eq!(flood_fill(&mut field, CellColor::Red), 1);
    }

    #[test]
    fn fresh_board_waits_for_a_run() {
        let game = filler();

        assert_eq!(game.phase(), Phase::NotStarted);
        assert!(game.field().iter().all(|cell| cell.visible && !cell.enabled));
        assert!(game.field().iter().all(|cell| cell.bgcolor.is_none()));
    }

    #[test]
    fn flooding_the_board_wins() {
        let mut game = filler();
        game.start_new_run(1_000).unwrap();
        assert_eq!(game.clicks(), 0);
        assert!(game.field()[0].winner);
        assert_eq!(game.field()[0].bgcolor, rules(&game).active_color());

        let mut now = 1_000;
        while game.phase().is_running() {
            let next = (0..36)
                .find(|&i| {
                    !game.field()[i].winner
                        && game.field().neighbors(i).any(|n| game.field()[n].winner)
                })
                .unwrap();
            let color = game.field()[next].bgcolor.unwrap();
            now += 500;
            let before = game.field().iter().filter(|cell| cell.winner).count();
            game.select_color(color, now).unwrap();
            assert!(game.field().iter().filter(|cell| cell.winner).count() > before);
        }

        assert_eq!(game.result(), Some(GameResult::Win));
        let record = &rules(&game).filler_stats().record;
        assert_eq!(record.runs, 1);
        assert_eq!(record.last_clicks, game.clicks());
        assert_eq!(record.last_time, now - 1_000);

        game.advance(now + 800);
        assert_eq!(game.result(), None);
        assert!(game.share_text("u").contains("\nAverage in 1 runs:\n⏱️ ~"));
    }

    #[test]
    fn repeating_the_color_still_costs_a_click() {
        let mut game = filler();
        game.start_new_run(0).unwrap();
        let color = rules(&game).active_color().unwrap();
        let owners: Vec<_> = game.field().iter().map(|cell| cell.winner).collect();

        assert_eq!(game.select_color(color, 10), Ok(Outcome::Changed));
        assert_eq!(game.clicks(), 1);
        assert_eq!(game.field().iter().map(|cell| cell.winner).collect::<Vec<_>>(), owners);
    }

    #[test]
    fn share_text_reports_the_last_run() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut core = GameCore::new(&GameConfig::daily(GameKind::Filler, today, 11)).unwrap();
        let mut filler = Filler::new(&mut core);
        filler.stats.record.record(20_000, 8);
        filler.stats.record.record(30_000, 10);

        assert_eq!(
            filler.share_text(&core, "u"),
            "🥚 Egdle Filler\n🏁 Last run: 00:30.00 (10)\nAverage in 2 runs:\n⏱️ ~00:30.00\n\
             👆 ~9.00 clicks\nPersonal best:\n⏱️🎖️ 00:20.00\n👆🎖️ 8 clicks\nu"
        );
    }

    #[test]
    fn off_palette_colors_are_ignored() {
        let mut game = filler();
        game.start_new_run(0).unwrap();

        assert_eq!(game.select_color(CellColor::Blue, 10), Ok(Outcome::NoChange));
        assert_eq!(game.clicks(), 0);
    }
}
