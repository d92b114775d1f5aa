use serde_json::Value;

use crate::consts::{CLASSIC_HIDE_DELAY, emoji};
use crate::field::sample_food;
use crate::variant::{Strategy, to_precision};
use crate::*;

/// Find the egg among the food, in hard mode avoid the broken one.
#[derive(Clone, Debug)]
pub struct Classic {
    stats: DailyStats,
    winner: CellIndex,
    loser: CellIndex,
}

impl Classic {
    pub(crate) fn new(core: &mut GameCore) -> Self {
        let size = core.field.size() as u64;
        let winner = core.daily.random_int(size) as CellIndex;
        let loser = loop {
            let loser = core.daily.random_int(size) as CellIndex;
            if loser != winner {
                break loser;
            }
        };

        let cell = &mut core.field[winner];
        cell.content = emoji::GOOD.to_owned();
        cell.winner = true;

        Self {
            stats: DailyStats::default(),
            winner,
            loser,
        }
    }

    pub fn winner(&self) -> CellIndex {
        self.winner
    }

    pub fn loser(&self) -> CellIndex {
        self.loser
    }

    pub fn daily_stats(&self) -> &DailyStats {
        &self.stats
    }

    fn is_hard(core: &GameCore) -> bool {
        core.settings.flag(SettingKey::HardMode)
    }

    /// Turns the loser cell into the broken egg, or back into food.
    fn apply_hard_mode(&self, core: &mut GameCore) {
        let hard = Self::is_hard(core);
        let food = sample_food(&mut core.rng);
        let cell = &mut core.field[self.loser];
        if hard {
            cell.content = emoji::DEATH.to_owned();
            cell.loser = true;
        } else {
            cell.content = food.to_owned();
            cell.loser = false;
        }
    }

    fn finish(&mut self, core: &mut GameCore, result: GameResult, now: Millis, record: bool) -> Outcome {
        core.end_game(result, now);
        if record {
            core.clicks = core.field.total_clicks();
            self.stats.record(result, core.clicks, core.issue);
        }

        if Self::is_hard(core) {
            for index in 0..core.field.size() {
                if core.field[index].clicks > 0 {
                    core.scheduler.cancel_cell(index);
                    core.field[index].visible = true;
                }
            }
        }
        result.into()
    }

    fn migrate_v1(&mut self, core: &mut GameCore, storage: &dyn Storage, now: Millis) {
        if let Some(hard) = v1_classic_hard_mode(storage) {
            core.settings.insert(SettingKey::HardMode, SettingValue::Flag(hard));
            core.mark_dirty();
        }
        let Some(stats) = v1_classic_stats(storage) else {
            return;
        };
        log::info!("{}: imported stats of {} games", core.kind.id(), stats.header.games);
        self.stats = stats;
        core.mark_dirty();

        if self.stats.header.last_issue != core.issue {
            return;
        }
        let Some(cells) = v1_classic_field(storage) else {
            return;
        };
        for (cell, old) in core.field.iter_mut().zip(&cells) {
            old.apply_to(cell);
        }

        core.clicks = core.field.total_clicks();
        if self.stats.last_clicks > core.clicks {
            let missing = self.stats.last_clicks - core.clicks;
            if let Some(index) = core.field.position(|cell| cell.clicks > 0) {
                core.field[index].clicks += missing;
            }
        }

        let hard = Self::is_hard(core);
        core.field[self.winner].winner = true;
        if hard {
            core.field[self.loser].loser = true;
        }

        let lost = hard && core.field[self.loser].visible;
        let won = core.field[self.winner].visible;
        if lost || won {
            self.finish(core, GameResult::from_win(won), now, false);
        }
    }
}

impl Strategy for Classic {
    fn stats(&self) -> StatsRef<'_> {
        StatsRef::Daily(&self.stats)
    }

    fn stats_header_mut(&mut self) -> &mut StatsHeader {
        &mut self.stats.header
    }

    fn restore_stats(&mut self, value: Value) -> serde_json::Result<()> {
        self.stats = serde_json::from_value(value)?;
        Ok(())
    }

    fn reset_streak(&mut self) {
        self.stats.streak = 0;
    }

    fn after_load(&mut self, core: &mut GameCore, storage: &dyn Storage, now: Millis) {
        if self.stats.header.is_unvisited() {
            self.migrate_v1(core, storage, now);
        }

        if Self::is_hard(core) {
            self.apply_hard_mode(core);
        }
        if core.field.iter().any(|cell| cell.clicks > 0) {
            core.lock_setting(SettingKey::HardMode);
        }
        if core.phase.is_running() && Self::is_hard(core) {
            for cell in core.field.iter_mut() {
                cell.visible = false;
                cell.enabled = true;
            }
        }
    }

    fn on_click(&mut self, core: &mut GameCore, index: CellIndex, now: Millis) -> Outcome {
        core.lock_setting(SettingKey::HardMode);
        core.clicks += 1;
        core.mark_dirty();

        let cell = &mut core.field[index];
        cell.bgcolor = Some(CellColor::Red);
        if cell.winner {
            cell.bgcolor = Some(CellColor::Yellow);
            self.finish(core, GameResult::Win, now, true)
        } else if cell.loser {
            cell.bgcolor = Some(CellColor::Purple);
            self.finish(core, GameResult::Loss, now, true)
        } else {
            if Self::is_hard(core) {
                core.hide_after(index, now, CLASSIC_HIDE_DELAY);
            }
            Outcome::Changed
        }
    }

    fn on_option_changed(&mut self, core: &mut GameCore, key: SettingKey, _now: Millis) -> Outcome {
        if key == SettingKey::HardMode {
            self.apply_hard_mode(core);
        }
        Outcome::Changed
    }

    fn share_text(&self, core: &GameCore, url: &str) -> String {
        let mut text = String::from(if Self::is_hard(core) {
            emoji::HARD_MODE
        } else {
            emoji::EASY_MODE
        });
        text.push(' ');
        text.push_str(core.kind.name());

        if core.phase.game_over() {
            let egg = match core.result {
                Some(GameResult::Win) => emoji::GOOD,
                _ => emoji::DEATH,
            };
            text += &format!(" #{} - {} in {}", core.issue, egg, self.stats.last_clicks);
        }

        let stats = &self.stats;
        if stats.header.games > 0 {
            text += &format!(
                "\n🥚 Eggs: {} ({}%) / Streak: {}",
                stats.wins,
                to_precision(stats.win_rate(), 4),
                stats.streak
            );
            text += &format!(
                "\n🧮 Avg: {:.2} Min: {} Max: {} ",
                stats.avg_clicks, stats.min_clicks, stats.max_clicks
            );
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

    fn classic(y: i32, m: u32, d: u32) -> Game {
        let today = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Game::new(GameConfig::daily(GameKind::Classic, today, 1)).unwrap()
    }

    fn rules(game: &Game) -> &Classic {
        match game.variant() {
            Variant::Classic(rules) => rules,
            _ => unreachable!(),
        }
    }

    fn decoy(game: &Game) -> CellIndex {
        let rules = rules(game);
        (0..36).find(|&i| i != rules.winner() && i != rules.loser()).unwrap()
    }

    #[test]
    fn daily_layout_is_reproducible() {
        let game = classic(2022, 4, 1);
        assert_eq!((rules(&game).winner(), rules(&game).loser()), (1, 26));
        assert_eq!(game.field()[1].content, emoji::GOOD);
        assert!(game.field()[1].winner);

        let game = classic(2026, 10, 19);
        assert_eq!((rules(&game).winner(), rules(&game).loser()), (15, 24));
    }

    #[test]
    fn finding_the_egg_wins() {
        let mut game = classic(2026, 10, 19);
        let decoy = decoy(&game);

        assert_eq!(game.click(decoy, 100), Ok(Outcome::Changed));
        assert_eq!(game.field()[decoy].bgcolor, Some(CellColor::Red));
        assert!(game.is_setting_locked(SettingKey::HardMode));

        assert_eq!(game.click(15, 200), Ok(Outcome::Won));
        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.field()[15].bgcolor, Some(CellColor::Yellow));

        let stats = rules(&game).daily_stats();
        assert_eq!((stats.header.games, stats.wins, stats.streak), (1, 1, 1));
        assert_eq!(stats.last_clicks, 2);
        assert_eq!(game.click(decoy, 300), Ok(Outcome::NoChange));
    }

    #[test]
    fn loser_only_matters_in_hard_mode() {
        let mut easy = classic(2026, 10, 19);
        assert_eq!(easy.click(24, 0), Ok(Outcome::Changed));

        let mut hard = classic(2026, 10, 19);
        hard.set_option(SettingKey::HardMode, SettingValue::Flag(true), 0).unwrap();
        assert_eq!(hard.field()[24].content, emoji::DEATH);

        assert_eq!(hard.click(24, 0), Ok(Outcome::Lost));
        assert_eq!(hard.field()[24].bgcolor, Some(CellColor::Purple));
        assert_eq!(rules(&hard).daily_stats().streak, -1);
    }

    #[test]
    fn hard_mode_hides_decoys_and_locks() {
        let mut game = classic(2026, 10, 19);
        game.set_option(SettingKey::HardMode, SettingValue::Flag(true), 0).unwrap();
        let decoy = decoy(&game);

        game.click(decoy, 1000).unwrap();
        assert!(game.field()[decoy].visible);
        assert!(!game.field()[decoy].enabled);

        game.advance(2500);
        assert!(!game.field()[decoy].visible);
        assert!(!game.field()[decoy].enabled);
        game.advance(2800);
        assert!(game.field()[decoy].enabled);

        assert_eq!(
            game.set_option(SettingKey::HardMode, SettingValue::Flag(false), 3000),
            Err(GameError::SettingLocked(SettingKey::HardMode))
        );
    }

    #[test]
    fn ending_in_hard_mode_reveals_clicked_cells() {
        let mut game = classic(2026, 10, 19);
        game.set_option(SettingKey::HardMode, SettingValue::Flag(true), 0).unwrap();
        let decoy = decoy(&game);

        game.click(decoy, 1000).unwrap();
        game.click(15, 1100).unwrap();
        game.advance(5000);

        assert!(game.field()[decoy].visible);
        assert_eq!(game.pending_events(), 0);
    }

    #[test]
    fn share_text_reports_the_result() {
        let mut game = classic(2026, 10, 19);
        game.click(15, 0).unwrap();

        let text = game.share_text("https://egdle.example/");
        assert_eq!(
            text,
            format!(
                "⭐ Egdle Classic #{} - 🥚 in 1\n🥚 Eggs: 1 (100.0%) / Streak: 1\n🧮 Avg: 1.00 Min: 1 Max: 1 \nhttps://egdle.example/",
                game.issue()
            )
        );
    }
}
