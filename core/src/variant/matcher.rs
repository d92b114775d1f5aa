use serde_json::Value;

use crate::consts::{
    MATCHER_ADVICE, MATCHER_ADVICE_CLICKS, MATCHER_COLORS, MATCHER_CONFETTI_DELAY,
    MATCHER_HIDE_DELAY, emoji,
};
use crate::variant::Strategy;
use crate::*;

/// Memory game: turn over two cells at a time and find the pairs.
#[derive(Clone, Debug)]
pub struct Matcher {
    stats: DailyStats,
}

impl Matcher {
    pub(crate) fn new(core: &mut GameCore) -> Self {
        let size = core.field.size();
        let mut free: Vec<CellIndex> = (0..size).collect();

        for pair in 0..size / 2 {
            let color = MATCHER_COLORS[pair % MATCHER_COLORS.len()];
            for _ in 0..2 {
                let index = free.remove(core.daily.random_index(free.len()));
                let cell = &mut core.field[index];
                cell.paint(color);
                cell.content = emoji::GOOD.to_owned();
            }
        }

        // odd fields have nothing to pair the last cell with
        for index in free {
            let cell = &mut core.field[index];
            cell.content = emoji::GOOD.to_owned();
            cell.winner = true;
            cell.visible = true;
            cell.enabled = false;
        }

        Self {
            stats: DailyStats::default(),
        }
    }

    pub fn daily_stats(&self) -> &DailyStats {
        &self.stats
    }

    fn is_pair(core: &GameCore, a: CellIndex, b: CellIndex) -> bool {
        let (a, b) = (&core.field[a], &core.field[b]);
        a.color == b.color && a.content == b.content
    }

    fn finish(&mut self, core: &mut GameCore, now: Millis) -> Outcome {
        core.end_game(GameResult::Win, now);
        core.clicks = core.field.total_clicks();
        self.stats.record(GameResult::Win, core.clicks, core.issue);
        Outcome::Won
    }
}

impl Strategy for Matcher {
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

    fn after_load(&mut self, core: &mut GameCore, _storage: &dyn Storage, _now: Millis) {
        core.clicks = core.field.total_clicks();

        let active = core.active_cell;
        for (index, cell) in core.field.iter_mut().enumerate() {
            if cell.winner || active == Some(index) {
                cell.bgcolor = cell.color;
                cell.visible = true;
                cell.enabled = false;
            } else {
                cell.visible = false;
                cell.enabled = true;
            }
        }
        if core.phase.game_over() {
            core.field.disable_cells();
        }
    }

    fn on_click(&mut self, core: &mut GameCore, index: CellIndex, now: Millis) -> Outcome {
        core.clicks += 1;
        core.mark_dirty();

        let Some(active) = core.active_cell.take() else {
            core.active_cell = Some(index);
            return Outcome::Changed;
        };

        let mut outcome = Outcome::Changed;
        if Self::is_pair(core, active, index) {
            core.field[active].winner = true;
            core.field[index].winner = true;
            if core.field.all(|cell| cell.winner) {
                core.field[index].finisher = true;
                outcome = self.finish(core, now);
                core.scheduler
                    .schedule(now, MATCHER_CONFETTI_DELAY, TimerEvent::ClearFinisher(index));
            }
        } else {
            core.hide_after(active, now, MATCHER_HIDE_DELAY);
            core.hide_after(index, now, MATCHER_HIDE_DELAY);
        }

        if core.phase.is_running() && core.clicks == MATCHER_ADVICE_CLICKS {
            core.advice = Some(MATCHER_ADVICE.to_owned());
        }
        outcome
    }

    fn share_text(&self, core: &GameCore, url: &str) -> String {
        let mut text = format!("{} {}", emoji::EASY_MODE, core.kind.name());

        if core.phase.game_over() {
            text += &format!(" #{}\n{} {} clicks", core.issue, emoji::GOOD, self.stats.last_clicks);
        }
        if self.stats.header.games > 0 {
            text += &format!(
                "\n🧮 Avg: {:.2} Min: {} Max: {} ",
                self.stats.avg_clicks, self.stats.min_clicks, self.stats.max_clicks
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
    use std::collections::BTreeMap;

    fn matcher(dims: Coord2) -> Game {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        Game::new(GameConfig::daily(GameKind::Matcher, today, 5).with_field_size(dims)).unwrap()
    }

    fn pairs(game: &Game) -> Vec<(CellIndex, CellIndex)> {
        let mut seen: BTreeMap<(Option<CellColor>, &str), Vec<CellIndex>> = BTreeMap::new();
        for (index, cell) in game.field().iter().enumerate() {
            if !cell.winner {
                seen.entry((cell.color, cell.content.as_str())).or_default().push(index);
            }
        }
        seen.values()
            .flat_map(|indices| indices.chunks(2).map(|pair| (pair[0], pair[1])))
            .collect()
    }

    /// First cells of two pairs with different colors.
    fn mismatch(game: &Game) -> (CellIndex, CellIndex) {
        let pairs = pairs(game);
        let a = pairs[0].0;
        let color = game.field()[a].color;
        let b = pairs.iter().map(|pair| pair.0).find(|&b| game.field()[b].color != color).unwrap();
        (a, b)
    }

    #[test]
    fn every_color_is_dealt_in_pairs() {
        let game = matcher((6, 6));
        let pairs = pairs(&game);

        assert_eq!(pairs.len(), 18);
        assert!(game.field().iter().all(|cell| cell.bgcolor.is_some() && !cell.visible));
        assert_eq!(game.phase(), Phase::Running);
    }

    #[test]
    fn layout_is_the_same_all_day() {
        let first = matcher((6, 6));
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let second = Game::new(GameConfig::daily(GameKind::Matcher, today, 99)).unwrap();

        let colors = |game: &Game| game.field().iter().map(|cell| cell.color).collect::<Vec<_>>();
        assert_eq!(colors(&first), colors(&second));
    }

    #[test]
    fn odd_fields_leave_one_cell_matched() {
        let game = matcher((3, 3));
        let leftovers: Vec<_> = game.field().iter().filter(|cell| cell.winner).collect();

        assert_eq!(leftovers.len(), 1);
        assert!(leftovers[0].visible && !leftovers[0].enabled);
        assert_eq!(pairs(&game).len(), 4);
    }

    #[test]
    fn mismatch_hides_both_cells() {
        let mut game = matcher((6, 6));
        let (a, b) = mismatch(&game);

        game.click(a, 0).unwrap();
        assert_eq!(game.active_cell(), Some(a));
        game.click(b, 100).unwrap();
        assert_eq!(game.active_cell(), None);
        assert!(game.field()[a].visible && game.field()[b].visible);

        game.advance(1_100);
        assert!(!game.field()[a].visible && !game.field()[b].visible);
        game.advance(1_400);
        assert!(game.field()[a].enabled && game.field()[b].enabled);
    }

    #[test]
    fn matching_everything_wins() {
        let mut game = matcher((6, 6));
        let pairs = pairs(&game);
        let (last_a, last_b) = *pairs.last().unwrap();

        for &(a, b) in &pairs {
            game.click(a, 0).unwrap();
            let outcome = game.click(b, 0).unwrap();
            assert!(game.field()[a].winner && game.field()[b].winner);
            if b != last_b {
                assert_eq!(outcome, Outcome::Changed);
            }
        }

        assert_eq!(game.result(), Some(GameResult::Win));
        assert!(game.field()[last_b].finisher);
        assert!(game.field()[last_a].winner);
        game.advance(1_500);
        assert!(!game.field()[last_b].finisher);

        let stats = rules(&game).daily_stats();
        assert_eq!((stats.header.games, stats.wins, stats.last_clicks), (1, 1, 36));
        assert_eq!(
            game.share_text("u"),
            format!(
                "⭐ Egdle Pairs #{}\n🥚 36 clicks\n🧮 Avg: 36.00 Min: 36 Max: 36 \nu",
                game.issue()
            )
        );
    }

    fn rules(game: &Game) -> &Matcher {
        match game.variant() {
            Variant::Matcher(rules) => rules,
            _ => unreachable!(),
        }
    }

    #[test]
    fn hundredth_click_nags() {
        let mut game = matcher((6, 6));
        let (a, b) = mismatch(&game);

        for round in 0..50 {
            let now = round * 2_000;
            game.click(a, now).unwrap();
            game.click(b, now).unwrap();
            if round < 49 {
                assert_eq!(game.take_advice(), None);
            }
        }

        assert_eq!(game.clicks(), 100);
        assert_eq!(game.take_advice().as_deref(), Some(MATCHER_ADVICE));
    }

    #[test]
    fn restore_shows_matched_and_active_cells() {
        let mut storage = MemoryStorage::new();
        let mut game = matcher((6, 6));
        let pairs = pairs(&game);
        game.click(pairs[0].0, 0).unwrap();
        game.click(pairs[0].1, 0).unwrap();
        game.click(pairs[1].0, 0).unwrap();
        game.save(&mut storage, 10).unwrap();

        let mut restored = matcher((6, 6));
        restored.restore(&storage, 20);

        assert_eq!(restored.clicks(), 3);
        assert_eq!(restored.active_cell(), Some(pairs[1].0));
        for (index, cell) in restored.field().iter().enumerate() {
            let shown = index == pairs[0].0 || index == pairs[0].1 || index == pairs[1].0;
            assert_eq!(cell.visible, shown);
            assert_eq!(cell.enabled, !shown);
        }
    }
}
