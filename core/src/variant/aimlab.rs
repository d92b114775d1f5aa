use rand::prelude::*;
use serde_json::Value;

use crate::consts::{AIMLAB_CONFETTI_DELAY, PALETTE, emoji};
use crate::variant::Strategy;
use crate::*;

/// Click every cell as it lights up, in a shuffled order.
#[derive(Clone, Debug, Default)]
pub struct Aimlab {
    stats: ReflexStats,
    order: Vec<CellIndex>,
    reaction_times: Vec<Millis>,
    activated_at: Millis,
}

impl Aimlab {
    pub(crate) fn new(core: &mut GameCore) -> Self {
        let mut aimlab = Self::default();
        aimlab.reset(core);
        aimlab
    }

    pub fn reflex_stats(&self) -> &ReflexStats {
        &self.stats
    }

    /// Time from lighting up to click, for every cell of the run so far.
    pub fn reaction_times(&self) -> &[Millis] {
        &self.reaction_times
    }

    /// Cells still waiting to light up.
    pub fn remaining(&self) -> usize {
        self.order.len()
    }

    fn reset(&mut self, core: &mut GameCore) {
        core.phase = Phase::NotStarted;
        core.clicks = 0;
        core.active_cell = None;
        core.reset_timer();
        core.field.clear("", true).disable_cells();
        self.order.clear();
        self.reaction_times.clear();
    }

    fn activate_next(&mut self, core: &mut GameCore, now: Millis) -> Outcome {
        if let Some(index) = self.order.pop() {
            let color = *PALETTE.choose(&mut core.rng).unwrap_or(&PALETTE[0]);
            let cell = &mut core.field[index];
            cell.visible = true;
            cell.enabled = true;
            cell.content = emoji::GOOD.to_owned();
            cell.bgcolor = Some(color);
            core.active_cell = Some(index);
            self.activated_at = now;
            return Outcome::Changed;
        }

        if let Some(last) = core.active_cell.take() {
            core.field[last].finisher = true;
            core.scheduler
                .schedule(now, AIMLAB_CONFETTI_DELAY, TimerEvent::ClearFinisher(last));
        }
        let time = core.end_game(GameResult::Win, now);
        self.stats.record(time, core.clicks);
        core.scheduler.schedule(now, AIMLAB_CONFETTI_DELAY, TimerEvent::ClearResult);
        Outcome::Won
    }
}

impl Strategy for Aimlab {
    fn stats(&self) -> StatsRef<'_> {
        StatsRef::Reflex(&self.stats)
    }

    fn stats_header_mut(&mut self) -> &mut StatsHeader {
        &mut self.stats.header
    }

    fn restore_stats(&mut self, value: Value) -> serde_json::Result<()> {
        self.stats = serde_json::from_value(value)?;
        Ok(())
    }

    fn after_load(&mut self, core: &mut GameCore, _storage: &dyn Storage, _now: Millis) {
        self.reset(core);
    }

    fn start_new_run(&mut self, core: &mut GameCore, now: Millis) -> Result<Outcome> {
        self.stats.header.games += 1;
        self.reset(core);

        self.order = (0..core.field.size()).collect();
        self.order.shuffle(&mut core.rng);

        core.phase = Phase::Running;
        core.start_timer(now);
        Ok(self.activate_next(core, now))
    }

    fn on_click(&mut self, core: &mut GameCore, index: CellIndex, now: Millis) -> Outcome {
        self.reaction_times.push(now.saturating_sub(self.activated_at));
        core.field[index].clear("", false);
        core.clicks += 1;
        self.activate_next(core, now)
    }

    fn share_text(&self, core: &GameCore, url: &str) -> String {
        let stats = &self.stats;
        let mut text = format!("{} {}", emoji::GOOD, core.kind.name());

        if stats.runs > 0 {
            text += &format!(
                "\n🏁 Last run: {} (~{} ms)",
                format_timer(stats.last_time, true),
                stats.last_click_time.round() as i64
            );
            if stats.last_click_time.round() == stats.best_click_time.round() {
                text += "🎖️";
            }
            text += &format!("\nAverage in {} runs:", stats.runs);
            text += &format!("\n⏱️ {}", format_timer(stats.avg_time as Millis, true));
            text += &format!("\n👆 {}ms per click", stats.avg_click_time.round() as i64);
            text += &format!("\nPersonal best: ⏱️ {}", format_timer(stats.best_time, true));
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
    use std::collections::BTreeSet;

    fn aimlab() -> Game {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        Game::new(GameConfig::daily(GameKind::Aimlab, today, 8).with_field_size((3, 3))).unwrap()
    }

    fn rules(game: &Game) -> &Aimlab {
        match game.variant() {
            Variant::Aimlab(rules) => rules,
            _ => unreachable!(),
        }
    }

    #[test]
    fn waits_for_a_run() {
        let game = aimlab();

        assert_eq!(game.phase(), Phase::NotStarted);
        assert!(game.field().all(|cell| !cell.enabled && !cell.visible));
        assert_eq!(game.active_cell(), None);
    }

    #[test]
    fn only_the_lit_cell_takes_clicks() {
        let mut game = aimlab();
        game.start_new_run(1_000).unwrap();

        let active = game.active_cell().unwrap();
        assert_eq!(game.field().iter().filter(|cell| cell.enabled).count(), 1);
        assert!(game.field()[active].visible);
        assert_eq!(game.field()[active].content, emoji::GOOD);

        let other = (active + 1) % 9;
        assert_eq!(game.click(other, 1_100), Ok(Outcome::NoChange));
        assert_eq!(game.clicks(), 0);
    }

    #[test]
    fn clicking_every_cell_finishes_the_run() {
        let mut game = aimlab();
        game.start_new_run(1_000).unwrap();

        let mut seen = BTreeSet::new();
        let mut now = 1_000;
        let mut outcome = Outcome::NoChange;
        while let Some(active) = game.active_cell() {
            assert!(seen.insert(active));
            now += 250;
            outcome = game.click(active, now).unwrap();
            assert!(!game.field()[active].visible || game.is_game_over());
        }

        assert_eq!(outcome, Outcome::Won);
        assert_eq!(seen.len(), 9);
        assert_eq!(game.clicks(), 9);
        assert_eq!(rules(&game).reaction_times(), &[250; 9]);
        assert_eq!(rules(&game).remaining(), 0);
        assert_eq!(game.field().iter().filter(|cell| cell.finisher).count(), 1);

        let stats = rules(&game).reflex_stats();
        assert_eq!((stats.runs, stats.last_time), (1, 2_250));
        assert_eq!(stats.last_click_time, 250.0);

        game.advance(now + 1_200);
        assert!(game.field().all(|cell| !cell.finisher));
        assert_eq!(game.result(), None);
    }

    #[test]
    fn share_text_rounds_click_times() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut core = GameCore::new(&GameConfig::daily(GameKind::Aimlab, today, 8)).unwrap();
        let mut aimlab = Aimlab::new(&mut core);
        assert_eq!(aimlab.share_text(&core, "u"), "🥚 Egdle Reflex\nu");

        aimlab.stats.record(36_000, 36);
        aimlab.stats.record(20_000, 36);
        assert_eq!(
            aimlab.share_text(&core, "u"),
            "🥚 Egdle Reflex\n🏁 Last run: 00:20.00 (~556 ms)🎖️\nAverage in 2 runs:\n⏱️ 00:28.00\n👆 778ms per click\nPersonal best: ⏱️ 00:20.00\nu"
        );
    }
}
