use rand::prelude::*;
use rand::seq::index;
use serde_json::Value;

use crate::consts::{
    PALETTE, PATTERN_SPEEDUP, PATTERN_STARTING_EGGS, PATTERN_STARTING_LIVES, PATTERN_STEP,
    RESULT_CLEAR_DELAY, emoji,
};
use crate::variant::Strategy;
use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LevelUp {
    MoreEggs,
    Faster,
    /// Grows both sides by one and waits a step before the pattern.
    Bigger,
}

const LEVEL_UPS: [(u32, u32, LevelUp); 10] = [
    (1, 12, LevelUp::MoreEggs),
    (15, 20, LevelUp::Faster),
    (21, 22, LevelUp::MoreEggs),
    (25, 25, LevelUp::Bigger),
    (26, 31, LevelUp::MoreEggs),
    (35, 40, LevelUp::Faster),
    (50, 50, LevelUp::Bigger),
    (51, 60, LevelUp::MoreEggs),
    (65, 69, LevelUp::Faster),
    (100, 110, LevelUp::Faster),
];

/// What reaching `level` changes, if anything.
pub fn level_up(level: u32) -> Option<LevelUp> {
    LEVEL_UPS
        .iter()
        .find(|(first, last, _)| (*first..=*last).contains(&level))
        .map(|&(_, _, change)| change)
}

/// Remember where the eggs were shown, three mistakes end the run.
#[derive(Clone, Debug)]
pub struct Pattern {
    stats: RoundStats,
    level: u32,
    lives: u32,
    eggs: usize,
    hide_delay: Millis,
}

impl Pattern {
    pub(crate) fn new(core: &mut GameCore) -> Result<Self> {
        let mut pattern = Self {
            stats: RoundStats::default(),
            level: 0,
            lives: PATTERN_STARTING_LIVES,
            eggs: PATTERN_STARTING_EGGS - 1,
            hide_delay: PATTERN_STEP,
        };
        pattern.reset(core)?;
        Ok(pattern)
    }

    pub fn round_stats(&self) -> &RoundStats {
        &self.stats
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn eggs(&self) -> usize {
        self.eggs
    }

    /// How long the pattern stays on screen, one step is added on top.
    pub fn hide_delay(&self) -> Millis {
        self.hide_delay
    }

    fn reset(&mut self, core: &mut GameCore) -> Result<()> {
        core.phase = Phase::NotStarted;
        core.clicks = 0;
        self.level = 0;
        self.hide_delay = PATTERN_STEP;
        self.lives = PATTERN_STARTING_LIVES;
        self.eggs = PATTERN_STARTING_EGGS - 1;

        core.field
            .set_size(GameConfig::DEFAULT_FIELD_SIZE, &mut core.rng)?
            .disable_cells();
        Ok(())
    }

    fn start_level(&mut self, core: &mut GameCore, is_level_up: bool, now: Millis) -> Outcome {
        core.phase = Phase::Running;
        core.clicks = 0;

        if is_level_up {
            self.level += 1;
            log::debug!("pattern: level {}", self.level);
            match level_up(self.level) {
                Some(LevelUp::MoreEggs) => self.eggs += 1,
                Some(LevelUp::Faster) => {
                    self.hide_delay = self.hide_delay.saturating_sub(PATTERN_SPEEDUP);
                }
                Some(LevelUp::Bigger) => {
                    self.hide_delay = PATTERN_STEP;
                    let (width, height) = core.field.dims();
                    match core.field.set_size((width + 1, height + 1), &mut core.rng) {
                        Ok(field) => {
                            field.disable_cells();
                        }
                        Err(err) => log::error!("pattern: could not grow the field: {}", err),
                    }
                    core.scheduler.schedule(now, PATTERN_STEP, TimerEvent::BuildPattern);
                    return Outcome::Changed;
                }
                None => {}
            }
        }

        self.build_pattern(core, now)
    }

    fn build_pattern(&mut self, core: &mut GameCore, now: Millis) -> Outcome {
        core.field.reset(&mut core.rng).disable_cells();

        let color = *PALETTE.choose(&mut core.rng).unwrap_or(&PALETTE[0]);
        let eggs = self.eggs.min(core.field.size());
        for egg in index::sample(&mut core.rng, core.field.size(), eggs) {
            let cell = &mut core.field[egg];
            cell.content = emoji::GOOD.to_owned();
            cell.bgcolor = Some(color);
            cell.winner = true;
            cell.visible = true;
        }

        core.scheduler.schedule(
            now,
            self.hide_delay + PATTERN_STEP,
            TimerEvent::HideCells { enable: true },
        );
        Outcome::Changed
    }

    fn end_run(&mut self, core: &mut GameCore, now: Millis) -> Outcome {
        core.end_game(GameResult::Win, now);
        self.stats.record(self.level);
        core.scheduler.schedule(now, RESULT_CLEAR_DELAY, TimerEvent::ClearResult);
        Outcome::Won
    }
}

impl Strategy for Pattern {
    fn stats(&self) -> StatsRef<'_> {
        StatsRef::Round(&self.stats)
    }

    fn stats_header_mut(&mut self) -> &mut StatsHeader {
        &mut self.stats.header
    }

    fn restore_stats(&mut self, value: Value) -> serde_json::Result<()> {
        self.stats = serde_json::from_value(value)?;
        Ok(())
    }

    fn after_load(&mut self, core: &mut GameCore, _storage: &dyn Storage, _now: Millis) {
        if let Err(err) = self.reset(core) {
            log::warn!("pattern: {}", err);
        }
    }

    fn start_new_run(&mut self, core: &mut GameCore, now: Millis) -> Result<Outcome> {
        self.stats.header.games += 1;
        self.reset(core)?;
        Ok(self.start_level(core, true, now))
    }

    fn on_click(&mut self, core: &mut GameCore, index: CellIndex, now: Millis) -> Outcome {
        if core.field[index].winner {
            core.clicks += 1;
            if core.clicks as usize >= self.eggs {
                core.field.disable_cells();
                core.scheduler.schedule(now, PATTERN_STEP, TimerEvent::HideCells { enable: false });
                core.scheduler.schedule(
                    now,
                    2 * PATTERN_STEP,
                    TimerEvent::StartLevel { level_up: true },
                );
            }
            return Outcome::Changed;
        }

        self.lives = self.lives.saturating_sub(1);
        log::debug!("pattern: missed, {} lives left", self.lives);
        for cell in core.field.iter_mut() {
            cell.enabled = false;
            if cell.winner && !cell.visible {
                cell.bgcolor = None;
                cell.visible = true;
            }
        }

        if self.lives < 1 {
            // keeps the start button blocked until the run is recorded
            core.result = Some(GameResult::Win);
            core.scheduler.schedule(now, PATTERN_STEP, TimerEvent::EndRun);
        } else {
            core.scheduler.schedule(now, PATTERN_STEP, TimerEvent::HideCells { enable: false });
            core.scheduler.schedule(
                now,
                2 * PATTERN_STEP,
                TimerEvent::StartLevel { level_up: false },
            );
        }
        Outcome::Changed
    }

    fn on_timer(&mut self, core: &mut GameCore, event: TimerEvent, now: Millis) -> Outcome {
        if !core.phase.is_running() {
            return Outcome::NoChange;
        }
        match event {
            TimerEvent::HideCells { enable } => {
                core.field.hide_cells();
                if enable {
                    core.field.enable_cells();
                }
                Outcome::Changed
            }
            TimerEvent::StartLevel { level_up } => self.start_level(core, level_up, now),
            TimerEvent::BuildPattern => self.build_pattern(core, now),
            TimerEvent::EndRun => self.end_run(core, now),
            _ => Outcome::NoChange,
        }
    }

    fn share_text(&self, core: &GameCore, url: &str) -> String {
        let stats = &self.stats;
        let mut text = format!("{} {}", emoji::GOOD, core.kind.name());

        if stats.runs > 0 {
            let runs = if stats.runs % 10 == 1 && stats.runs % 100 != 11 {
                "run"
            } else {
                "runs"
            };
            text += &format!("\n🪦 Last run: lvl {}", stats.last_round);
            if stats.last_round == stats.best_round {
                text += " 🥇";
            }
            text += &format!(
                "\n💾 In {} {} - best: {} avg: {:.2}",
                stats.runs, runs, stats.best_round, stats.avg_round
            );
        }

        text.push('\n');
        text.push_str(url);
        text
    }
}
