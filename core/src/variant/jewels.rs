use rand::prelude::*;
use serde_json::Value;

use crate::consts::{
    COUNTDOWN_STEP, JEWEL_COLORS, JEWELS_MAX_TIME, JEWELS_RESULT_DELAY, REFILL_FIRST_DELAY,
    REFILL_STEP_DELAY, SWAP_SETTLE_DELAY, emoji,
};
use crate::variant::Strategy;
use crate::*;

const COMBO_POINTS: u32 = 10;
const TIME_BONUS_RATE: f64 = 0.18;

fn face(color: CellColor, only_eggs: bool) -> &'static str {
    if only_eggs {
        return emoji::GOOD;
    }
    let index = JEWEL_COLORS.iter().position(|&jewel| jewel == color).unwrap_or(0);
    emoji::JEWELS[index]
}

fn recolor(cell: &mut Cell, color: CellColor, only_eggs: bool) {
    cell.paint(color);
    cell.content = face(color, only_eggs).to_owned();
}

/// Turns the middle of every starting run of three into the helper color.
pub fn break_initial_runs(field: &mut Field, only_eggs: bool) {
    let helper = JEWEL_COLORS[0];
    let width = field.width();

    for y in 0..field.height() {
        for x in 0..width {
            let index = y * width + x;
            let color = field[index].color;
            if x > 1 && field[index - 1].color == color && field[index - 2].color == color {
                recolor(&mut field[index - 1], helper, only_eggs);
            }
            if y > 1 && field[index - width].color == color && field[index - 2 * width].color == color {
                recolor(&mut field[index - width], helper, only_eggs);
            }
        }
    }
}

/// Marks every visible, settled run of three as finished and takes those
/// cells off the board. Returns the combo points.
pub fn mark_combos(field: &mut Field) -> u32 {
    let width = field.width();
    let settled = |field: &Field, line: [CellIndex; 3]| {
        let color = field[line[0]].color;
        color.is_some()
            && line.iter().all(|&index| {
                let cell = &field[index];
                cell.color == color && cell.visible && !cell.traveling
            })
    };

    let mut combo = 0;
    let mut finished = Vec::new();
    for y in 0..field.height() {
        for x in 0..width {
            let index = y * width + x;
            if x > 1 {
                let line = [index, index - 1, index - 2];
                if settled(field, line) {
                    finished.extend(line);
                    combo += COMBO_POINTS;
                }
            }
            if y > 1 {
                let line = [index, index - width, index - 2 * width];
                if settled(field, line) {
                    finished.extend(line);
                    combo += COMBO_POINTS;
                }
            }
        }
    }

    for index in finished {
        field[index].finisher = true;
    }
    for cell in field.iter_mut().filter(|cell| cell.finisher) {
        cell.visible = false;
        cell.enabled = false;
    }
    combo
}

/// Drops every column over its lowest gaps by one cell and fills the top
/// with new jewels. Returns false once there was nothing to fill.
pub fn gravity_pass<R: Rng + ?Sized>(field: &mut Field, rng: &mut R, only_eggs: bool) -> bool {
    let width = field.width();
    let mut filled = false;

    for index in (0..field.size()).rev() {
        if field[index].visible {
            continue;
        }
        filled = true;

        let mut slot = index;
        while slot >= width {
            field.swap(slot, slot - width);
            slot -= width;
        }

        let color = *JEWEL_COLORS.choose(rng).unwrap_or(&JEWEL_COLORS[0]);
        let mut jewel = Cell::default();
        recolor(&mut jewel, color, only_eggs);
        jewel.visible = true;
        jewel.enabled = true;
        field[slot] = jewel;
    }
    filled
}

/// Where each cell lands after the next `gravity_pass`, `None` for cells it
/// replaces.
fn gravity_moves(field: &Field) -> Vec<Option<CellIndex>> {
    let width = field.width();
    let mut visible: Vec<bool> = field.iter().map(|cell| cell.visible).collect();
    let mut origin: Vec<Option<CellIndex>> = (0..visible.len()).map(Some).collect();

    for index in (0..visible.len()).rev() {
        if visible[index] {
            continue;
        }
        let mut slot = index;
        while slot >= width {
            visible.swap(slot, slot - width);
            origin.swap(slot, slot - width);
            slot -= width;
        }
        visible[slot] = true;
        origin[slot] = None;
    }

    let mut moves = vec![None; origin.len()];
    for (slot, from) in origin.into_iter().enumerate() {
        if let Some(from) = from {
            moves[from] = Some(slot);
        }
    }
    moves
}

/// Match three against the clock, every combo buys a little time.
#[derive(Clone, Debug)]
pub struct Jewels {
    stats: ScoreStats,
    score: u32,
    time_left: i32,
    /// Cascades still falling, the run cannot end before they settle.
    unsettled: u32,
}

impl Jewels {
    pub(crate) fn new(core: &mut GameCore) -> Self {
        let mut jewels = Self {
            stats: ScoreStats::default(),
            score: 0,
            time_left: JEWELS_MAX_TIME,
            unsettled: 0,
        };
        jewels.reset(core);
        jewels
    }

    pub fn score_stats(&self) -> &ScoreStats {
        &self.stats
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Seconds on the clock, never negative once the run is over.
    pub fn time_left(&self) -> i32 {
        self.time_left
    }

    pub fn unsettled(&self) -> u32 {
        self.unsettled
    }

    fn only_eggs(core: &GameCore) -> bool {
        core.settings.flag(SettingKey::OnlyEggMode)
    }

    fn reset(&mut self, core: &mut GameCore) {
        self.score = 0;
        self.unsettled = 0;
        self.time_left = JEWELS_MAX_TIME;
        core.active_cell = None;
        core.result = None;

        let only_eggs = Self::only_eggs(core);
        for index in 0..core.field.size() {
            let color = *JEWEL_COLORS[1..].choose(&mut core.rng).unwrap_or(&JEWEL_COLORS[1]);
            let cell = &mut core.field[index];
            cell.clear("", true);
            cell.enabled = false;
            cell.traveling = false;
            recolor(cell, color, only_eggs);
        }
        break_initial_runs(&mut core.field, only_eggs);
    }

    fn add_time(&mut self, bonus: i32) {
        self.time_left = (self.time_left + bonus).min(JEWELS_MAX_TIME);
    }

    fn swap(&mut self, core: &mut GameCore, first: CellIndex, second: CellIndex, swap_back: bool, now: Millis) {
        if !core.field.is_orthogonal_neighbor(first, second) {
            for index in [first, second] {
                let cell = &mut core.field[index];
                cell.enabled = true;
                cell.traveling = false;
            }
            return;
        }

        for index in [first, second] {
            let cell = &mut core.field[index];
            cell.traveling = true;
            cell.enabled = false;
        }
        core.field.swap(first, second);
        core.scheduler.schedule(
            now,
            SWAP_SETTLE_DELAY,
            TimerEvent::SettleSwap {
                first,
                second,
                swap_back,
            },
        );
    }

    fn settle(&mut self, core: &mut GameCore, first: CellIndex, second: CellIndex, swap_back: bool, now: Millis) {
        for index in [first, second] {
            core.field[index].traveling = false;
        }
        if !core.phase.is_running() {
            return;
        }

        let combo = self.resolve_combos(core, 1, now);
        if combo == 0 && swap_back {
            self.swap(core, second, first, false, now);
        }
        for index in [first, second] {
            let cell = &mut core.field[index];
            if !cell.traveling && !cell.finisher {
                cell.enabled = true;
            }
        }
    }

    fn resolve_combos(&mut self, core: &mut GameCore, depth: u32, now: Millis) -> u32 {
        let combo = mark_combos(&mut core.field);
        if combo > 0 {
            self.unsettled += 1;
            core.scheduler
                .schedule(now, REFILL_FIRST_DELAY, TimerEvent::Refill { depth });
            log::debug!("jewels: combo {} at depth {}", combo, depth);
        }

        self.score += combo * depth;
        self.add_time((f64::from(combo) * TIME_BONUS_RATE).round() as i32);
        combo
    }

    fn refill(&mut self, core: &mut GameCore, depth: u32, now: Millis) {
        let only_eggs = Self::only_eggs(core);
        let moves = gravity_moves(&core.field);
        if gravity_pass(&mut core.field, &mut core.rng, only_eggs) {
            // selection and swaps in flight follow their cells down
            core.active_cell = core.active_cell.and_then(|active| moves[active]);
            core.scheduler.update_pending(|event| {
                if let TimerEvent::SettleSwap { first, second, .. } = event {
                    *first = moves[*first].unwrap_or(*first);
                    *second = moves[*second].unwrap_or(*second);
                }
            });
            core.scheduler
                .schedule(now, REFILL_STEP_DELAY, TimerEvent::Refill { depth });
        } else {
            self.unsettled = self.unsettled.saturating_sub(1);
            self.resolve_combos(core, depth + 1, now);
        }
    }

    fn tick(&mut self, core: &mut GameCore, now: Millis) -> Outcome {
        self.time_left -= 1;
        if self.time_left >= 0 || self.unsettled > 0 {
            core.scheduler.schedule(now, COUNTDOWN_STEP, TimerEvent::Countdown);
            return Outcome::Changed;
        }

        self.time_left = 0;
        core.active_cell = None;
        core.end_game(GameResult::Win, now);
        self.stats.record(self.score);
        core.scheduler
            .schedule(now, JEWELS_RESULT_DELAY, TimerEvent::ClearResult);
        Outcome::Won
    }
}

impl Strategy for Jewels {
    fn stats(&self) -> StatsRef<'_> {
        StatsRef::Score(&self.stats)
    }

    fn stats_header_mut(&mut self) -> &mut StatsHeader {
        &mut self.stats.header
    }

    fn restore_stats(&mut self, value: Value) -> serde_json::Result<()> {
        self.stats = serde_json::from_value(value)?;
        Ok(())
    }

    fn start_new_run(&mut self, core: &mut GameCore, now: Millis) -> Result<Outcome> {
        self.stats.header.games += 1;
        self.reset(core);

        core.field.show_cells().enable_cells();
        core.phase = Phase::Running;
        Ok(self.tick(core, now))
    }

    fn on_click(&mut self, core: &mut GameCore, index: CellIndex, now: Millis) -> Outcome {
        let cell = &mut core.field[index];
        cell.enabled = true;
        if cell.traveling || cell.finisher {
            return Outcome::NoChange;
        }

        match core.active_cell.take() {
            None => core.active_cell = Some(index),
            Some(active) if active != index => self.swap(core, active, index, true, now),
            Some(_) => {}
        }
        Outcome::Changed
    }

    fn on_timer(&mut self, core: &mut GameCore, event: TimerEvent, now: Millis) -> Outcome {
        match event {
            TimerEvent::Countdown if core.phase.is_running() => self.tick(core, now),
            TimerEvent::SettleSwap {
                first,
                second,
                swap_back,
            } => {
                self.settle(core, first, second, swap_back, now);
                Outcome::Changed
            }
            TimerEvent::Refill { depth } => {
                self.refill(core, depth, now);
                Outcome::Changed
            }
            _ => Outcome::NoChange,
        }
    }

    fn on_option_changed(&mut self, core: &mut GameCore, key: SettingKey, _now: Millis) -> Outcome {
        if key == SettingKey::OnlyEggMode {
            let only_eggs = Self::only_eggs(core);
            for cell in core.field.iter_mut() {
                if let Some(color) = cell.color {
                    cell.content = face(color, only_eggs).to_owned();
                }
            }
        }
        Outcome::Changed
    }

    fn share_text(&self, core: &GameCore, url: &str) -> String {
        let mut text = format!("🥚 {}", core.kind.name());
        if self.stats.runs > 0 {
            text += &format!("\n💎 Last score: {}", self.stats.last_score);
            text += &format!(
                "\n🎖️ Best of {} games: {}",
                self.stats.runs, self.stats.best_score
            );
        }
        text.push('\n');
        text.push_str(url);
        text
    }
}
