use serde_json::Value;

use crate::consts::{
    PUZZLE_DEFAULT_GRID, PUZZLE_GRID_SIZES, PUZZLE_MAX_SHUFFLES, RESULT_CLEAR_DELAY,
    SWAP_SETTLE_DELAY,
};
use crate::variant::Strategy;
use crate::*;

/// Whether tiles `ids` laid out row by row on a `width` wide board can be
/// slid back into order, `0` is the blank.
pub fn is_solvable(ids: &[u32], width: Coord) -> bool {
    let mut inversions = 0;
    for (i, &id) in ids.iter().enumerate() {
        if id == 0 {
            continue;
        }
        inversions += ids[i + 1..].iter().filter(|&&other| other != 0 && other < id).count();
    }

    if width % 2 == 0 {
        let blank_row = ids.iter().position(|&id| id == 0).unwrap_or(0) / width;
        (blank_row + inversions) % 2 == 1
    } else {
        inversions % 2 == 0
    }
}

/// Label and dimensions of the grid picked in the settings.
fn grid_size(settings: &Settings) -> (&'static str, Coord2) {
    let index = settings
        .index(SettingKey::GridSizes)
        .filter(|&index| index < PUZZLE_GRID_SIZES.len())
        .unwrap_or(PUZZLE_DEFAULT_GRID);
    let label = PUZZLE_GRID_SIZES[index];
    let dims = label
        .split_once('x')
        .and_then(|(width, height)| Some((width.parse().ok()?, height.parse().ok()?)))
        .unwrap_or(GameConfig::DEFAULT_FIELD_SIZE);
    (label, dims)
}

fn tile_ids(field: &Field) -> Vec<u32> {
    field.iter().map(|cell| cell.puzzle_id).collect()
}

fn tile_label(id: u32, numeric: bool) -> String {
    if numeric && id != 0 {
        id.to_string()
    } else {
        String::new()
    }
}

/// Sliding tiles, the board is solved when every tile is back in order.
#[derive(Clone, Debug)]
pub struct Puzzle {
    stats: PuzzleStats,
}

impl Puzzle {
    pub(crate) fn new(core: &mut GameCore) -> Result<Self> {
        let mut puzzle = Self {
            stats: PuzzleStats::default(),
        };
        puzzle.update_grid_size(core)?;
        Ok(puzzle)
    }

    pub fn puzzle_stats(&self) -> &PuzzleStats {
        &self.stats
    }

    /// Label of the grid size picked in `settings`, like `6x6`.
    pub fn grid_label(settings: &Settings) -> &'static str {
        grid_size(settings).0
    }

    fn update_grid_size(&mut self, core: &mut GameCore) -> Result<()> {
        let (label, dims) = grid_size(&core.settings);
        if core.field.dims() != dims {
            core.field.set_size(dims, &mut core.rng)?;
            log::debug!("puzzle: switched to {}", label);
        }
        self.reset(core);
        Ok(())
    }

    /// Lays the tiles out in order, the blank last.
    fn reset(&mut self, core: &mut GameCore) {
        core.phase = Phase::NotStarted;
        core.disabled_settings.clear();
        core.clicks = 0;
        core.reset_timer();

        let numeric = core.settings.flag(SettingKey::NumericMode);
        let size = core.field.size();
        for (index, cell) in core.field.iter_mut().enumerate() {
            cell.clear("", true);
            cell.paint(CellColor::Gray);
            cell.traveling = false;
            cell.puzzle_id = if index + 1 == size { 0 } else { index as u32 + 1 };
            cell.content = tile_label(cell.puzzle_id, numeric);
            cell.visible = cell.puzzle_id > 0;
            cell.enabled = false;
        }
    }

    fn deal(&mut self, core: &mut GameCore) {
        let width = core.field.width();
        for attempt in 1..=PUZZLE_MAX_SHUFFLES {
            core.field.shuffle(&mut core.rng);
            if is_solvable(&tile_ids(&core.field), width) {
                log::debug!("puzzle: found a solvable deal after {} tries", attempt);
                return;
            }
        }

        log::warn!("puzzle: no solvable deal in {} tries, flipping parity", PUZZLE_MAX_SHUFFLES);
        let tiles: Vec<CellIndex> = (0..core.field.size())
            .filter(|&index| core.field[index].puzzle_id != 0)
            .take(2)
            .collect();
        if let [first, second] = tiles[..] {
            core.field.swap(first, second);
        }
    }

    fn is_solved(field: &Field) -> bool {
        let size = field.size();
        field.iter().enumerate().all(|(index, cell)| {
            let home = if cell.puzzle_id == 0 {
                size
            } else {
                cell.puzzle_id as usize
            };
            index + 1 == home
        })
    }

    fn settle(&mut self, core: &mut GameCore, first: CellIndex, second: CellIndex, now: Millis) -> Outcome {
        for index in [first, second] {
            if let Some(cell) = core.field.get_mut(index) {
                cell.traveling = false;
            }
        }
        if !core.phase.is_running() {
            return Outcome::Changed;
        }

        core.field[first].enabled = true;
        core.field[second].enabled = true;
        if Self::is_solved(&core.field) {
            return self.finish(core, now);
        }
        Outcome::Changed
    }

    fn finish(&mut self, core: &mut GameCore, now: Millis) -> Outcome {
        let time = core.end_game(GameResult::Win, now);
        core.field.show_cells();

        let (label, _) = grid_size(&core.settings);
        self.stats.size_mut(label).record.record(time, core.clicks);
        core.unlock_setting(SettingKey::GridSizes);
        core.scheduler.schedule(now, RESULT_CLEAR_DELAY, TimerEvent::ClearResult);
        log::debug!("puzzle: solved {} in {} swaps", label, core.clicks);
        Outcome::Won
    }
}

impl Strategy for Puzzle {
    fn stats(&self) -> StatsRef<'_> {
        StatsRef::Puzzle(&self.stats)
    }

    fn stats_header_mut(&mut self) -> &mut StatsHeader {
        &mut self.stats.header
    }

    fn restore_stats(&mut self, value: Value) -> serde_json::Result<()> {
        self.stats = serde_json::from_value(value)?;
        Ok(())
    }

    fn after_load(&mut self, core: &mut GameCore, _storage: &dyn Storage, _now: Millis) {
        if let Err(err) = self.update_grid_size(core) {
            log::warn!("puzzle: could not apply the stored grid size: {}", err);
        }
    }

    fn start_new_run(&mut self, core: &mut GameCore, now: Millis) -> Result<Outcome> {
        let (label, _) = grid_size(&core.settings);
        self.stats.size_mut(label).games += 1;

        self.reset(core);
        core.lock_setting(SettingKey::GridSizes);
        core.phase = Phase::Running;
        core.start_timer(now);

        self.deal(core);
        core.field.enable_cells();
        Ok(Outcome::Changed)
    }

    fn on_click(&mut self, core: &mut GameCore, index: CellIndex, now: Millis) -> Outcome {
        let cell = &mut core.field[index];
        cell.enabled = true;
        cell.visible = cell.puzzle_id != 0;
        if cell.traveling || cell.finisher {
            return Outcome::NoChange;
        }

        let Some(blank) = core.field.position(|cell| cell.puzzle_id == 0) else {
            return Outcome::NoChange;
        };
        let valid = core.field[index].visible != core.field[blank].visible
            && core.field.is_orthogonal_neighbor(index, blank)
            && !core.field[blank].traveling;
        if !valid {
            return Outcome::NoChange;
        }

        for slot in [index, blank] {
            let cell = &mut core.field[slot];
            cell.traveling = true;
            cell.enabled = false;
        }
        core.field.swap(index, blank);
        core.clicks += 1;
        core.scheduler.schedule(
            now,
            SWAP_SETTLE_DELAY,
            TimerEvent::SettleSwap {
                first: index,
                second: blank,
                swap_back: false,
            },
        );
        Outcome::Changed
    }

    fn on_timer(&mut self, core: &mut GameCore, event: TimerEvent, now: Millis) -> Outcome {
        match event {
            TimerEvent::SettleSwap { first, second, .. } => self.settle(core, first, second, now),
            _ => Outcome::NoChange,
        }
    }

    fn accepts_option(&self, key: SettingKey, value: &SettingValue) -> bool {
        match key {
            SettingKey::GridSizes => value.as_index().is_some_and(|index| index < PUZZLE_GRID_SIZES.len()),
            _ => true,
        }
    }

    fn on_option_changed(&mut self, core: &mut GameCore, key: SettingKey, _now: Millis) -> Outcome {
        match key {
            SettingKey::NumericMode => {
                let numeric = core.settings.flag(SettingKey::NumericMode);
                for cell in core.field.iter_mut() {
                    cell.content = tile_label(cell.puzzle_id, numeric);
                }
            }
            SettingKey::GridSizes => {
                if let Err(err) = self.update_grid_size(core) {
                    log::warn!("puzzle: {}", err);
                }
            }
            _ => return Outcome::NoChange,
        }
        Outcome::Changed
    }

    fn share_text(&self, core: &GameCore, url: &str) -> String {
        let (label, _) = grid_size(&core.settings);
        let mut text = format!("🧩 {} ({})", core.kind.name(), label);

        if let Some(stats) = self.stats.size(label).filter(|stats| stats.record.runs > 0) {
            let record = &stats.record;
            text += &format!(
                "\n🏁 Last run: {} ({})",
                format_timer(record.last_time, true),
                record.last_clicks
            );
            text += &format!("\nAverage in {} runs:", record.runs);
            text += &format!("\n⏱️ ~{}", format_timer(record.avg_time as Millis, true));
            text += &format!("\n👆 ~{:.2} swaps", record.avg_clicks);
            text += "\nPersonal best:";
            text += &format!("\n⏱️🎖️ {}", format_timer(record.best_time, true));
            text += &format!("\n👆🎖️ {} swaps", record.best_clicks);
        }

        text.push('\n');
        text.push_str(url);
        text
    }
}
