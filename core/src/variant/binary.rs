use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::consts::{BINARY_VERIFY_DELAY, emoji};
use crate::variant::Strategy;
use crate::*;

/// Solved 6x6 grids, cell `i` holds bit `35 - i`.
pub const BINARY_SEEDS: [u64; 40] = [
    27207046566, 45526717845, 45456190038, 12521388852, 56264055435, 28800497061, 40438676250,
    27289625958, 24333671565, 12504902004, 48089053593, 24246175401, 12694432149, 41165734617,
    27718997418, 48122209611, 24333605289, 22928533866, 45454639986, 39926683314, 44666111322,
    23260189932, 20629265706, 39918933684, 44399249811, 47616777369, 41033569626, 56029964634,
    24333673833, 12521465460, 12042524340, 45724886361, 41232716532, 45723076182, 40570373466,
    41228587890, 23390379306, 24332524713, 21111352101, 56055768426,
];

const SIDE: usize = 6;

/// First rule a filled grid breaks, lines are numbered from 1.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FillViolation {
    #[error("The field is not filled yet")]
    Incomplete,
    #[error("Row {0} must contain the same number of eggs of each color.")]
    RowBalance(usize),
    #[error("Column {0} must contain the same number of eggs of each color.")]
    ColumnBalance(usize),
    #[error("There are three eggs of same color next to each other in row {0}")]
    RowRun(usize),
    #[error("There are three eggs of same color next to each other in column {0}")]
    ColumnRun(usize),
    #[error("Rows {0} and {1} are identical!")]
    DuplicateRows(usize, usize),
    #[error("Columns {0} and {1} are identical!")]
    DuplicateColumns(usize, usize),
}

/// Value of cell `index` in a solved grid, 0 or 1.
pub fn seed_bit(seed: u64, index: CellIndex) -> u32 {
    ((seed >> (SIDE * SIDE - 1 - index)) & 1) as u32
}

fn is_balanced(line: &[u32]) -> bool {
    let first = line.iter().filter(|&&value| value == 1).count();
    2 * first == line.len()
}

fn has_run(line: &[u32]) -> bool {
    line.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

fn first_duplicate(lines: &[Vec<u32>]) -> Option<(usize, usize)> {
    for (a, line) in lines.iter().enumerate() {
        if let Some(b) = lines[a + 1..].iter().position(|other| other == line) {
            return Some((a + 1, a + b + 2));
        }
    }
    None
}

/// Checks a grid whose cells hold 1 or 2 clicks, 0 meaning empty.
pub fn validate_fill(field: &Field) -> std::result::Result<(), FillViolation> {
    if field.iter().any(|cell| cell.clicks == 0) {
        return Err(FillViolation::Incomplete);
    }

    let rows: Vec<Vec<u32>> = (0..field.height())
        .map(|y| field.row(y).iter().map(|cell| cell.clicks).collect())
        .collect();
    let columns: Vec<Vec<u32>> = (0..field.width())
        .map(|x| field.column(x).iter().map(|cell| cell.clicks).collect())
        .collect();

    if let Some(y) = rows.iter().position(|row| !is_balanced(row)) {
        return Err(FillViolation::RowBalance(y + 1));
    }
    if let Some(x) = columns.iter().position(|column| !is_balanced(column)) {
        return Err(FillViolation::ColumnBalance(x + 1));
    }
    if let Some(y) = rows.iter().position(|row| has_run(row)) {
        return Err(FillViolation::RowRun(y + 1));
    }
    if let Some(x) = columns.iter().position(|column| has_run(column)) {
        return Err(FillViolation::ColumnRun(x + 1));
    }
    if let Some((a, b)) = first_duplicate(&rows) {
        return Err(FillViolation::DuplicateRows(a, b));
    }
    if let Some((a, b)) = first_duplicate(&columns) {
        return Err(FillViolation::DuplicateColumns(a, b));
    }
    Ok(())
}

/// Fill the grid with two colors of eggs, balanced and without triples.
#[derive(Clone, Debug)]
pub struct Binary {
    stats: SolveStats,
    field_error: Option<String>,
    seed: u64,
}

impl Binary {
    pub(crate) fn new(core: &mut GameCore) -> Self {
        let mut binary = Self {
            stats: SolveStats::default(),
            field_error: None,
            seed: BINARY_SEEDS[0],
        };
        binary.reset(core);
        binary
    }

    pub fn solve_stats(&self) -> &SolveStats {
        &self.stats
    }

    /// Message about the last failed verification.
    pub fn field_error(&self) -> Option<&str> {
        self.field_error.as_deref()
    }

    /// The grid the current run was dealt from.
    pub fn solution(&self) -> u64 {
        self.seed
    }

    fn colors(core: &GameCore) -> [CellColor; 2] {
        core.settings
            .colors(SettingKey::Colors)
            .unwrap_or([CellColor::Red, CellColor::Blue])
    }

    fn paint_cell(cell: &mut Cell, colors: [CellColor; 2]) {
        cell.color = match cell.clicks {
            0 => None,
            clicks => colors.get(clicks as usize - 1).copied(),
        };
        cell.bgcolor = cell.color;
    }

    fn reset(&mut self, core: &mut GameCore) {
        core.phase = Phase::NotStarted;
        self.field_error = None;
        core.clicks = 0;
        core.active_cell = None;
        core.reset_timer();
        core.scheduler.cancel_where(|event| *event == TimerEvent::VerifyFill);
        core.field.clear(emoji::GOOD, true).disable_cells();
    }

    /// Deals the grid of the day with 9 to 12 cells given away.
    fn generate(&mut self, core: &mut GameCore) {
        self.seed = BINARY_SEEDS[core.daily.random_index(BINARY_SEEDS.len())];

        let size = core.field.size();
        let lock_count = core.daily.random_index(4) + 9;
        let mut locks = BTreeSet::new();
        while locks.len() < lock_count {
            locks.insert(core.daily.random_index(size));
        }

        let colors = Self::colors(core);
        for (index, cell) in core.field.iter_mut().enumerate() {
            cell.clicks = if locks.contains(&index) {
                seed_bit(self.seed, index) + 1
            } else {
                0
            };
            cell.visible = cell.clicks > 0;
            cell.locked = cell.visible;
            Self::paint_cell(cell, colors);
        }
        log::debug!("binary: dealt grid {} with {} locks", self.seed, lock_count);
    }

    fn schedule_verification(&mut self, core: &mut GameCore, now: Millis) {
        self.field_error = None;
        core.scheduler.cancel_where(|event| *event == TimerEvent::VerifyFill);
        core.scheduler.schedule(now, BINARY_VERIFY_DELAY, TimerEvent::VerifyFill);
    }

    fn verify(&mut self, core: &mut GameCore, now: Millis) -> Outcome {
        match validate_fill(&core.field) {
            Ok(()) => {
                let time = core.end_game(GameResult::Win, now);
                self.stats.record_win(time, core.clicks);
                Outcome::Won
            }
            Err(FillViolation::Incomplete) => Outcome::NoChange,
            Err(violation) => {
                let message = violation.to_string();
                log::debug!("binary: {}", message);
                if core.settings.flag(SettingKey::AdviceFriendValidation) {
                    core.advice = Some(message.clone());
                }
                self.field_error = Some(message);
                Outcome::Changed
            }
        }
    }
}

impl Strategy for Binary {
    fn stats(&self) -> StatsRef<'_> {
        StatsRef::Solve(&self.stats)
    }

    fn stats_header_mut(&mut self) -> &mut StatsHeader {
        &mut self.stats.header
    }

    fn restore_stats(&mut self, value: Value) -> serde_json::Result<()> {
        self.stats = serde_json::from_value(value)?;
        Ok(())
    }

    fn before_load(&mut self, core: &mut GameCore) {
        self.reset(core);
    }

    fn after_load(&mut self, core: &mut GameCore, _storage: &dyn Storage, now: Millis) {
        if core.result.is_none() && core.timer.is_started() && core.phase.is_running() {
            core.field.enable_cells();
            self.schedule_verification(core, now);
            core.start_timer(now);
        }
    }

    fn start_new_run(&mut self, core: &mut GameCore, now: Millis) -> Result<Outcome> {
        self.stats.header.games += 1;
        self.reset(core);
        self.generate(core);

        core.phase = Phase::Running;
        core.field.enable_cells();
        core.start_timer(now);
        Ok(Outcome::Changed)
    }

    fn on_click(&mut self, core: &mut GameCore, index: CellIndex, now: Millis) -> Outcome {
        core.clicks += 1;
        let colors = Self::colors(core);

        let cell = &mut core.field[index];
        if cell.clicks > 2 {
            cell.clicks = 0;
        }
        cell.enabled = true;
        cell.visible = cell.clicks > 0;
        Self::paint_cell(cell, colors);

        self.schedule_verification(core, now);
        core.mark_dirty();
        Outcome::Changed
    }

    fn on_timer(&mut self, core: &mut GameCore, event: TimerEvent, now: Millis) -> Outcome {
        match event {
            TimerEvent::VerifyFill if core.phase.is_running() => self.verify(core, now),
            _ => Outcome::NoChange,
        }
    }

    fn accepts_option(&self, key: SettingKey, value: &SettingValue) -> bool {
        match (key, value) {
            (SettingKey::Colors, SettingValue::Colors([first, second])) => first != second,
            _ => true,
        }
    }

    fn on_option_changed(&mut self, core: &mut GameCore, key: SettingKey, _now: Millis) -> Outcome {
        if key != SettingKey::Colors {
            return Outcome::Changed;
        }
        let colors = Self::colors(core);
        for cell in core.field.iter_mut() {
            Self::paint_cell(cell, colors);
        }
        Outcome::Changed
    }

    fn share_text(&self, core: &GameCore, url: &str) -> String {
        let stats = &self.stats;
        let mut text = format!("🥚 {}", core.kind.name());

        if stats.wins > 0 {
            if core.result.is_some() {
                text += &format!(" #{}", core.issue);
                text += &format!(
                    "\n✔️ Solved in {} ({} clicks)",
                    format_timer(stats.last_time, true),
                    stats.last_clicks
                );
            }
            text += &format!("\nIn {} runs:", stats.wins);
            text += &format!(
                "\n· Average: ⏱️{} 👆{:.2}",
                format_timer(stats.avg_time as Millis, true),
                stats.avg_clicks
            );
            text += &format!("\n· ⏱️ Best time: {}", format_timer(stats.best_time, true));
            text += &format!("\n· 👆 Lowest clicks: {}", stats.best_clicks);
        }

        text.push('\n');
        text.push_str(url);
        text
    }
}
