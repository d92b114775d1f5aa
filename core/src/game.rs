use chrono::NaiveDate;
use rand::prelude::*;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::consts::CELL_ACTIVATION_DELAY;
use crate::*;

/// State shared by every kind of game, the variant rules operate on it.
#[derive(Clone, Debug)]
pub(crate) struct GameCore {
    pub kind: GameKind,
    pub issue: i64,
    pub today: NaiveDate,
    pub field: Field,
    pub settings: Settings,
    pub disabled_settings: BTreeSet<SettingKey>,
    pub clicks: u32,
    pub phase: Phase,
    pub result: Option<GameResult>,
    pub timer: Timer,
    /// Generator for the puzzle of the day.
    pub daily: DailyRng,
    /// Generator for everything else.
    pub rng: SmallRng,
    pub scheduler: Scheduler,
    pub active_cell: Option<CellIndex>,
    pub advice: Option<String>,
    pub dirty: bool,
}

impl GameCore {
    pub(crate) fn new(config: &GameConfig) -> Result<Self> {
        let issue = config.issue();
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let mut field = Field::new(config.field_size)?;
        field.reset(&mut rng);

        Ok(Self {
            kind: config.kind,
            issue,
            today: config.today,
            field,
            settings: Settings::defaults_for(config.kind),
            disabled_settings: BTreeSet::new(),
            clicks: 0,
            phase: config.kind.fresh_phase(),
            result: None,
            timer: Timer::default(),
            daily: DailyRng::for_game(config.kind, issue, config.today),
            rng,
            scheduler: Scheduler::new(),
            active_cell: None,
            advice: None,
            dirty: false,
        })
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn start_timer(&mut self, now: Millis) {
        self.timer.start(now, 0, &mut self.scheduler);
    }

    pub fn reset_timer(&mut self) {
        self.timer.reset(&mut self.scheduler);
    }

    /// Hides a cell after `delay` and lets it take clicks again shortly after.
    pub fn hide_after(&mut self, index: CellIndex, now: Millis, delay: Millis) {
        self.scheduler.schedule(now, delay, TimerEvent::HideCell(index));
        self.scheduler
            .schedule(now, delay + CELL_ACTIVATION_DELAY, TimerEvent::EnableCell(index));
    }

    /// Stops input and the clock, returns the elapsed run time.
    pub fn end_game(&mut self, result: GameResult, now: Millis) -> Millis {
        self.phase = Phase::Ended;
        self.result = Some(result);
        self.field.disable_cells();
        self.dirty = true;

        let elapsed = self.timer.stop(now, &mut self.scheduler);
        log::debug!("{}: game ended with {:?} after {}ms", self.kind.id(), result, elapsed);
        elapsed
    }

    pub fn lock_setting(&mut self, key: SettingKey) {
        self.disabled_settings.insert(key);
    }

    pub fn unlock_setting(&mut self, key: SettingKey) {
        self.disabled_settings.remove(&key);
    }

    /// Resets everything that only lives for one run.
    fn reset_run(&mut self) {
        self.phase = self.kind.fresh_phase();
        self.timer.set_start_time(0);
        self.clicks = 0;
        self.result = None;
    }

    /// Timer events that mean the same to every variant.
    fn fire_common(&mut self, event: TimerEvent) -> Option<Outcome> {
        match event {
            TimerEvent::HideCell(index) => {
                self.field.get_mut(index)?.visible = false;
            }
            TimerEvent::EnableCell(index) => {
                self.field.get_mut(index)?.enabled = true;
            }
            TimerEvent::ClearFinisher(index) => {
                self.field.get_mut(index)?.finisher = false;
            }
            TimerEvent::ClearResult => {
                self.result = None;
            }
            _ => return None,
        }
        Some(Outcome::Changed)
    }
}

/// One game: the shared state machine plus the rules of its kind.
#[derive(Clone, Debug)]
pub struct Game {
    core: GameCore,
    variant: Variant,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self> {
        if config.kind == GameKind::Binary && config.field_size != GameConfig::DEFAULT_FIELD_SIZE {
            let (width, height) = config.field_size;
            return Err(GameError::InvalidDimensions(width, height));
        }

        let mut core = GameCore::new(&config)?;
        let variant = Variant::new(&mut core)?;
        log::debug!("Initialized game {} #{}", config.kind.id(), core.issue);
        Ok(Self { core, variant })
    }

    pub fn kind(&self) -> GameKind {
        self.core.kind
    }

    pub fn issue(&self) -> i64 {
        self.core.issue
    }

    pub fn today(&self) -> NaiveDate {
        self.core.today
    }

    pub fn field(&self) -> &Field {
        &self.core.field
    }

    pub fn settings(&self) -> &Settings {
        &self.core.settings
    }

    pub fn is_setting_locked(&self, key: SettingKey) -> bool {
        self.core.disabled_settings.contains(&key)
    }

    pub fn locked_settings(&self) -> impl Iterator<Item = SettingKey> + '_ {
        self.core.disabled_settings.iter().copied()
    }

    pub fn clicks(&self) -> u32 {
        self.core.clicks
    }

    pub fn phase(&self) -> Phase {
        self.core.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.core.phase.game_over()
    }

    pub fn result(&self) -> Option<GameResult> {
        self.core.result
    }

    pub fn timer(&self) -> &Timer {
        &self.core.timer
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        self.core.timer.elapsed(now)
    }

    pub fn active_cell(&self) -> Option<CellIndex> {
        self.core.active_cell
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn stats(&self) -> StatsRef<'_> {
        self.variant.stats()
    }

    /// Due time of the earliest pending event, hosts sleep until then.
    pub fn next_due(&self) -> Option<Millis> {
        self.core.scheduler.next_due()
    }

    pub fn pending_events(&self) -> usize {
        self.core.scheduler.len()
    }

    /// Whether something changed that should be persisted.
    pub fn is_dirty(&self) -> bool {
        self.core.dirty
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.core.dirty)
    }

    /// Message for the player raised by the last events, if any.
    pub fn take_advice(&mut self) -> Option<String> {
        self.core.advice.take()
    }

    pub fn click(&mut self, index: CellIndex, now: Millis) -> Result<Outcome> {
        self.core.field.validate_index(index)?;
        let outcome = self.advance(now);

        if !self.core.field.press(index) {
            log::trace!("{}: cell {} ignored the click", self.core.kind.id(), index);
            return Ok(outcome);
        }

        let handled = self.variant.strategy_mut().on_click(&mut self.core, index, now);
        Ok(outcome | Outcome::Changed | handled)
    }

    /// Fires every event due at `now`, events scheduled on the way included.
    pub fn advance(&mut self, now: Millis) -> Outcome {
        let mut outcome = Outcome::NoChange;
        while let Some((due, event)) = self.core.scheduler.pop_due(now) {
            log::trace!("{}: firing {:?} due at {}", self.core.kind.id(), event, due);
            let fired = match self.core.fire_common(event) {
                Some(fired) => fired,
                None => self.variant.strategy_mut().on_timer(&mut self.core, event, due),
            };
            outcome = outcome | fired;
        }
        outcome
    }

    pub fn start_new_run(&mut self, now: Millis) -> Result<Outcome> {
        let kind = self.core.kind;
        if !kind.has_runs() {
            return Err(GameError::Unsupported {
                kind,
                operation: "start_new_run",
            });
        }

        let outcome = self.advance(now);
        self.core.scheduler.clear();
        self.core.reset_timer();
        self.core.result = None;
        self.core.clicks = 0;
        self.core.active_cell = None;
        self.core.advice = None;

        let started = self.variant.strategy_mut().start_new_run(&mut self.core, now)?;
        self.core.mark_dirty();
        log::debug!("{}: started a new run", kind.id());
        Ok(outcome | Outcome::Changed | started)
    }

    pub fn select_color(&mut self, color: CellColor, now: Millis) -> Result<Outcome> {
        if self.core.kind != GameKind::Filler {
            return Err(GameError::Unsupported {
                kind: self.core.kind,
                operation: "select_color",
            });
        }

        let outcome = self.advance(now);
        if !self.core.phase.is_running() {
            return Err(GameError::NotRunning);
        }
        let selected = self.variant.strategy_mut().select_color(&mut self.core, color, now);
        Ok(outcome | selected)
    }

    pub fn set_option(&mut self, key: SettingKey, value: SettingValue, now: Millis) -> Result<Outcome> {
        let kind = self.core.kind;
        let Some(current) = self.core.settings.get(key) else {
            return Err(GameError::UnknownSetting { kind, key });
        };
        if self.core.disabled_settings.contains(&key) {
            return Err(GameError::SettingLocked(key));
        }
        if !value.same_type(current) || !self.variant.strategy().accepts_option(key, &value) {
            return Err(GameError::InvalidSettingValue(key));
        }

        let outcome = self.advance(now);
        log::debug!("{}: {} = {:?}", kind.id(), key, value);
        self.core.settings.insert(key, value);
        let reacted = self.variant.strategy_mut().on_option_changed(&mut self.core, key, now);
        self.core.mark_dirty();
        Ok(outcome | Outcome::Changed | reacted)
    }

    /// Drops pending work and stops taking input.
    pub fn close(&mut self) {
        self.core.scheduler.clear();
        self.core.field.disable_cells();
        log::debug!("{}: closed", self.core.kind.id());
    }

    pub fn share_text(&self, url: &str) -> String {
        self.variant.strategy().share_text(&self.core, url)
    }

    /// Persisted form of the game, exactly its stored properties.
    pub fn snapshot(&self) -> serde_json::Result<Value> {
        let core = &self.core;
        let mut map = Map::new();
        for &property in core.kind.stored_properties() {
            let value = match property {
                StoredProperty::Field => serde_json::to_value(core.field.snapshot())?,
                StoredProperty::Settings => serde_json::to_value(&core.settings)?,
                StoredProperty::Stats => self.variant.strategy().stats_value()?,
                StoredProperty::GameOver => Value::from(core.phase.game_over()),
                StoredProperty::Result => match core.result {
                    Some(result) => Value::from(result.is_win()),
                    None => Value::Null,
                },
                StoredProperty::Clicks => Value::from(core.clicks),
                StoredProperty::StartTime => Value::from(core.timer.start_time()),
                StoredProperty::ActiveCell => match core.active_cell {
                    Some(index) => Value::from(index),
                    None => Value::from(-1),
                },
            };
            map.insert(property.key().to_owned(), value);
        }
        Ok(Value::Object(map))
    }

    pub fn save(&mut self, storage: &mut dyn Storage, now: Millis) -> Result<()> {
        let issue = self.core.issue;
        self.variant.strategy_mut().stats_header_mut().stamp(issue, now);

        let snapshot = self.snapshot().map_err(StorageError::from)?;
        save_json(storage, &self.core.kind.storage_key(), &snapshot)?;
        self.core.dirty = false;
        log::trace!("{}: saved", self.core.kind.id());
        Ok(())
    }

    /// Loads the stored snapshot, anything unreadable keeps its fresh value.
    pub fn restore(&mut self, storage: &dyn Storage, now: Millis) {
        let key = self.core.kind.storage_key();
        self.variant.strategy_mut().before_load(&mut self.core);

        match load_json::<Value>(storage, &key) {
            Some(Value::Object(stored)) => self.apply_snapshot(stored),
            Some(_) => log::warn!("{}: ignoring stored state that is not an object", key),
            None => self.core.reset_run(),
        }

        self.variant.strategy_mut().after_load(&mut self.core, storage, now);
        log::info!("{} - restored state", self.core.kind.id());
    }

    fn apply_snapshot(&mut self, mut stored: Map<String, Value>) {
        let kind = self.core.kind;
        let mut game_over = None;
        let mut won = None;
        let mut has_clicks = false;

        for &property in kind.stored_properties() {
            if property == StoredProperty::Field {
                continue;
            }
            let Some(value) = stored.remove(property.key()) else {
                continue;
            };
            match property {
                StoredProperty::Settings => {
                    self.core.settings.merge_stored(value);
                }
                StoredProperty::Stats => {
                    if let Err(err) = self.variant.strategy_mut().restore_stats(value) {
                        log::warn!("{}: failed to restore stats: {}", kind.id(), err);
                    }
                }
                StoredProperty::GameOver => game_over = value.as_bool(),
                StoredProperty::Result => won = value.as_bool(),
                StoredProperty::Clicks => match value.as_u64() {
                    Some(clicks) => {
                        self.core.clicks = u32::try_from(clicks).unwrap_or(u32::MAX);
                        has_clicks = true;
                    }
                    None => log::warn!("{}: ignoring stored clicks {}", kind.id(), value),
                },
                StoredProperty::StartTime => match value.as_u64() {
                    Some(start) => self.core.timer.set_start_time(start),
                    None => log::warn!("{}: ignoring stored start time {}", kind.id(), value),
                },
                StoredProperty::ActiveCell => {
                    self.core.active_cell = value
                        .as_u64()
                        .and_then(|index| usize::try_from(index).ok())
                        .filter(|&index| index < self.core.field.size());
                }
                StoredProperty::Field => {}
            }
        }

        let last_issue = self.variant.stats().header().last_issue;
        if kind.is_daily() && last_issue == self.core.issue {
            if let Some(field) = stored.remove(StoredProperty::Field.key()) {
                match Field::cells_from_value(field) {
                    Ok(cells) => {
                        let restored = self.core.field.restore_cells(cells);
                        log::debug!("{}: restored {} cells", kind.id(), restored);
                    }
                    Err(err) => log::warn!("{} - Failed to restore field: {}", kind.id(), err),
                }
            }
            self.core.result = won.map(GameResult::from_win);
            self.core.phase = match (game_over, self.core.result) {
                (Some(false), _) => Phase::Running,
                (Some(true), Some(_)) => Phase::Ended,
                (Some(true), None) => Phase::NotStarted,
                (None, _) => self.core.phase,
            };
        } else {
            self.core.reset_run();
        }

        if !has_clicks {
            self.core.clicks = self.core.field.total_clicks();
        }
        if self.core.issue - last_issue > 1 {
            self.variant.strategy_mut().reset_streak();
        }
    }
}
