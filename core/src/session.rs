use crate::*;

type RefreshHook = Box<dyn FnMut(&Game)>;

/// One open game together with its storage and the player profile.
///
/// Every operation pumps due timers first, persists the game when it marked
/// itself dirty and calls the refresh hook when the outcome has an update.
pub struct Session<S: Storage> {
    game: Game,
    storage: S,
    profile: Profile,
    on_refresh: Option<RefreshHook>,
}

impl<S: Storage> Session<S> {
    pub fn open(config: GameConfig, storage: S, now: Millis) -> Result<Self> {
        let mut game = Game::new(config)?;
        game.restore(&storage, now);

        let mut profile = Profile::load(&storage, config.today);
        profile.settings.record_seen_game(config.kind.id());

        let mut session = Self {
            game,
            storage,
            profile,
            on_refresh: None,
        };
        session.save_game(now);
        session.save_profile();
        Ok(session)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Flips dark mode, or sets it when `state` is given, and stores it.
    pub fn toggle_dark_mode(&mut self, state: Option<bool>) -> bool {
        let dark_mode = self.profile.toggle_dark_mode(state);
        self.save_profile();
        dark_mode
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn set_refresh_hook(&mut self, hook: impl FnMut(&Game) + 'static) {
        self.on_refresh = Some(Box::new(hook));
    }

    pub fn click(&mut self, index: CellIndex, now: Millis) -> Result<Outcome> {
        let outcome = self.game.click(index, now)?;
        Ok(self.settle(outcome, now))
    }

    /// Fires due timers, hosts call this from their clock.
    pub fn advance(&mut self, now: Millis) -> Outcome {
        let outcome = self.game.advance(now);
        self.settle(outcome, now)
    }

    pub fn start_new_run(&mut self, now: Millis) -> Result<Outcome> {
        let outcome = self.game.start_new_run(now)?;
        Ok(self.settle(outcome, now))
    }

    pub fn select_color(&mut self, color: CellColor, now: Millis) -> Result<Outcome> {
        let outcome = self.game.select_color(color, now)?;
        Ok(self.settle(outcome, now))
    }

    pub fn set_option(&mut self, key: SettingKey, value: SettingValue, now: Millis) -> Result<Outcome> {
        let outcome = self.game.set_option(key, value, now)?;
        Ok(self.settle(outcome, now))
    }

    pub fn view(&self, now: Millis) -> GameView<'_> {
        GameView::new(&self.game, now)
    }

    pub fn share_text(&self, url: &str) -> String {
        self.game.share_text(url)
    }

    pub fn take_advice(&mut self) -> Option<String> {
        self.game.take_advice()
    }

    /// Drops pending timers and writes what is left.
    pub fn close(&mut self, now: Millis) {
        self.game.close();
        if self.game.is_dirty() {
            self.save_game(now);
        }
    }

    /// Consumes the session, handing the storage back.
    pub fn into_storage(mut self, now: Millis) -> S {
        self.close(now);
        self.storage
    }

    fn settle(&mut self, outcome: Outcome, now: Millis) -> Outcome {
        if outcome == Outcome::Won {
            self.profile.roll_over(self.game.today());
            if self.profile.tracker.record_solved(self.game.kind().id()) {
                self.save_profile();
            }
        }
        if self.game.is_dirty() {
            self.save_game(now);
        }
        if outcome.has_update() {
            if let Some(hook) = self.on_refresh.as_mut() {
                hook(&self.game);
            }
        }
        outcome
    }

    fn save_game(&mut self, now: Millis) {
        if let Err(err) = self.game.save(&mut self.storage, now) {
            log::error!("Could not save game: {}", err);
        }
    }

    fn save_profile(&mut self) {
        if let Err(err) = self.profile.save(&mut self.storage) {
            log::error!("Could not save settings: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::Cell as Counter;
    use std::rc::Rc;

    fn config(kind: GameKind) -> GameConfig {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        GameConfig::daily(kind, today, 9)
    }

    /// Refuses every write.
    struct ReadOnly(MemoryStorage);

    impl Storage for ReadOnly {
        fn get_item(&self, key: &str) -> core::result::Result<Option<String>, StorageError> {
            self.0.get_item(key)
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> core::result::Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[test]
    fn open_records_the_visit() {
        let session = Session::open(config(GameKind::Pattern), MemoryStorage::new(), 5_000).unwrap();

        assert!(session.profile().settings.has_seen("pattern"));
        let storage = session.storage();
        assert!(storage.get_item("egdle2-pattern").unwrap().is_some());
        assert!(storage.get_item(SETTINGS_KEY).unwrap().is_some());
        assert_eq!(session.game().stats().header().last_visit.timestamp_millis(), 5_000);
    }

    #[test]
    fn winning_marks_the_day_solved() {
        let mut session = Session::open(config(GameKind::Classic), MemoryStorage::new(), 0).unwrap();
        let winner = match session.game().variant() {
            Variant::Classic(rules) => rules.winner(),
            _ => unreachable!(),
        };

        assert_eq!(session.click(winner, 100), Ok(Outcome::Won));
        assert!(session.profile().tracker.is_solved("egdle"));
        assert!(!session.game().is_dirty());

        let stored: DailyTracker = session.storage().get_json(TRACKER_KEY).unwrap().unwrap();
        assert_eq!(stored.done, vec!["egdle"]);
    }

    #[test]
    fn refresh_hook_sees_updates_only() {
        let mut session = Session::open(config(GameKind::Aimlab), MemoryStorage::new(), 0).unwrap();
        let calls = Rc::new(Counter::new(0));
        let seen = calls.clone();
        session.set_refresh_hook(move |_| seen.set(seen.get() + 1));

        session.advance(10);
        assert_eq!(calls.get(), 0);

        session.start_new_run(20).unwrap();
        assert_eq!(calls.get(), 1);
        let active = session.game().active_cell().unwrap();
        session.click(active, 30).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failed_saves_do_not_stop_the_game() {
        let mut session = Session::open(config(GameKind::Classic), ReadOnly(MemoryStorage::new()), 0).unwrap();
        let decoy = (0..36).find(|&i| !session.game().field()[i].winner).unwrap();

        assert_eq!(session.click(decoy, 100), Ok(Outcome::Changed));
        assert!(session.game().is_dirty());
        assert_eq!(session.game().clicks(), 1);
    }

    #[test]
    fn close_stops_input_and_timers() {
        let mut session = Session::open(config(GameKind::Matcher), MemoryStorage::new(), 0).unwrap();
        session.click(0, 10).unwrap();

        session.close(20);
        assert_eq!(session.game().pending_events(), 0);
        assert!(session.game().field().all(|cell| !cell.enabled));
        assert_eq!(session.click(1, 30), Ok(Outcome::NoChange));
    }

    #[test]
    fn dark_mode_is_stored_right_away() {
        let mut session = Session::open(config(GameKind::Filler), MemoryStorage::new(), 0).unwrap();

        assert!(session.toggle_dark_mode(None));
        let stored: AppSettings = session.storage().get_json(SETTINGS_KEY).unwrap().unwrap();
        assert!(stored.dark_mode);
        assert!(stored.has_seen("filler"));
    }

    #[test]
    fn view_reflects_the_game() {
        let session = Session::open(config(GameKind::Jewels), MemoryStorage::new(), 0).unwrap();
        let view = session.view(0);

        assert_eq!(view.id, "jewels");
        assert_eq!(view.cells.len(), 36);
        assert_eq!(view.phase, Phase::NotStarted);
    }
}
