use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::*;

pub const SETTINGS_KEY: &str = "egdle2-settings";
pub const TRACKER_KEY: &str = "egdle2-dtracker";

/// Options shared by every game of the app.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub dark_mode: bool,
    pub first_visit: bool,
    /// Announcements already shown, kept as stored.
    pub announcements: Vec<String>,
    pub seen_games: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            first_visit: true,
            announcements: Vec::new(),
            seen_games: vec!["classic".to_owned()],
        }
    }
}

impl AppSettings {
    /// Stored settings, or the ones of the first version on the first load.
    pub fn load(storage: &dyn Storage) -> Self {
        let stored = match storage.get_item(SETTINGS_KEY) {
            Ok(stored) => stored,
            Err(err) => {
                log::warn!("Failed to restore settings: {}", err);
                None
            }
        };

        match stored {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                log::warn!("Failed to restore settings: {}", err);
                Self::default()
            }),
            None => match v1_dark_mode(storage) {
                Some(dark_mode) => Self {
                    dark_mode,
                    first_visit: false,
                    ..Self::default()
                },
                None => Self::default(),
            },
        }
    }

    /// Returns true if `id` was not seen before.
    pub fn record_seen_game(&mut self, id: &str) -> bool {
        if self.seen_games.iter().any(|seen| seen == id) {
            return false;
        }
        self.seen_games.push(id.to_owned());
        true
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen_games.iter().any(|seen| seen == id)
    }
}

/// Games solved on one calendar day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyTracker {
    pub date: String,
    pub done: Vec<String>,
}

impl DailyTracker {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today.format("%Y-%m-%d").to_string(),
            done: Vec::new(),
        }
    }

    /// The stored tracker if it belongs to `today`, otherwise an empty one.
    pub fn load(storage: &dyn Storage, today: NaiveDate) -> Self {
        let fresh = Self::new(today);
        match load_json::<Self>(storage, TRACKER_KEY) {
            Some(stored) if stored.date == fresh.date => stored,
            Some(stored) => {
                log::debug!("Discarding daily tracker of {}", stored.date);
                fresh
            }
            None => fresh,
        }
    }

    pub fn is_for(&self, today: NaiveDate) -> bool {
        self.date == today.format("%Y-%m-%d").to_string()
    }

    /// Returns true if `id` was not solved today yet.
    pub fn record_solved(&mut self, id: &str) -> bool {
        if self.is_solved(id) {
            return false;
        }
        self.done.push(id.to_owned());
        true
    }

    pub fn is_solved(&self, id: &str) -> bool {
        self.done.iter().any(|done| done == id)
    }
}

/// Everything the app keeps about the player outside of the games.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub settings: AppSettings,
    pub tracker: DailyTracker,
    first_visit: bool,
}

impl Profile {
    pub fn load(storage: &dyn Storage, today: NaiveDate) -> Self {
        let mut settings = AppSettings::load(storage);
        let first_visit = std::mem::replace(&mut settings.first_visit, false);
        if first_visit {
            log::info!("Welcome to Egdle");
        }

        Self {
            settings,
            tracker: DailyTracker::load(storage, today),
            first_visit,
        }
    }

    /// Whether this load found neither current nor legacy settings.
    pub fn is_first_visit(&self) -> bool {
        self.first_visit
    }

    /// Flips dark mode, or sets it when `state` is given.
    pub fn toggle_dark_mode(&mut self, state: Option<bool>) -> bool {
        self.settings.dark_mode = state.unwrap_or(!self.settings.dark_mode);
        self.settings.dark_mode
    }

    /// Starts a new tracker once the calendar day changed.
    pub fn roll_over(&mut self, today: NaiveDate) {
        if !self.tracker.is_for(today) {
            self.tracker = DailyTracker::new(today);
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> core::result::Result<(), StorageError> {
        save_json(storage, SETTINGS_KEY, &self.settings)?;
        save_json(storage, TRACKER_KEY, &self.tracker)
    }
}
