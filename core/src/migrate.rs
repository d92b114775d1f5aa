//! Import of data written by the first version of the game.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::consts::emoji;
use crate::stats::visit_date;
use crate::{Cell, CellColor, DailyStats, Storage, StatsHeader, load_json};

pub const V1_SETTINGS_KEY: &str = "egdle-settings";
pub const V1_STATS_KEY: &str = "egdle-stats";
pub const V1_FIELD_KEY: &str = "egdle-field";

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct V1Settings {
    dark_mode: Option<bool>,
    hard_mode: Option<bool>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct V1Stats {
    games: u32,
    streak: i32,
    wins: u32,
    max: u32,
    min: u32,
    avgtimes: f64,
    lastclicks: u32,
    lastissue: i64,
    #[serde(deserialize_with = "visit_date::deserialize")]
    lastvisit: DateTime<Utc>,
}

impl From<V1Stats> for DailyStats {
    fn from(old: V1Stats) -> Self {
        Self {
            header: StatsHeader {
                games: old.games,
                last_issue: old.lastissue,
                last_visit: old.lastvisit,
            },
            streak: old.streak,
            wins: old.wins,
            max_clicks: old.max,
            min_clicks: old.min,
            avg_clicks: old.avgtimes,
            last_clicks: old.lastclicks,
        }
    }
}

/// State of one cell as the first version displayed it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct V1Cell {
    pub enabled: bool,
    pub visible: bool,
    pub clicks: u32,
    pub bgcolor: Option<CellColor>,
    pub winner: bool,
    pub loser: bool,
}

impl V1Cell {
    /// Derives the cell from the emoji that was shown on it, empty if unclicked.
    pub fn from_emoji(shown: &str) -> Self {
        let mut cell = Self {
            enabled: true,
            ..Self::default()
        };
        if !shown.is_empty() {
            cell.enabled = false;
            cell.visible = true;
            cell.clicks = 1;
        }

        if emoji::FOOD.contains(&shown) {
            cell.bgcolor = Some(CellColor::Red);
        } else if shown == emoji::DEATH {
            cell.bgcolor = Some(CellColor::Purple);
            cell.loser = true;
        } else if shown == emoji::GOOD {
            cell.bgcolor = Some(CellColor::Yellow);
            cell.winner = true;
        }
        cell
    }

    pub fn apply_to(&self, cell: &mut Cell) {
        cell.enabled = self.enabled;
        cell.visible = self.visible;
        cell.clicks = self.clicks;
        cell.bgcolor = self.bgcolor;
        cell.winner = self.winner;
        cell.loser = self.loser;
    }
}

fn v1_settings(storage: &dyn Storage) -> Option<V1Settings> {
    log::debug!("Attempting to migrate settings from Egdle v1");
    load_json(storage, V1_SETTINGS_KEY)
}

pub fn v1_dark_mode(storage: &dyn Storage) -> Option<bool> {
    v1_settings(storage).map(|settings| settings.dark_mode.unwrap_or(false))
}

pub fn v1_classic_hard_mode(storage: &dyn Storage) -> Option<bool> {
    v1_settings(storage).map(|settings| settings.hard_mode.unwrap_or(false))
}

pub fn v1_classic_stats(storage: &dyn Storage) -> Option<DailyStats> {
    log::debug!("Attempting to migrate Egdle Classic stats from Egdle v1");
    load_json::<V1Stats>(storage, V1_STATS_KEY).map(DailyStats::from)
}

pub fn v1_classic_field(storage: &dyn Storage) -> Option<Vec<V1Cell>> {
    log::debug!("Attempting to migrate Egdle Classic field state from Egdle v1");
    let shown: Vec<String> = load_json(storage, V1_FIELD_KEY)?;
    Some(shown.iter().map(|shown| V1Cell::from_emoji(shown)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use serde_json::json;

    #[test]
    fn cells_follow_the_shown_emoji() {
        assert_eq!(
            V1Cell::from_emoji(""),
            V1Cell {
                enabled: true,
                ..V1Cell::default()
            }
        );

        let food = V1Cell::from_emoji(emoji::FOOD[3]);
        assert!(food.visible && !food.enabled);
        assert_eq!(food.bgcolor, Some(CellColor::Red));

        let death = V1Cell::from_emoji(emoji::DEATH);
        assert!(death.loser);
        assert_eq!(death.bgcolor, Some(CellColor::Purple));

        let egg = V1Cell::from_emoji(emoji::GOOD);
        assert!(egg.winner);
        assert_eq!(egg.clicks, 1);
    }

    #[test]
    fn stats_keys_are_renamed() {
        let mut storage = MemoryStorage::new();
        storage
            .set_json(
                V1_STATS_KEY,
                &json!({
                    "games": 12, "streak": 3, "wins": 10, "max": 20, "min": 2,
                    "avgtimes": 7.5, "lastclicks": 4, "lastissue": 30,
                    "lastvisit": "2022-05-01T10:00:00.000Z",
                }),
            )
            .unwrap();

        let stats = v1_classic_stats(&storage).unwrap();

        assert_eq!(stats.header.games, 12);
        assert_eq!(stats.header.last_issue, 30);
        assert_eq!(stats.max_clicks, 20);
        assert_eq!(stats.avg_clicks, 7.5);
        assert!(!stats.header.is_unvisited());
    }

    #[test]
    fn missing_data_is_not_migrated() {
        let mut storage = MemoryStorage::new();
        assert_eq!(v1_dark_mode(&storage), None);
        assert!(v1_classic_stats(&storage).is_none());

        storage.set_json(V1_SETTINGS_KEY, &json!({ "darkMode": true })).unwrap();
        assert_eq!(v1_dark_mode(&storage), Some(true));
        assert_eq!(v1_classic_hard_mode(&storage), Some(false));
    }
}
