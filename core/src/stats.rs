use chrono::{DateTime, Utc};
use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::consts::{PUZZLE_DEFAULT_GRID, PUZZLE_GRID_SIZES};
use crate::{GameResult, Millis};

/// Incremental mean, `count` is the number of samples already in `average`.
pub fn running_average(average: f64, count: u32, sample: f64) -> f64 {
    (average * f64::from(count) + sample) / (f64::from(count) + 1.0)
}

/// Lower of the two, where a zero `best` means nothing was recorded yet.
pub fn lowest_recorded<T: PartialOrd + Default + Copy>(best: T, sample: T) -> T {
    if best == T::default() || sample < best {
        sample
    } else {
        best
    }
}

/// Visit timestamps were written by browsers that were not always consistent.
pub(crate) mod visit_date {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(text) => DateTime::parse_from_rfc3339(&text)
                .map(|date| date.with_timezone(&Utc))
                .unwrap_or_default(),
            Value::Number(number) => number
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .unwrap_or_default(),
            _ => DateTime::default(),
        })
    }
}

/// Bookkeeping shared by every stats record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsHeader {
    pub games: u32,
    pub last_issue: i64,
    #[serde(deserialize_with = "visit_date::deserialize")]
    pub last_visit: DateTime<Utc>,
}

impl StatsHeader {
    /// True until the first save of this game.
    pub fn is_unvisited(&self) -> bool {
        self.last_visit.timestamp_millis() == 0
    }

    pub(crate) fn stamp(&mut self, issue: i64, now: Millis) {
        self.last_issue = issue;
        self.last_visit = DateTime::from_timestamp_millis(now as i64).unwrap_or_default();
    }
}

/// Click counting daily games, the sign of `streak` tells wins from losses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DailyStats {
    #[serde(flatten)]
    pub header: StatsHeader,
    pub streak: i32,
    pub wins: u32,
    pub max_clicks: u32,
    pub min_clicks: u32,
    pub avg_clicks: f64,
    pub last_clicks: u32,
}

impl DailyStats {
    pub fn record(&mut self, result: GameResult, clicks: u32, issue: i64) {
        self.last_clicks = clicks;
        self.avg_clicks = running_average(self.avg_clicks, self.header.games, f64::from(clicks));
        self.header.games += 1;
        self.header.last_issue = issue;

        match result {
            GameResult::Win => {
                self.wins += 1;
                self.streak = (self.streak + 1).max(1);
            }
            GameResult::Loss => {
                self.streak = (self.streak - 1).min(-1);
            }
        }

        self.max_clicks = self.max_clicks.max(clicks);
        self.min_clicks = lowest_recorded(self.min_clicks, clicks);
    }

    pub fn win_rate(&self) -> f64 {
        100.0 * f64::from(self.wins) / f64::from(self.header.games.max(1))
    }
}

/// Binary: averages count solved runs only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolveStats {
    #[serde(flatten)]
    pub header: StatsHeader,
    pub wins: u32,
    pub last_time: Millis,
    pub best_time: Millis,
    pub avg_time: f64,
    pub last_clicks: u32,
    pub best_clicks: u32,
    pub avg_clicks: f64,
}

impl SolveStats {
    pub fn record_win(&mut self, time: Millis, clicks: u32) {
        self.avg_time = running_average(self.avg_time, self.wins, time as f64);
        self.avg_clicks = running_average(self.avg_clicks, self.wins, f64::from(clicks));
        self.wins += 1;
        self.last_time = time;
        self.last_clicks = clicks;
        self.best_time = lowest_recorded(self.best_time, time);
        self.best_clicks = lowest_recorded(self.best_clicks, clicks);
    }
}

/// Time and clicks of finished runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunRecord {
    pub runs: u32,
    pub avg_time: f64,
    pub avg_clicks: f64,
    pub last_time: Millis,
    pub last_clicks: u32,
    pub best_time: Millis,
    pub best_clicks: u32,
}

impl RunRecord {
    pub fn record(&mut self, time: Millis, clicks: u32) {
        self.avg_time = running_average(self.avg_time, self.runs, time as f64);
        self.avg_clicks = running_average(self.avg_clicks, self.runs, f64::from(clicks));
        self.runs += 1;
        self.last_time = time;
        self.last_clicks = clicks;
        self.best_time = lowest_recorded(self.best_time, time);
        self.best_clicks = lowest_recorded(self.best_clicks, clicks);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FillerStats {
    #[serde(flatten)]
    pub header: StatsHeader,
    #[serde(flatten)]
    pub record: RunRecord,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PuzzleSizeStats {
    pub games: u32,
    #[serde(flatten)]
    pub record: RunRecord,
}

/// Sliding puzzle records, one per grid size keyed by its label.
#[derive(Clone, Debug, PartialEq)]
pub struct PuzzleStats {
    pub header: StatsHeader,
    pub sizes: BTreeMap<String, PuzzleSizeStats>,
}

impl Default for PuzzleStats {
    fn default() -> Self {
        Self {
            header: StatsHeader::default(),
            sizes: PUZZLE_GRID_SIZES
                .iter()
                .map(|size| (size.to_string(), PuzzleSizeStats::default()))
                .collect(),
        }
    }
}

impl PuzzleStats {
    pub fn size(&self, label: &str) -> Option<&PuzzleSizeStats> {
        self.sizes.get(label)
    }

    pub fn size_mut(&mut self, label: &str) -> &mut PuzzleSizeStats {
        self.sizes.entry(label.to_string()).or_default()
    }
}

impl Serialize for PuzzleStats {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(3 + self.sizes.len()))?;
        map.serialize_entry("games", &self.header.games)?;
        map.serialize_entry("lastIssue", &self.header.last_issue)?;
        map.serialize_entry("lastVisit", &self.header.last_visit)?;
        for (label, stats) in &self.sizes {
            map.serialize_entry(label, stats)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PuzzleStats {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(d)?;
        let mut stats = PuzzleStats::default();
        let legacy_size = PUZZLE_GRID_SIZES[PUZZLE_DEFAULT_GRID];

        if map.contains_key("runs") && !map.contains_key(legacy_size) {
            // a single record from before grid sizes existed, all of it was 6x6
            let legacy = serde_json::from_value(Value::Object(map.clone())).map_err(D::Error::custom)?;
            stats.sizes.insert(legacy_size.to_string(), legacy);
        } else {
            for label in PUZZLE_GRID_SIZES {
                if let Some(value) = map.remove(label) {
                    let size = serde_json::from_value(value).map_err(D::Error::custom)?;
                    stats.sizes.insert(label.to_string(), size);
                }
            }
        }

        stats.header = serde_json::from_value(Value::Object(map)).map_err(D::Error::custom)?;
        Ok(stats)
    }
}

/// Jewels scores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreStats {
    #[serde(flatten)]
    pub header: StatsHeader,
    pub runs: u32,
    pub last_score: u32,
    pub best_score: u32,
}

impl ScoreStats {
    pub fn record(&mut self, score: u32) {
        self.runs += 1;
        self.last_score = score;
        self.best_score = self.best_score.max(score);
    }
}

/// Pattern levels reached.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoundStats {
    #[serde(flatten)]
    pub header: StatsHeader,
    pub runs: u32,
    pub avg_round: f64,
    pub last_round: u32,
    pub best_round: u32,
}

impl RoundStats {
    pub fn record(&mut self, round: u32) {
        self.avg_round = running_average(self.avg_round, self.runs, f64::from(round));
        self.runs += 1;
        self.last_round = round;
        self.best_round = self.best_round.max(round);
    }
}

/// Reaction times, click times are averages over one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReflexStats {
    #[serde(flatten)]
    pub header: StatsHeader,
    pub runs: u32,
    pub last_time: Millis,
    pub best_time: Millis,
    pub avg_time: f64,
    pub last_click_time: f64,
    pub best_click_time: f64,
    pub avg_click_time: f64,
}

impl ReflexStats {
    pub fn record(&mut self, time: Millis, clicks: u32) {
        let click_time = time as f64 / f64::from(clicks.max(1));
        self.avg_time = running_average(self.avg_time, self.runs, time as f64);
        self.avg_click_time = running_average(self.avg_click_time, self.runs, click_time);
        self.runs += 1;
        self.last_time = time;
        self.last_click_time = click_time;
        self.best_time = lowest_recorded(self.best_time, time);
        self.best_click_time = lowest_recorded(self.best_click_time, click_time);
    }
}

/// Borrowed view of whichever record a variant keeps.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatsRef<'a> {
    Daily(&'a DailyStats),
    Solve(&'a SolveStats),
    Filler(&'a FillerStats),
    Puzzle(&'a PuzzleStats),
    Score(&'a ScoreStats),
    Round(&'a RoundStats),
    Reflex(&'a ReflexStats),
}

impl StatsRef<'_> {
    pub fn header(&self) -> &StatsHeader {
        match self {
            Self::Daily(stats) => &stats.header,
            Self::Solve(stats) => &stats.header,
            Self::Filler(stats) => &stats.header,
            Self::Puzzle(stats) => &stats.header,
            Self::Score(stats) => &stats.header,
            Self::Round(stats) => &stats.header,
            Self::Reflex(stats) => &stats.header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn streak_sign_tracks_runs() {
        let mut stats = DailyStats::default();

        stats.record(GameResult::Win, 5, 1);
        stats.record(GameResult::Win, 3, 2);
        assert_eq!(stats.streak, 2);

        stats.record(GameResult::Loss, 9, 3);
        assert_eq!(stats.streak, -1);
        stats.record(GameResult::Loss, 1, 4);
        assert_eq!(stats.streak, -2);

        stats.record(GameResult::Win, 4, 5);
        assert_eq!(stats.streak, 1);

        assert_eq!(stats.header.games, 5);
        assert_eq!(stats.wins, 3);
        assert_eq!(stats.max_clicks, 9);
        assert_eq!(stats.min_clicks, 1);
        assert_eq!(stats.last_clicks, 4);
        assert!((stats.avg_clicks - 4.4).abs() < 1e-9);
        assert_eq!(stats.header.last_issue, 5);
    }

    #[test]
    fn min_clicks_waits_for_first_game() {
        let mut stats = DailyStats::default();
        assert_eq!(stats.min_clicks, 0);

        stats.record(GameResult::Win, 7, 0);
        assert_eq!(stats.min_clicks, 7);
    }

    #[test]
    fn solve_stats_average_over_wins() {
        let mut stats = SolveStats::default();
        stats.record_win(60_000, 40);
        stats.record_win(30_000, 50);

        assert_eq!(stats.wins, 2);
        assert_eq!(stats.avg_time, 45_000.0);
        assert_eq!(stats.avg_clicks, 45.0);
        assert_eq!(stats.best_time, 30_000);
        assert_eq!(stats.best_clicks, 40);
        assert_eq!(stats.last_time, 30_000);
    }

    #[test]
    fn reflex_stats_keep_click_time() {
        let mut stats = ReflexStats::default();
        stats.record(36_000, 36);
        stats.record(18_000, 36);

        assert_eq!(stats.last_click_time, 500.0);
        assert_eq!(stats.best_click_time, 500.0);
        assert_eq!(stats.avg_click_time, 750.0);
        assert_eq!(stats.best_time, 18_000);
    }

    #[test]
    fn daily_stats_use_camel_case_keys() {
        let mut stats = DailyStats::default();
        stats.record(GameResult::Win, 3, 12);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["games"], 1);
        assert_eq!(value["lastIssue"], 12);
        assert_eq!(value["avgClicks"], 3.0);
        assert_eq!(value["lastVisit"], "1970-01-01T00:00:00Z");

        let back: DailyStats = serde_json::from_value(value).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn browser_visit_dates_parse() {
        let stats: DailyStats = serde_json::from_str(
            r#"{"games":3,"lastVisit":"2023-05-27T10:11:12.345Z","streak":-2}"#,
        )
        .unwrap();
        assert_eq!(stats.header.last_visit.timestamp_millis(), 1_685_182_272_345);
        assert_eq!(stats.streak, -2);
        assert!(!stats.header.is_unvisited());

        let stats: DailyStats = serde_json::from_str(r#"{"lastVisit":null}"#).unwrap();
        assert!(stats.header.is_unvisited());
    }

    #[test]
    fn flat_puzzle_stats_move_to_default_size() {
        let stats: PuzzleStats = serde_json::from_str(
            r#"{"games":4,"runs":2,"bestTime":5000,"bestClicks":80,"lastIssue":9}"#,
        )
        .unwrap();

        let legacy = stats.size("6x6").unwrap();
        assert_eq!(legacy.games, 4);
        assert_eq!(legacy.record.runs, 2);
        assert_eq!(legacy.record.best_time, 5000);
        assert_eq!(stats.size("3x3"), Some(&PuzzleSizeStats::default()));
        assert_eq!(stats.header.last_issue, 9);
    }

    #[test]
    fn puzzle_stats_round_trip_per_size() {
        let mut stats = PuzzleStats::default();
        stats.size_mut("4x4").games = 2;
        stats.size_mut("4x4").record.record(12_000, 33);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["4x4"]["runs"], 1);
        assert_eq!(value["4x4"]["bestClicks"], 33);

        let back: PuzzleStats = serde_json::from_value(value).unwrap();
        assert_eq!(back, stats);
    }

    proptest! {
        #[test]
        fn running_average_matches_mean(samples in prop::collection::vec(0u32..10_000, 1..40)) {
            let mut average = 0.0;
            for (count, &sample) in samples.iter().enumerate() {
                average = running_average(average, count as u32, f64::from(sample));
            }

            let mean = samples.iter().map(|&s| f64::from(s)).sum::<f64>() / samples.len() as f64;
            prop_assert!((average - mean).abs() < 1e-6);

            let mut reversed = 0.0;
            for (count, &sample) in samples.iter().rev().enumerate() {
                reversed = running_average(reversed, count as u32, f64::from(sample));
            }
            prop_assert!((average - reversed).abs() < 1e-6);
        }
    }
}
