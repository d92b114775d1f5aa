use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::str::FromStr;

use crate::consts::PUZZLE_DEFAULT_GRID;
use crate::{CellColor, GameKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    HardMode,
    VisualAidMode,
    AdviceFriendValidation,
    Colors,
    AllowFlicks,
    OnlyEggMode,
    NumericMode,
    GridSizes,
}

impl SettingKey {
    pub const ALL: [SettingKey; 8] = [
        Self::HardMode,
        Self::VisualAidMode,
        Self::AdviceFriendValidation,
        Self::Colors,
        Self::AllowFlicks,
        Self::OnlyEggMode,
        Self::NumericMode,
        Self::GridSizes,
    ];

    pub const fn name(self) -> &'static str {
        use SettingKey::*;
        match self {
            HardMode => "hardMode",
            VisualAidMode => "visualAidMode",
            AdviceFriendValidation => "adviceFriendValidation",
            Colors => "colors",
            AllowFlicks => "allowFlicks",
            OnlyEggMode => "onlyEggMode",
            NumericMode => "numericMode",
            GridSizes => "gridSizes",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|key| key.name() == s).ok_or(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Flag(bool),
    Index(usize),
    Colors([CellColor; 2]),
}

impl SettingValue {
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub const fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            _ => None,
        }
    }

    pub const fn as_colors(&self) -> Option<[CellColor; 2]> {
        match self {
            Self::Colors(colors) => Some(*colors),
            _ => None,
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// Options of one game, only the keys of its kind are present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<SettingKey, SettingValue>,
}

impl Settings {
    pub fn defaults_for(kind: GameKind) -> Self {
        use SettingKey::*;
        use SettingValue::*;

        let values: &[(SettingKey, SettingValue)] = match kind {
            GameKind::Classic => &[(HardMode, Flag(false))],
            GameKind::Binary => &[
                (VisualAidMode, Flag(false)),
                (AdviceFriendValidation, Flag(true)),
                (SettingKey::Colors, SettingValue::Colors([CellColor::Red, CellColor::Blue])),
            ],
            GameKind::Matcher | GameKind::Filler => &[(VisualAidMode, Flag(false))],
            GameKind::Jewels => &[
                (VisualAidMode, Flag(false)),
                (AllowFlicks, Flag(true)),
                (OnlyEggMode, Flag(false)),
            ],
            GameKind::Puzzle => &[
                (AllowFlicks, Flag(true)),
                (NumericMode, Flag(false)),
                (GridSizes, Index(PUZZLE_DEFAULT_GRID)),
            ],
            GameKind::Pattern | GameKind::Aimlab => &[],
        };

        Self {
            values: values.iter().cloned().collect(),
        }
    }

    pub fn contains(&self, key: SettingKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn get(&self, key: SettingKey) -> Option<&SettingValue> {
        self.values.get(&key)
    }

    /// False for missing or non-flag options.
    pub fn flag(&self, key: SettingKey) -> bool {
        self.get(key).and_then(SettingValue::as_flag).unwrap_or(false)
    }

    pub fn index(&self, key: SettingKey) -> Option<usize> {
        self.get(key).and_then(SettingValue::as_index)
    }

    pub fn colors(&self, key: SettingKey) -> Option<[CellColor; 2]> {
        self.get(key).and_then(SettingValue::as_colors)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, &SettingValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }

    pub(crate) fn insert(&mut self, key: SettingKey, value: SettingValue) {
        self.values.insert(key, value);
    }

    /// Takes stored options that this kind knows and whose type matches.
    pub fn merge_stored(&mut self, stored: Value) -> usize {
        let Value::Object(stored) = stored else {
            log::warn!("Ignoring stored settings that are not an object");
            return 0;
        };

        let mut merged = 0;
        for (name, value) in stored {
            let Ok(key) = name.parse::<SettingKey>() else {
                log::debug!("Ignoring unknown stored setting {}", name);
                continue;
            };
            let Some(current) = self.values.get_mut(&key) else {
                continue;
            };
            match serde_json::from_value::<SettingValue>(value) {
                Ok(value) if value.same_type(current) => {
                    *current = value;
                    merged += 1;
                }
                _ => log::warn!("Ignoring stored setting {} with unexpected value", key),
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_follow_kind() {
        let binary = Settings::defaults_for(GameKind::Binary);
        assert!(binary.flag(SettingKey::AdviceFriendValidation));
        assert_eq!(
            binary.colors(SettingKey::Colors),
            Some([CellColor::Red, CellColor::Blue])
        );
        assert!(!binary.contains(SettingKey::HardMode));

        let puzzle = Settings::defaults_for(GameKind::Puzzle);
        assert_eq!(puzzle.index(SettingKey::GridSizes), Some(3));

        assert_eq!(Settings::defaults_for(GameKind::Aimlab).iter().count(), 0);
    }

    #[test]
    fn serializes_as_flat_object() {
        let settings = Settings::defaults_for(GameKind::Binary);

        assert_eq!(
            serde_json::to_value(&settings).unwrap(),
            json!({
                "visualAidMode": false,
                "adviceFriendValidation": true,
                "colors": ["red", "blue"],
            })
        );
    }

    #[test]
    fn merge_keeps_known_keys_with_matching_types() {
        let mut settings = Settings::defaults_for(GameKind::Jewels);

        let merged = settings.merge_stored(json!({
            "onlyEggMode": true,
            "allowFlicks": 3,
            "hardMode": true,
            "somethingNew": 1,
        }));

        assert_eq!(merged, 1);
        assert!(settings.flag(SettingKey::OnlyEggMode));
        assert!(settings.flag(SettingKey::AllowFlicks));
        assert!(!settings.contains(SettingKey::HardMode));
    }
}
