use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellColor {
    Red,
    Yellow,
    Purple,
    Green,
    Blue,
    Gray,
    Cyan,
    Brown,
    Pink,
}

impl CellColor {
    pub const ALL: [CellColor; 9] = [
        Self::Red,
        Self::Yellow,
        Self::Purple,
        Self::Green,
        Self::Blue,
        Self::Gray,
        Self::Cyan,
        Self::Brown,
        Self::Pink,
    ];

    /// Transparent background of a cell without any color.
    pub const EMPTY_RGBA: &'static str = "rgba(0, 0, 0, 0)";

    pub const fn name(self) -> &'static str {
        use CellColor::*;
        match self {
            Red => "red",
            Yellow => "yellow",
            Purple => "purple",
            Green => "green",
            Blue => "blue",
            Gray => "gray",
            Cyan => "cyan",
            Brown => "brown",
            Pink => "pink",
        }
    }

    pub const fn rgba(self) -> &'static str {
        use CellColor::*;
        match self {
            Red => "rgba(192, 96, 96, 0.2)",
            Yellow => "rgba(160, 160, 96, 0.3)",
            Purple => "rgba(136, 64, 192, 0.2)",
            Green => "rgba(96, 192, 96, 0.2)",
            Blue => "rgba(96, 96, 192, 0.3)",
            Gray => "rgba(140, 140, 140, 0.2)",
            Cyan => "rgba(96, 192, 192, 0.3)",
            Brown => "rgba(128, 96, 64, 0.2)",
            Pink => "rgba(192, 96, 160, 0.2)",
        }
    }

    /// Accepts a color name or the CSS value older saves stored.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(tag) || color.rgba() == tag)
    }
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown cell color {0:?}")]
pub struct UnknownColor(pub String);

impl FromStr for CellColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownColor(s.to_string()))
    }
}

/// Optional colors are stored as a plain string, empty when unset.
mod color_tag {
    use super::CellColor;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Option<CellColor>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(color.map_or("", CellColor::name))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<CellColor>, D::Error> {
        let tag = Option::<String>::deserialize(d)?;
        Ok(tag.as_deref().and_then(CellColor::from_tag))
    }
}

/// One clickable slot of a field.
///
/// Only the display state is serialized, `puzzle_id` and `traveling` live for
/// a single run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cell {
    pub content: String,
    pub enabled: bool,
    pub visible: bool,
    pub locked: bool,
    pub clicks: u32,
    pub winner: bool,
    pub loser: bool,
    /// Toggles the confetti animation.
    pub finisher: bool,
    #[serde(with = "color_tag")]
    pub bgcolor: Option<CellColor>,
    #[serde(with = "color_tag")]
    pub color: Option<CellColor>,
    #[serde(skip)]
    pub puzzle_id: u32,
    #[serde(skip)]
    pub traveling: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new("")
    }
}

impl Cell {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            enabled: true,
            visible: false,
            locked: false,
            clicks: 0,
            winner: false,
            loser: false,
            finisher: false,
            bgcolor: None,
            color: None,
            puzzle_id: 0,
            traveling: false,
        }
    }

    /// Resets the display state, keeping `enabled` as is.
    pub fn clear(&mut self, content: &str, with_clicks: bool) -> &mut Self {
        self.content.clear();
        self.content.push_str(content);
        self.visible = false;
        self.locked = false;
        self.bgcolor = None;
        self.color = None;
        self.winner = false;
        self.loser = false;
        self.finisher = false;
        if with_clicks {
            self.clicks = 0;
        }
        self
    }

    /// Sets both the tag and the background to `color`.
    pub fn paint(&mut self, color: CellColor) -> &mut Self {
        self.color = Some(color);
        self.bgcolor = Some(color);
        self
    }

    /// The common part of every click, returns false for disabled cells.
    pub fn press(&mut self) -> bool {
        if !self.enabled {
            return false;
        }

        self.visible = true;
        self.clicks += 1;
        self.enabled = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_reveals_and_disables() {
        let mut cell = Cell::new("🍒");

        assert!(cell.press());
        assert!(cell.visible);
        assert!(!cell.enabled);
        assert_eq!(cell.clicks, 1);

        assert!(!cell.press());
        assert_eq!(cell.clicks, 1);
    }

    #[test]
    fn clear_keeps_clicks_unless_asked() {
        let mut cell = Cell::new("🍒");
        cell.press();
        cell.paint(CellColor::Red);
        cell.winner = true;

        cell.clear("🥚", false);
        assert_eq!(cell.content, "🥚");
        assert_eq!(cell.clicks, 1);
        assert_eq!(cell.bgcolor, None);
        assert!(!cell.winner);
        assert!(!cell.visible);

        cell.clear("", true);
        assert_eq!(cell.clicks, 0);
    }

    #[test]
    fn colors_serialize_as_names() {
        let mut cell = Cell::new("🥚");
        cell.bgcolor = Some(CellColor::Yellow);

        let value = serde_json::to_value(&cell).unwrap();
        assert_eq!(value["bgcolor"], "yellow");
        assert_eq!(value["color"], "");
        assert!(value.get("puzzleId").is_none());
        assert!(value.get("traveling").is_none());
    }

    #[test]
    fn legacy_css_colors_are_understood() {
        let cell: Cell = serde_json::from_str(
            r#"{"content":"🍒","bgcolor":"rgba(192, 96, 96, 0.2)","color":"","clicks":2}"#,
        )
        .unwrap();

        assert_eq!(cell.bgcolor, Some(CellColor::Red));
        assert_eq!(cell.color, None);
        assert_eq!(cell.clicks, 2);
        assert!(cell.enabled);
    }

    #[test]
    fn color_parsing_rejects_unknown_names() {
        assert_eq!("Blue".parse::<CellColor>(), Ok(CellColor::Blue));
        assert_eq!(
            "teal".parse::<CellColor>(),
            Err(UnknownColor("teal".to_string()))
        );
        assert_eq!(CellColor::from_tag(CellColor::EMPTY_RGBA), None);
    }
}
