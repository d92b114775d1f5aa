use thiserror::Error;

use crate::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("Invalid field dimensions {0}x{1}: cannot go lower than 3x3")]
    InvalidDimensions(Coord, Coord),
    #[error("Cell index {0} is outside of the field")]
    InvalidCellIndex(CellIndex),
    #[error("{kind} does not support {operation}")]
    Unsupported {
        kind: GameKind,
        operation: &'static str,
    },
    #[error("Game is not running")]
    NotRunning,
    #[error("{kind} has no setting {key}")]
    UnknownSetting { kind: GameKind, key: SettingKey },
    #[error("Cannot change {0} after the game has started")]
    SettingLocked(SettingKey),
    #[error("Invalid value for setting {0}")]
    InvalidSettingValue(SettingKey),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = core::result::Result<T, GameError>;
