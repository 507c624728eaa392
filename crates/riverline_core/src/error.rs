//! Error types for the battle simulation.

use thiserror::Error;

use crate::catalog::UnitKind;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for battle configuration failures.
///
/// Runtime conditions inside a tick (pathfinding exhaustion, dangling
/// targets, insufficient energy) are never errors - they degrade to
/// "do nothing this tick" and are logged. Errors are reserved for
/// invalid inputs detected at configuration time.
#[derive(Debug, Error)]
pub enum BattleError {
    /// Failed to parse a unit catalog document.
    #[error("Failed to parse unit catalog: {0}")]
    CatalogParseError(String),

    /// The catalog is missing a stat entry for a unit kind.
    #[error("Unit catalog has no entry for {0:?}")]
    MissingCatalogEntry(UnitKind),

    /// A deck references a unit kind the catalog does not define.
    #[error("Deck references unknown unit kind {0:?}")]
    UnknownDeckUnit(UnitKind),

    /// Invalid session configuration.
    #[error("Invalid session configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        message: String,
    },
}
