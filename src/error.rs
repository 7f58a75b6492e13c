use std::fmt;

/// Errors scoped to a single vehicle instance. None of these poison the
/// surrounding loop: `InvalidConfig` leaves the previous vehicle in place,
/// `NumericInstability` rolls back to the last valid body snapshot, and
/// `UnknownUpgradeId` is a warning-level no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Malformed vehicle spec or upgrade modifier (non-monotonic curve,
    /// negative physical constant, non-finite magnitude).
    InvalidConfig(String),

    /// Integration produced a non-finite position/orientation/velocity.
    /// The body has already been rolled back when this is returned.
    NumericInstability,

    /// Upgrade apply request referencing an id not in the catalog.
    UnknownUpgradeId(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            SimError::NumericInstability => {
                write!(f, "numeric instability: tick rejected, body rolled back")
            }
            SimError::UnknownUpgradeId(id) => write!(f, "unknown upgrade id: {id}"),
        }
    }
}

impl std::error::Error for SimError {}
