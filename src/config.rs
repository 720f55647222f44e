//! Harvest policy: how many events of each kind a cycle may keep, and how many
//! failed harvests a batch survives before it is given up.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reservoir::{EventReservoir, DEFAULT_FAILED_HARVEST_LIMIT};

/// Default transaction events retained per harvest.
pub const MAX_TXN_EVENTS: usize = 10 * 1000;
/// Default custom events retained per harvest.
pub const MAX_CUSTOM_EVENTS: usize = 10 * 1000;
/// Default error events retained per harvest.
pub const MAX_ERROR_EVENTS: usize = 100;
/// Largest capacity a harvest policy may configure for any kind.
pub const MAX_RESERVOIR_CAPACITY: usize = 1000 * 1000;

/// Category of buffered telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// One event per completed transaction.
    Transaction,
    /// Application-defined events recorded through the custom event API.
    Custom,
    /// Errors captured during transactions.
    Error,
}

impl EventKind {
    /// All kinds, in harvest order.
    pub const ALL: [EventKind; 3] = [EventKind::Transaction, EventKind::Custom, EventKind::Error];

    /// Collector endpoint method the payload is sent to.
    pub fn collector_method(self) -> &'static str {
        match self {
            EventKind::Transaction => "analytic_event_data",
            EventKind::Custom => "custom_event_data",
            EventKind::Error => "error_event_data",
        }
    }

    /// Events retained per harvest when no limit is configured.
    pub fn default_capacity(self) -> usize {
        match self {
            EventKind::Transaction => MAX_TXN_EVENTS,
            EventKind::Custom => MAX_CUSTOM_EVENTS,
            EventKind::Error => MAX_ERROR_EVENTS,
        }
    }

    /// Lowercase name, as used in config documents.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Transaction => "transaction",
            EventKind::Custom => "custom",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind reservoir capacities and the failed-harvest retry limit.
///
/// Missing fields in a deserialized document fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestLimits {
    /// Transaction events retained per harvest.
    pub transaction_events: usize,
    /// Custom events retained per harvest.
    pub custom_events: usize,
    /// Error events retained per harvest.
    pub error_events: usize,
    /// Consecutive failed harvests before buffered content is dropped.
    pub failed_harvest_limit: u32,
}

impl Default for HarvestLimits {
    fn default() -> Self {
        Self {
            transaction_events: MAX_TXN_EVENTS,
            custom_events: MAX_CUSTOM_EVENTS,
            error_events: MAX_ERROR_EVENTS,
            failed_harvest_limit: DEFAULT_FAILED_HARVEST_LIMIT,
        }
    }
}

impl HarvestLimits {
    /// Parse limits from JSON and validate them.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let limits: Self = serde_json::from_str(raw).map_err(Error::ConfigParse)?;
        limits.validate()?;
        Ok(limits)
    }

    /// Reject limits that would build a reservoir unable to hold or retry anything.
    pub fn validate(&self) -> Result<()> {
        for kind in EventKind::ALL {
            let capacity = self.capacity(kind);
            if capacity == 0 {
                return Err(Error::InvalidLimits(format!(
                    "{kind} event capacity must be > 0"
                )));
            }
            if capacity > MAX_RESERVOIR_CAPACITY {
                return Err(Error::InvalidLimits(format!(
                    "{kind} event capacity {capacity} exceeds {MAX_RESERVOIR_CAPACITY}"
                )));
            }
        }
        if self.failed_harvest_limit == 0 {
            return Err(Error::InvalidLimits(
                "failed_harvest_limit must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Capacity configured for `kind`.
    pub fn capacity(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Transaction => self.transaction_events,
            EventKind::Custom => self.custom_events,
            EventKind::Error => self.error_events,
        }
    }

    /// Fresh reservoir for one harvest cycle of `kind`.
    pub fn reservoir<E>(&self, kind: EventKind) -> EventReservoir<E> {
        EventReservoir::with_retry_limit(self.capacity(kind), self.failed_harvest_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn defaults_match_kind_capacities() {
        let limits = HarvestLimits::default();
        for kind in EventKind::ALL {
            assert_eq!(limits.capacity(kind), kind.default_capacity());
        }
        assert_eq!(limits.failed_harvest_limit, DEFAULT_FAILED_HARVEST_LIMIT);
        limits.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_document_fills_defaults() {
        let limits = HarvestLimits::from_json_str(r#"{"error_events": 20}"#).unwrap();
        assert_eq!(limits.error_events, 20);
        assert_eq!(limits.transaction_events, MAX_TXN_EVENTS);
        assert_eq!(limits.failed_harvest_limit, DEFAULT_FAILED_HARVEST_LIMIT);
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = HarvestLimits::from_json_str(r#"{"custom_events": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidLimits(ref msg) if msg.contains("custom")));
    }

    #[test]
    fn rejects_capacity_above_ceiling() {
        let err = HarvestLimits::from_json_str(r#"{"transaction_events": 18446744073709551615}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLimits(ref msg) if msg.contains("transaction")));

        let limits = HarvestLimits {
            error_events: MAX_RESERVOIR_CAPACITY + 1,
            ..HarvestLimits::default()
        };
        assert!(matches!(limits.validate(), Err(Error::InvalidLimits(_))));
    }

    #[test]
    fn ceiling_capacity_builds_reservoir() {
        let limits = HarvestLimits {
            transaction_events: MAX_RESERVOIR_CAPACITY,
            ..HarvestLimits::default()
        };
        limits.validate().expect("ceiling is allowed");
        let events = limits.reservoir::<Value>(EventKind::Transaction);
        assert_eq!(events.capacity(), MAX_RESERVOIR_CAPACITY);
        assert_eq!(events.num_saved(), 0);
    }

    #[test]
    fn rejects_zero_retry_limit() {
        let limits = HarvestLimits {
            failed_harvest_limit: 0,
            ..HarvestLimits::default()
        };
        assert!(matches!(limits.validate(), Err(Error::InvalidLimits(_))));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = HarvestLimits::from_json_str(r#"{"span_events": 5}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn reservoir_uses_configured_limits() {
        let limits = HarvestLimits {
            error_events: 7,
            failed_harvest_limit: 2,
            ..HarvestLimits::default()
        };
        let events = limits.reservoir::<Value>(EventKind::Error);
        assert_eq!(events.capacity(), 7);
        assert_eq!(events.retry_limit(), 2);
    }

    #[test]
    fn kinds_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&EventKind::Transaction).unwrap(),
            "\"transaction\""
        );
        assert_eq!(EventKind::Error.collector_method(), "error_event_data");
    }
}
