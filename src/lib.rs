//! `harvest-reservoir`: bounded sampling buffer for telemetry awaiting harvest.
//!
//! An instrumented application can produce far more transaction, custom and
//! error events than a harvest may send. Each event category is buffered in an
//! [`EventReservoir`], which keeps a uniform random sample of bounded size while
//! counting every event seen, so the collector can extrapolate.
//!
//! Exposed modules:
//! - `reservoir`: the sampling buffer, merge and failed-harvest retry, payload rendering.
//! - `priority`: random retention keys.
//! - `event`: the render-as-JSON capability records must provide.
//! - `config`: per-kind capacities and the retry limit.
//! - `error`: crate error type.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod event;
pub mod priority;
pub mod reservoir;

pub use config::{EventKind, HarvestLimits};
pub use error::{Error, Result};
pub use event::{Event, JsonEvent};
pub use priority::Priority;
pub use reservoir::{EventReservoir, MergeOutcome, DEFAULT_FAILED_HARVEST_LIMIT};
