//! The one capability the reservoir needs from a record: render itself as JSON.
//!
//! Transaction, custom and error events are built elsewhere. The reservoir only
//! ever asks them to append one JSON value to the harvest payload buffer.

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;

/// A telemetry record that can write itself as a single JSON value.
pub trait Event {
    /// Append exactly one JSON value to `out`.
    ///
    /// On error the contents of `out` are unspecified; callers discard it.
    fn write_json(&self, out: &mut Vec<u8>) -> Result<()>;
}

impl<E: Event + ?Sized> Event for &E {
    fn write_json(&self, out: &mut Vec<u8>) -> Result<()> {
        (**self).write_json(out)
    }
}

impl<E: Event + ?Sized> Event for Box<E> {
    fn write_json(&self, out: &mut Vec<u8>) -> Result<()> {
        (**self).write_json(out)
    }
}

impl<E: Event + ?Sized> Event for Arc<E> {
    fn write_json(&self, out: &mut Vec<u8>) -> Result<()> {
        (**self).write_json(out)
    }
}

impl Event for serde_json::Value {
    fn write_json(&self, out: &mut Vec<u8>) -> Result<()> {
        serde_json::to_writer(out, self)?;
        Ok(())
    }
}

/// Adapter that turns any `Serialize` value into an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub struct JsonEvent<T>(pub T);

impl<T: Serialize> Event for JsonEvent<T> {
    fn write_json(&self, out: &mut Vec<u8>) -> Result<()> {
        serde_json::to_writer(out, &self.0)?;
        Ok(())
    }
}
