//! Field identities and the tri-state value carried by every reading slot.
//!
//! A slot is either a decoded number or one of two sentinels, which tell the
//! operator different things:
//!
//! - [`FieldValue::NoResponse`] (`NULL`): nothing came back for the section
//!   within the timeout. Check power and cabling.
//! - [`FieldValue::NotConfigured`] (`NC`): the board answered, but the sensor
//!   is not installed or its value could not be recovered from the reply.

use std::fmt;

use serde::{Serialize, Serializer};
use strum::{Display, EnumIter};

/// Display token for [`FieldValue::NoResponse`].
pub const NO_RESPONSE_TOKEN: &str = "NULL";

/// Display token for [`FieldValue::NotConfigured`].
pub const NOT_CONFIGURED_TOKEN: &str = "NC";

/// Physical half of the enclosure, each with its own sensor board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Section {
    Top,
    Bottom,
}

/// Kind of quantity a marker announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SensorField {
    /// Degrees Celsius, per section
    Temperature,
    /// Integer percent, per section
    RelativeHumidity,
    /// Degrees, measured once in the top section
    Inclination,
}

/// Value of a single reading slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<T> {
    /// Decoded verbatim from the board's reply.
    Number(T),
    /// No bytes arrived for the section within the timeout.
    NoResponse,
    /// The board replied but this field is absent or unrecoverable.
    NotConfigured,
}

impl<T> FieldValue<T> {
    /// The decoded number, if any.
    pub fn number(&self) -> Option<&T> {
        match self {
            FieldValue::Number(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, FieldValue::Number(_))
    }

    /// Sentinel token (`NULL` / `NC`) if this slot holds one.
    pub fn sentinel_token(&self) -> Option<&'static str> {
        match self {
            FieldValue::Number(_) => None,
            FieldValue::NoResponse => Some(NO_RESPONSE_TOKEN),
            FieldValue::NotConfigured => Some(NOT_CONFIGURED_TOKEN),
        }
    }
}

/// Numbers honour the formatter's flags, so `{:.2}` works on temperatures.
/// Sentinel tokens are written as-is.
impl<T: fmt::Display> fmt::Display for FieldValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(value) => fmt::Display::fmt(value, f),
            FieldValue::NoResponse => f.write_str(NO_RESPONSE_TOKEN),
            FieldValue::NotConfigured => f.write_str(NOT_CONFIGURED_TOKEN),
        }
    }
}

impl<T: Serialize> Serialize for FieldValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(value) => value.serialize(serializer),
            FieldValue::NoResponse => serializer.serialize_str(NO_RESPONSE_TOKEN),
            FieldValue::NotConfigured => serializer.serialize_str(NOT_CONFIGURED_TOKEN),
        }
    }
}
