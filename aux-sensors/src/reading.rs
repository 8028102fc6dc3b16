//! Assembled results handed to callers.

use serde::Serialize;

use crate::value::{FieldValue, Section};

/// Temperature and relative humidity for both enclosure sections.
///
/// Every slot is always present; what could not be read holds a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvironmentalReading {
    /// Top section temperature in °C
    pub temp_top: FieldValue<f64>,
    /// Bottom section temperature in °C
    pub temp_bottom: FieldValue<f64>,
    /// Top section relative humidity in %
    pub rh_top: FieldValue<u8>,
    /// Bottom section relative humidity in %
    pub rh_bottom: FieldValue<u8>,
}

impl Default for EnvironmentalReading {
    /// Nothing received yet: every slot is `NULL`.
    fn default() -> Self {
        Self {
            temp_top: FieldValue::NoResponse,
            temp_bottom: FieldValue::NoResponse,
            rh_top: FieldValue::NoResponse,
            rh_bottom: FieldValue::NoResponse,
        }
    }
}

impl EnvironmentalReading {
    /// Slot names and rendered values, temperatures to two decimals.
    ///
    /// Order is fixed: temp_top, temp_bottom, rh_top, rh_bottom.
    pub fn entries(&self) -> [(&'static str, String); 4] {
        [
            ("temp_top", format!("{:.2}", self.temp_top)),
            ("temp_bottom", format!("{:.2}", self.temp_bottom)),
            ("rh_top", self.rh_top.to_string()),
            ("rh_bottom", self.rh_bottom.to_string()),
        ]
    }

    pub fn temperature(&self, section: Section) -> FieldValue<f64> {
        match section {
            Section::Top => self.temp_top,
            Section::Bottom => self.temp_bottom,
        }
    }

    pub fn humidity(&self, section: Section) -> FieldValue<u8> {
        match section {
            Section::Top => self.rh_top,
            Section::Bottom => self.rh_bottom,
        }
    }

    pub(crate) fn set_section(
        &mut self,
        section: Section,
        temperature: FieldValue<f64>,
        humidity: FieldValue<u8>,
    ) {
        match section {
            Section::Top => {
                self.temp_top = temperature;
                self.rh_top = humidity;
            }
            Section::Bottom => {
                self.temp_bottom = temperature;
                self.rh_bottom = humidity;
            }
        }
    }
}

/// Inclination of the top section in degrees.
pub type InclinationReading = FieldValue<f64>;

/// Orientation reported by the top-section IMU, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImuReading {
    pub pitch: FieldValue<f64>,
    pub roll: FieldValue<f64>,
    pub heading: FieldValue<f64>,
}

impl Default for ImuReading {
    fn default() -> Self {
        Self {
            pitch: FieldValue::NoResponse,
            roll: FieldValue::NoResponse,
            heading: FieldValue::NoResponse,
        }
    }
}

impl ImuReading {
    /// The enclosure inclination, taken from the pitch axis.
    pub fn inclination(&self) -> InclinationReading {
        self.pitch
    }

    pub fn entries(&self) -> [(&'static str, String); 3] {
        [
            ("pitch", self.pitch.to_string()),
            ("roll", self.roll.to_string()),
            ("heading", self.heading.to_string()),
        ]
    }
}
