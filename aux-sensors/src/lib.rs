//! Auxiliary sensor readout for the two-section enclosure.
//!
//! A multiplexer board on a serial line relays temperature and relative
//! humidity from a sensor board in each enclosure section (top and bottom),
//! plus orientation from an IMU in the top section. The link is noisy: a reply
//! may be complete, missing for a whole section, or partially corrupted.
//!
//! Every field is therefore reported as a [`FieldValue`]: a number, `NULL`
//! ([`FieldValue::NoResponse`], nothing received: check power and cabling) or
//! `NC` ([`FieldValue::NotConfigured`], board answered but the sensor is absent
//! or its value was unrecoverable).
//!
//! # Modules
//!
//! - [`decoder`] - tolerant marker/payload decoding of raw replies
//! - [`assembler`] - poll cycle over both sections
//! - [`transport`] - serial read-or-timeout collaborator
//! - [`protocol`] - wire commands and markers
//! - [`reading`], [`value`] - result types

pub mod assembler;
pub mod decoder;
pub mod protocol;
pub mod reading;
pub mod transport;
pub mod value;

pub use assembler::EnvironmentalReadingAssembler;
pub use decoder::{FieldDecoder, SectionFields};
pub use protocol::{Marker, PollTarget, RawSectionResponse, MAX_LINE_LEN};
pub use reading::{EnvironmentalReading, ImuReading, InclinationReading};
pub use transport::{
    SerialConfig, SerialTransport, Transport, TransportError, TransportResult,
    DEFAULT_BAUD_RATE, DEFAULT_PORT, DEFAULT_TIMEOUT,
};
pub use value::{FieldValue, Section, SensorField, NOT_CONFIGURED_TOKEN, NO_RESPONSE_TOKEN};
