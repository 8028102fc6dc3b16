//! Poll cycle over both enclosure sections.
//!
//! [`EnvironmentalReadingAssembler`] is the high-level entry point. It owns a
//! [`Transport`], issues one poll per section (top first, then bottom),
//! decodes each reply independently and merges the results into an
//! [`EnvironmentalReading`] whose four slots are always filled.
//!
//! ```no_run
//! use aux_sensors::EnvironmentalReadingAssembler;
//!
//! let mut sensors = EnvironmentalReadingAssembler::open_default()?;
//! let reading = sensors.get_environmentals()?;
//! println!("top: {:.2} °C, {} %", reading.temp_top, reading.rh_top);
//! # Ok::<(), aux_sensors::TransportError>(())
//! ```

use std::time::Duration;

use strum::IntoEnumIterator;
use tracing::debug;

use crate::decoder::FieldDecoder;
use crate::protocol::PollTarget;
use crate::reading::{EnvironmentalReading, ImuReading, InclinationReading};
use crate::transport::{
    SerialConfig, SerialTransport, Transport, TransportResult, DEFAULT_TIMEOUT,
};
use crate::value::Section;

/// Reads the auxiliary sensor boards through a [`Transport`].
///
/// Holds no state between calls; every call starts a fresh poll cycle.
pub struct EnvironmentalReadingAssembler<T: Transport> {
    transport: T,
    timeout: Duration,
}

impl EnvironmentalReadingAssembler<SerialTransport> {
    /// Open the serial port described by `config`.
    pub fn open(config: &SerialConfig) -> TransportResult<Self> {
        let transport = SerialTransport::open(config)?;
        Ok(Self::with_timeout(transport, config.timeout))
    }

    /// Open the default port (`/dev/ttyO5`, 57600 baud).
    pub fn open_default() -> TransportResult<Self> {
        Self::open(&SerialConfig::default())
    }
}

impl<T: Transport> EnvironmentalReadingAssembler<T> {
    /// Wrap a transport, using the default 2 s read timeout.
    pub fn new(transport: T) -> Self {
        Self::with_timeout(transport, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Temperature and humidity of both sections.
    ///
    /// Polls the top section, then the bottom section, once each. Sections
    /// that time out read `NULL`; fields that are missing or corrupted read
    /// `NC`. Only transport failures (I/O on the port) return `Err`.
    pub fn get_environmentals(&mut self) -> TransportResult<EnvironmentalReading> {
        let mut reading = EnvironmentalReading::default();

        for section in Section::iter() {
            let raw = self
                .transport
                .poll_and_read(PollTarget::Environmentals(section), self.timeout)?;
            let fields = FieldDecoder::decode_section(&raw, section);
            debug!(
                "{section} section: temp={}, rh={}",
                fields.temperature, fields.humidity
            );
            reading.set_section(section, fields.temperature, fields.humidity);
        }

        Ok(reading)
    }

    /// Inclination of the top section in degrees.
    pub fn get_inclination(&mut self) -> TransportResult<InclinationReading> {
        Ok(self.get_imu()?.inclination())
    }

    /// Pitch, roll and heading of the top-section IMU.
    pub fn get_imu(&mut self) -> TransportResult<ImuReading> {
        let raw = self.transport.poll_and_read(PollTarget::Imu, self.timeout)?;
        let imu = FieldDecoder::decode_imu(&raw);
        debug!(
            "imu: pitch={}, roll={}, heading={}",
            imu.pitch, imu.roll, imu.heading
        );
        Ok(imu)
    }
}
