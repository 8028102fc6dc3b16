//! Multiplexer board wire constants
//!
//! The board is polled with short ASCII commands and answers with one line
//! per measurement group, e.g. for `?vitals*`:
//!
//! ```text
//! tt2320,ht58\n
//! tb2105,hb61\n
//! ```
//!
//! and for `?imu*`:
//!
//! ```text
//! p:-1.25\n
//! r:0.40\n
//! h:273\n
//! ```
//!
//! Each value is introduced by a two-character marker. Temperatures are
//! signed hundredths of a degree Celsius, humidities integer percent and IMU
//! angles plain decimal degrees. A section without a sensor board reports
//! `tt0,ht0` / `tb0,hb0`.

use crate::value::{Section, SensorField};

/// Command answered with one `t?…,h?…` line per section.
pub const VITALS_COMMAND: &str = "?vitals*";

/// Command answered with pitch, roll and heading lines.
pub const IMU_COMMAND: &str = "?imu*";

/// Longest reply line accepted before the reader gives up on a newline.
///
/// Real replies are under 20 bytes.
pub const MAX_LINE_LEN: usize = 64;

/// Payload the board sends for both fields of a section with no board fitted.
pub const NO_BOARD_PAYLOAD: &str = "0";

/// Verbatim outcome of one poll, as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSectionResponse {
    /// Text received for the poll, possibly corrupted.
    Received(String),
    /// Nothing arrived before the read timed out.
    TimedOut,
}

impl RawSectionResponse {
    /// Wrap raw bytes; an empty run means the read timed out.
    ///
    /// Invalid UTF-8 is replaced rather than rejected so that intact markers
    /// around a damaged byte stay decodable.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            RawSectionResponse::TimedOut
        } else {
            RawSectionResponse::Received(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, RawSectionResponse::TimedOut)
    }
}

/// What a single poll asks the board for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    /// Temperature and humidity of one section.
    Environmentals(Section),
    /// Pitch/roll/heading from the top-section IMU.
    Imu,
}

impl PollTarget {
    /// Command bytes written to the board.
    pub fn command(&self) -> &'static str {
        match self {
            PollTarget::Environmentals(_) => VITALS_COMMAND,
            PollTarget::Imu => IMU_COMMAND,
        }
    }

    /// Number of lines the board sends back for this command.
    pub fn reply_lines(&self) -> usize {
        match self {
            PollTarget::Environmentals(_) => 2,
            PollTarget::Imu => 3,
        }
    }

    /// Whether a reply line belongs to this target.
    ///
    /// `?vitals*` answers for both sections at once, so a section poll keeps
    /// only lines carrying one of its own markers.
    pub fn accepts_line(&self, line: &str) -> bool {
        match self {
            PollTarget::Environmentals(section) => [
                Marker::temperature(*section),
                Marker::humidity(*section),
            ]
            .iter()
            .any(|marker| line.contains(marker.literal())),
            PollTarget::Imu => !line.is_empty(),
        }
    }
}

/// Prefix token announcing which quantity the following payload encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    TempTop,
    HumidityTop,
    TempBottom,
    HumidityBottom,
    Pitch,
    Roll,
    Heading,
}

/// Markers that may appear in a `?vitals*` reply.
pub const ENVIRONMENTAL_MARKERS: [Marker; 4] = [
    Marker::TempTop,
    Marker::HumidityTop,
    Marker::TempBottom,
    Marker::HumidityBottom,
];

/// Markers that may appear in a `?imu*` reply.
pub const IMU_MARKERS: [Marker; 3] = [Marker::Pitch, Marker::Roll, Marker::Heading];

impl Marker {
    pub fn literal(&self) -> &'static str {
        match self {
            Marker::TempTop => "tt",
            Marker::HumidityTop => "ht",
            Marker::TempBottom => "tb",
            Marker::HumidityBottom => "hb",
            Marker::Pitch => "p:",
            Marker::Roll => "r:",
            Marker::Heading => "h:",
        }
    }

    pub fn temperature(section: Section) -> Self {
        match section {
            Section::Top => Marker::TempTop,
            Section::Bottom => Marker::TempBottom,
        }
    }

    pub fn humidity(section: Section) -> Self {
        match section {
            Section::Top => Marker::HumidityTop,
            Section::Bottom => Marker::HumidityBottom,
        }
    }

    /// Field kind this marker introduces.
    pub fn field(&self) -> SensorField {
        match self {
            Marker::TempTop | Marker::TempBottom => SensorField::Temperature,
            Marker::HumidityTop | Marker::HumidityBottom => SensorField::RelativeHumidity,
            Marker::Pitch | Marker::Roll | Marker::Heading => SensorField::Inclination,
        }
    }

    /// Section the marker belongs to; IMU markers are section-less.
    pub fn section(&self) -> Option<Section> {
        match self {
            Marker::TempTop | Marker::HumidityTop => Some(Section::Top),
            Marker::TempBottom | Marker::HumidityBottom => Some(Section::Bottom),
            Marker::Pitch | Marker::Roll | Marker::Heading => None,
        }
    }
}
