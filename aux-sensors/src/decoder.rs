//! Tolerant decoding of board replies into per-field values.
//!
//! Corruption on the link is partial: bytes get dropped or altered mid-line
//! while neighbouring markers and payloads survive. A reply is therefore read
//! as a sequence of independent marker+payload tokens rather than one record.
//!
//! ```text
//! tb23#1,hb24
//! ^^----      tb -> "23#1," -> malformed -> NC
//!       ^^--  hb -> "24"               -> 24
//! ```
//!
//! Only verbatim-recoverable values are returned. A field whose marker is
//! missing or whose payload does not parse for its kind becomes
//! [`FieldValue::NotConfigured`]; [`FieldValue::NoResponse`] is produced only
//! for a timed-out read.

use tracing::{trace, warn};

use crate::protocol::{
    Marker, RawSectionResponse, ENVIRONMENTAL_MARKERS, IMU_MARKERS, NO_BOARD_PAYLOAD,
};
use crate::reading::{ImuReading, InclinationReading};
use crate::value::{FieldValue, Section};

/// Decoded fields of one section poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionFields {
    pub temperature: FieldValue<f64>,
    pub humidity: FieldValue<u8>,
}

impl SectionFields {
    fn both(temperature: FieldValue<f64>, humidity: FieldValue<u8>) -> Self {
        Self {
            temperature,
            humidity,
        }
    }
}

/// A marker and the text following it up to the next marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token<'a> {
    marker: Marker,
    payload: &'a str,
}

/// Stateless decoder for multiplexer board replies.
///
/// All methods are pure and total: any input yields a result, and the same
/// input always yields the same result.
pub struct FieldDecoder;

impl FieldDecoder {
    /// Decode the temperature and humidity of `section` from a vitals reply.
    ///
    /// # Example
    ///
    /// ```
    /// use aux_sensors::{FieldDecoder, FieldValue, RawSectionResponse, Section};
    ///
    /// let raw = RawSectionResponse::Received("tb23#1,hb24".to_string());
    /// let fields = FieldDecoder::decode_section(&raw, Section::Bottom);
    /// assert_eq!(fields.temperature, FieldValue::NotConfigured);
    /// assert_eq!(fields.humidity, FieldValue::Number(24));
    /// ```
    pub fn decode_section(raw: &RawSectionResponse, section: Section) -> SectionFields {
        let text = match raw {
            RawSectionResponse::TimedOut => {
                return SectionFields::both(FieldValue::NoResponse, FieldValue::NoResponse)
            }
            RawSectionResponse::Received(text) => text.as_str(),
        };

        let tokens = tokenize(text, &ENVIRONMENTAL_MARKERS);
        trace!("{section} section tokens: {:?}", tokens);

        let temp_marker = Marker::temperature(section);
        let rh_marker = Marker::humidity(section);

        if reports_no_board(&tokens, temp_marker, rh_marker) {
            return SectionFields::both(FieldValue::NotConfigured, FieldValue::NotConfigured);
        }

        SectionFields {
            temperature: first_valid(&tokens, temp_marker, parse_centidegrees),
            humidity: first_valid(&tokens, rh_marker, parse_humidity),
        }
    }

    /// Decode pitch, roll and heading from an IMU reply.
    pub fn decode_imu(raw: &RawSectionResponse) -> ImuReading {
        let text = match raw {
            RawSectionResponse::TimedOut => return ImuReading::default(),
            RawSectionResponse::Received(text) => text.as_str(),
        };

        let tokens = tokenize(text, &IMU_MARKERS);
        trace!("imu tokens: {:?}", tokens);

        ImuReading {
            pitch: first_valid(&tokens, Marker::Pitch, parse_degrees),
            roll: first_valid(&tokens, Marker::Roll, parse_degrees),
            heading: first_valid(&tokens, Marker::Heading, parse_degrees),
        }
    }

    /// Decode the enclosure inclination from an IMU reply.
    pub fn decode_inclination(raw: &RawSectionResponse) -> InclinationReading {
        Self::decode_imu(raw).inclination()
    }
}

/// Split `text` at every occurrence of a known marker, left to right.
///
/// Text before the first marker is dropped. Markers are ASCII, so every split
/// point lands on a char boundary even in lossily decoded input.
fn tokenize<'a>(text: &'a str, markers: &[Marker]) -> Vec<Token<'a>> {
    let bytes = text.as_bytes();
    let mut hits: Vec<(usize, Marker)> = Vec::new();

    let mut pos = 0;
    while pos < bytes.len() {
        let found = markers
            .iter()
            .find(|marker| bytes[pos..].starts_with(marker.literal().as_bytes()));
        match found {
            Some(marker) => {
                hits.push((pos, *marker));
                pos += marker.literal().len();
            }
            None => pos += 1,
        }
    }

    hits.iter()
        .enumerate()
        .map(|(i, &(start, marker))| {
            let payload_start = start + marker.literal().len();
            let payload_end = hits.get(i + 1).map_or(text.len(), |&(next, _)| next);
            Token {
                marker,
                payload: &text[payload_start..payload_end],
            }
        })
        .collect()
}

/// Strip whitespace and the `,` separators around a payload.
fn clean(payload: &str) -> &str {
    payload.trim_matches(|c: char| c.is_whitespace() || c == ',')
}

/// First payload for `marker` that parses; `NotConfigured` if there is none.
fn first_valid<T>(
    tokens: &[Token<'_>],
    marker: Marker,
    parse: fn(&str) -> Option<T>,
) -> FieldValue<T> {
    for token in tokens.iter().filter(|token| token.marker == marker) {
        let payload = clean(token.payload);
        match parse(payload) {
            Some(value) => return FieldValue::Number(value),
            None => warn!(
                "Malformed {} payload after '{}': {:?}",
                marker.field(),
                marker.literal(),
                token.payload
            ),
        }
    }
    FieldValue::NotConfigured
}

/// `tt0,ht0` / `tb0,hb0`: the board answered but has no sensor fitted.
fn reports_no_board(tokens: &[Token<'_>], temp_marker: Marker, rh_marker: Marker) -> bool {
    let first_payload = |marker: Marker| {
        tokens
            .iter()
            .find(|token| token.marker == marker)
            .map(|token| clean(token.payload))
    };
    first_payload(temp_marker) == Some(NO_BOARD_PAYLOAD)
        && first_payload(rh_marker) == Some(NO_BOARD_PAYLOAD)
}

/// Signed hundredths of a degree, e.g. `2320` -> 23.20 °C.
fn parse_centidegrees(payload: &str) -> Option<f64> {
    let hundredths: i32 = payload.parse().ok()?;
    Some(f64::from(hundredths) / 100.0)
}

/// Integer percent in 0..=100.
fn parse_humidity(payload: &str) -> Option<u8> {
    let percent: u8 = payload.parse().ok()?;
    (percent <= 100).then_some(percent)
}

/// Decimal degrees, finite only.
fn parse_degrees(payload: &str) -> Option<f64> {
    payload.parse::<f64>().ok().filter(|value| value.is_finite())
}
