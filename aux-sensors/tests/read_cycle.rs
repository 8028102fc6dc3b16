//! End-to-end read cycles through the public API with a canned transport.

use std::collections::HashMap;
use std::time::Duration;

use approx::assert_relative_eq;
use aux_sensors::{
    EnvironmentalReading, EnvironmentalReadingAssembler, FieldDecoder, FieldValue, PollTarget,
    RawSectionResponse, Section, Transport, TransportResult,
};

/// Replies with canned board output per poll target.
///
/// Mimics the multiplexer: a vitals poll returns whichever section lines the
/// board produced, filtered to the polled section.
struct CannedBoard {
    vitals: Vec<&'static str>,
    imu: Vec<&'static str>,
    polls: usize,
}

impl CannedBoard {
    fn new(vitals: &[&'static str], imu: &[&'static str]) -> Self {
        Self {
            vitals: vitals.to_vec(),
            imu: imu.to_vec(),
            polls: 0,
        }
    }
}

impl Transport for CannedBoard {
    fn poll_and_read(
        &mut self,
        target: PollTarget,
        _timeout: Duration,
    ) -> TransportResult<RawSectionResponse> {
        self.polls += 1;
        let lines = match target {
            PollTarget::Environmentals(_) => &self.vitals,
            PollTarget::Imu => &self.imu,
        };
        let kept: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|line| target.accepts_line(line))
            .collect();
        Ok(if kept.is_empty() {
            RawSectionResponse::TimedOut
        } else {
            RawSectionResponse::Received(kept.join("\n"))
        })
    }
}

fn as_map(reading: &EnvironmentalReading) -> HashMap<&'static str, String> {
    reading.entries().into_iter().collect()
}

#[test]
fn full_success_reports_every_value() {
    let board = CannedBoard::new(&["tt0,ht50", "tb0,hb99"], &[]);
    let mut sensors = EnvironmentalReadingAssembler::new(board);
    let reading = sensors.get_environmentals().unwrap();

    assert_eq!(reading.temp_top, FieldValue::Number(0.0));
    assert_eq!(reading.temp_bottom, FieldValue::Number(0.0));
    assert_eq!(reading.rh_top, FieldValue::Number(50));
    assert_eq!(reading.rh_bottom, FieldValue::Number(99));
    assert_eq!(sensors.into_inner().polls, 2);
}

#[test]
fn mixed_failure_keeps_recoverable_humidity() {
    let board = CannedBoard::new(&["tb23#1,hb24"], &[]);
    let mut sensors = EnvironmentalReadingAssembler::new(board);
    let reading = sensors.get_environmentals().unwrap();

    let map = as_map(&reading);
    assert_eq!(map["temp_top"], "NULL");
    assert_eq!(map["rh_top"], "NULL");
    assert_eq!(map["temp_bottom"], "NC");
    assert_eq!(map["rh_bottom"], "24");
}

#[test]
fn key_set_is_fixed() {
    let scenarios: [&[&'static str]; 4] = [
        &[],
        &["tt2320,ht58"],
        &["tt0,ht0", "tb0,hb0"],
        &["\u{FFFD}\u{FFFD}hb", "tt,ht"],
    ];
    for vitals in scenarios {
        let mut sensors = EnvironmentalReadingAssembler::new(CannedBoard::new(vitals, &[]));
        let reading = sensors.get_environmentals().unwrap();
        let mut keys: Vec<&str> = as_map(&reading).into_keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["rh_bottom", "rh_top", "temp_bottom", "temp_top"]);
    }
}

#[test]
fn json_output_uses_tokens() {
    let board = CannedBoard::new(&["tt2150,ht50"], &[]);
    let mut sensors = EnvironmentalReadingAssembler::new(board);
    let reading = sensors.get_environmentals().unwrap();
    let json = serde_json::to_string(&reading).unwrap();
    assert_eq!(
        json,
        r#"{"temp_top":21.5,"temp_bottom":"NULL","rh_top":50,"rh_bottom":"NULL"}"#
    );
}

#[test]
fn inclination_and_imu_share_one_path() {
    let board = CannedBoard::new(&[], &["p:-1.25", "r:0.40", "h:273"]);
    let mut sensors = EnvironmentalReadingAssembler::new(board);

    let inclination = sensors.get_inclination().unwrap();
    assert_relative_eq!(*inclination.number().unwrap(), -1.25, epsilon = 1e-12);

    let imu = sensors.get_imu().unwrap();
    assert_eq!(imu.inclination(), inclination);
    assert_relative_eq!(*imu.heading.number().unwrap(), 273.0, epsilon = 1e-12);
}

#[test]
fn decoder_and_assembler_agree() {
    let raw = RawSectionResponse::Received("tt2320,ht58".to_string());
    let fields = FieldDecoder::decode_section(&raw, Section::Top);

    let board = CannedBoard::new(&["tt2320,ht58"], &[]);
    let reading = EnvironmentalReadingAssembler::new(board)
        .get_environmentals()
        .unwrap();
    assert_eq!(reading.temperature(Section::Top), fields.temperature);
    assert_eq!(reading.humidity(Section::Top), fields.humidity);
}
