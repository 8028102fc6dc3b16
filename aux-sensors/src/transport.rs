//! Serial read-or-timeout collaborator for the multiplexer board.
//!
//! # Protocol Overview
//!
//! The multiplexer board sits on a plain UART (57600 8N1 by default). Each
//! poll is a short ASCII command with no terminator; the board answers with a
//! fixed number of `\n`-terminated lines (see [`crate::protocol`]).
//!
//! A poll never hangs: every reply line has its own deadline of one poll
//! timeout and a length cap, and a read that times out before the first byte
//! simply contributes nothing. When
//! nothing at all arrives for the polled target, the poll yields
//! [`RawSectionResponse::TimedOut`] instead of an error. Only failures to open
//! the port or to talk to it are reported as [`TransportError`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use aux_sensors::{PollTarget, Section, SerialConfig, SerialTransport, Transport};
//!
//! let mut transport = SerialTransport::open(&SerialConfig::default())?;
//! let raw = transport.poll_and_read(
//!     PollTarget::Environmentals(Section::Top),
//!     Duration::from_secs(2),
//! )?;
//! println!("{raw:?}");
//! # Ok::<(), aux_sensors::TransportError>(())
//! ```

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, SerialPort};
use thiserror::Error;
use tracing::{debug, trace};

use crate::protocol::{PollTarget, RawSectionResponse, MAX_LINE_LEN};

/// Serial device the multiplexer board is wired to.
pub const DEFAULT_PORT: &str = "/dev/ttyO5";

/// Baud rate of the multiplexer board.
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Per-line read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors below the read-or-timeout boundary.
///
/// A timeout is not among them; it is reported as data.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Low-level I/O error while writing a command or reading a reply.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The serial device could not be opened or configured.
    #[error("Failed to open serial port {port}: {source}")]
    PortOpen {
        port: String,
        source: serialport::Error,
    },

    /// Reconfiguring an open port failed.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Anything that can send a poll and return the board's reply or a timeout.
pub trait Transport {
    /// Send the command for `target` and collect its reply.
    ///
    /// Each expected reply line gets its own `timeout` deadline and is cut at
    /// [`MAX_LINE_LEN`](crate::protocol::MAX_LINE_LEN) bytes, so a board that
    /// never stops talking cannot stall the poll. Returns
    /// [`RawSectionResponse::TimedOut`] when nothing arrived for `target`.
    fn poll_and_read(
        &mut self,
        target: PollTarget,
        timeout: Duration,
    ) -> TransportResult<RawSectionResponse>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn poll_and_read(
        &mut self,
        target: PollTarget,
        timeout: Duration,
    ) -> TransportResult<RawSectionResponse> {
        (**self).poll_and_read(target, timeout)
    }
}

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyO5`
    pub port: String,
    pub baud_rate: u32,
    /// Initial port timeout; each poll sets its own
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// [`Transport`] over a real serial port.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open and configure the serial device.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::PortOpen`] if the device does not exist or
    /// cannot be configured.
    pub fn open(config: &SerialConfig) -> TransportResult<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TransportError::PortOpen {
                port: config.port.clone(),
                source,
            })?;

        debug!(
            "Opened {} at {} baud for aux sensors",
            config.port, config.baud_rate
        );
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn poll_and_read(
        &mut self,
        target: PollTarget,
        timeout: Duration,
    ) -> TransportResult<RawSectionResponse> {
        self.port.set_timeout(timeout)?;
        // Drop stale bytes from an earlier, late reply
        self.port.clear(ClearBuffer::Input)?;
        Ok(exchange(&mut self.port, target, timeout)?)
    }
}

/// Write the command for `target` and read back its reply lines.
fn exchange<P: Read + Write + ?Sized>(
    port: &mut P,
    target: PollTarget,
    timeout: Duration,
) -> io::Result<RawSectionResponse> {
    let command = target.command();
    debug!("Aux send: {:?}", command);
    port.write_all(command.as_bytes())?;
    port.flush()?;

    let lines = read_reply(port, target.reply_lines(), timeout)?;
    let raw = select_reply(target, &lines);
    if raw.is_timed_out() {
        debug!("No reply for {:?}", target);
    }
    Ok(raw)
}

/// Read up to `count` lines, stopping early once a read times out empty.
fn read_reply<R: Read + ?Sized>(
    reader: &mut R,
    count: usize,
    timeout: Duration,
) -> io::Result<Vec<String>> {
    let mut lines = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(bytes) = read_line(reader, timeout)? else {
            trace!("Aux read timed out after {} line(s)", lines.len());
            break;
        };
        let line = String::from_utf8_lossy(&bytes);
        let line = line.trim_matches(|c: char| c == '\r' || c == ' ');
        trace!("Aux recv: {:?}", line);
        lines.push(line.to_string());
    }
    Ok(lines)
}

/// Read bytes up to and excluding `\n`.
///
/// The whole line shares one `timeout` deadline and stops at
/// [`MAX_LINE_LEN`] bytes. Returns `None` if the read timed out (or the stream
/// ended) before any byte arrived. A line cut short by the deadline or the
/// length cap is returned as far as it got.
fn read_line<R: Read + ?Sized>(
    reader: &mut R,
    timeout: Duration,
) -> io::Result<Option<Vec<u8>>> {
    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; 1];
    let mut bytes = Vec::new();
    let mut received_any = false;

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(_) => {
                received_any = true;
                if buf[0] == b'\n' {
                    break;
                }
                bytes.push(buf[0]);
                if bytes.len() >= MAX_LINE_LEN {
                    trace!("Aux line hit {} bytes without a newline", MAX_LINE_LEN);
                    break;
                }
                if Instant::now() >= deadline {
                    trace!("Aux line deadline passed mid-line");
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(received_any.then_some(bytes))
}

/// Keep the reply lines addressed to `target`.
fn select_reply(target: PollTarget, lines: &[String]) -> RawSectionResponse {
    let kept: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|line| target.accepts_line(line))
        .collect();

    // accepted lines are never empty, so nothing kept means nothing received
    RawSectionResponse::from_bytes(kept.join("\n").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Section;
    use std::collections::VecDeque;

    const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    /// Streams `b'x'` forever and never sends a newline.
    struct Chatter {
        reads: usize,
    }

    impl Read for Chatter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            buf[0] = b'x';
            Ok(1)
        }
    }

    /// Serves scripted reads, then times out forever. Records writes.
    struct FakePort {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
    }

    impl FakePort {
        fn replying(chunks: &[&[u8]]) -> Self {
            Self {
                reads: chunks.iter().map(|c| Ok(c.to_vec())).collect(),
                written: Vec::new(),
            }
        }
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.front_mut() {
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
                Some(Err(_)) => Err(self.reads.pop_front().unwrap().unwrap_err()),
                Some(Ok(chunk)) => {
                    let n = buf.len().min(chunk.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    chunk.drain(..n);
                    if chunk.is_empty() {
                        self.reads.pop_front();
                    }
                    Ok(n)
                }
            }
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_read_line_stops_at_newline() {
        let mut port = FakePort::replying(&[b"tt2320,ht58\ntb"]);
        let first = read_line(&mut port, TEST_TIMEOUT).unwrap();
        assert_eq!(first, Some(b"tt2320,ht58".to_vec()));
        let second = read_line(&mut port, TEST_TIMEOUT).unwrap();
        assert_eq!(second, Some(b"tb".to_vec()));
        assert_eq!(read_line(&mut port, TEST_TIMEOUT).unwrap(), None);
    }

    #[test]
    fn test_read_line_empty_line_is_not_timeout() {
        let mut port = FakePort::replying(&[b"\n"]);
        assert_eq!(read_line(&mut port, TEST_TIMEOUT).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_read_line_propagates_hard_errors() {
        let mut port = FakePort {
            reads: VecDeque::from([Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))]),
            written: Vec::new(),
        };
        let err = read_line(&mut port, TEST_TIMEOUT).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_read_line_caps_endless_line() {
        let mut port = Chatter { reads: 0 };
        let line = read_line(&mut port, TEST_TIMEOUT).unwrap().unwrap();
        assert_eq!(line.len(), MAX_LINE_LEN);
        assert_eq!(port.reads, MAX_LINE_LEN);
    }

    #[test]
    fn test_read_line_stops_at_deadline() {
        let mut port = Chatter { reads: 0 };
        let line = read_line(&mut port, Duration::ZERO).unwrap().unwrap();
        assert_eq!(line, b"x");
        assert_eq!(port.reads, 1);
    }

    #[test]
    fn test_read_reply_bounded_on_chattering_board() {
        let mut port = Chatter { reads: 0 };
        let lines = read_reply(&mut port, 3, TEST_TIMEOUT).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.len() == MAX_LINE_LEN));
        assert_eq!(port.reads, 3 * MAX_LINE_LEN);
    }

    #[test]
    fn test_read_reply_strips_line_endings() {
        let mut port = FakePort::replying(&[b"tt2320,ht58 \r\n", b"tb2105,hb61\n"]);
        let lines = read_reply(&mut port, 2, TEST_TIMEOUT).unwrap();
        assert_eq!(lines, vec!["tt2320,ht58", "tb2105,hb61"]);
    }

    #[test]
    fn test_read_reply_stops_after_timeout() {
        let mut port = FakePort::replying(&[b"tt2320,ht58\n"]);
        let lines = read_reply(&mut port, 2, TEST_TIMEOUT).unwrap();
        assert_eq!(lines, vec!["tt2320,ht58"]);
    }

    #[test]
    fn test_exchange_writes_command_and_routes_reply() {
        let mut port = FakePort::replying(&[b"tt2320,ht58\ntb2105,hb61\n"]);
        let bottom = PollTarget::Environmentals(Section::Bottom);
        let raw = exchange(&mut port, bottom, TEST_TIMEOUT).unwrap();
        assert_eq!(port.written, b"?vitals*");
        assert_eq!(raw, RawSectionResponse::Received("tb2105,hb61".to_string()));
    }

    #[test]
    fn test_exchange_missing_section_line_is_timeout() {
        let mut port = FakePort::replying(&[b"tt2320,ht58\n"]);
        let bottom = PollTarget::Environmentals(Section::Bottom);
        let raw = exchange(&mut port, bottom, TEST_TIMEOUT).unwrap();
        assert_eq!(raw, RawSectionResponse::TimedOut);
    }

    #[test]
    fn test_exchange_silent_board_is_timeout() {
        let mut port = FakePort::replying(&[]);
        let raw = exchange(&mut port, PollTarget::Imu, TEST_TIMEOUT).unwrap();
        assert_eq!(port.written, b"?imu*");
        assert_eq!(raw, RawSectionResponse::TimedOut);
    }

    #[test]
    fn test_exchange_imu_keeps_all_lines() {
        let mut port = FakePort::replying(&[b"p:-1.25\n", b"r:0.40\n", b"h:273\n"]);
        let raw = exchange(&mut port, PollTarget::Imu, TEST_TIMEOUT).unwrap();
        assert_eq!(
            raw,
            RawSectionResponse::Received("p:-1.25\nr:0.40\nh:273".to_string())
        );
    }

    #[test]
    fn test_default_config() {
        let config = SerialConfig::default();
        assert_eq!(config.port, "/dev/ttyO5");
        assert_eq!(config.baud_rate, 57600);
        assert_eq!(config.timeout, Duration::from_secs(2));
    }
}
