//! Framing and classification of modem replies.
//!
//! Every reply is reduced to a single [`Outcome`]; successful ones also hand
//! their information text to the command's response parser.

use core::fmt;

use atat::{DigestResult, Digester, InternalError};

use crate::command::error::ErrorCode;
use crate::helpers::find;

pub(crate) const OK: &[u8] = b"OK\r\n";
pub(crate) const ERROR: &[u8] = b"ERROR\r\n";
pub(crate) const CONNECT: &[u8] = b"CONNECT\r\n";
pub(crate) const NO_CARRIER: &[u8] = b"NO CARRIER\r\n";
pub(crate) const SEND_OK: &[u8] = b"SEND OK\r\n";
pub(crate) const SEND_FAIL: &[u8] = b"SEND FAIL\r\n";

/// Inline tag of a numeric mobile equipment (or SSL stack) error.
pub(crate) const CME_ERROR: &[u8] = b"+CME ERROR:";

/// Code reported when the digits following `+CME ERROR:` can not be parsed.
pub const INVALID_CODE: i32 = -1;

/// Terminal outcome of exactly one dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Success,
    GenericError,
    Timeout,
    Connect,
    NoCarrier,
    SendOk,
    SendFail,
    /// `+CME ERROR: <code>`. Codes are forwarded untouched, including values
    /// outside the known tables.
    CodedError(i32),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            Self::CodedError(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::GenericError => f.write_str("Generic error"),
            Self::Timeout => f.write_str("Timeout"),
            Self::Connect => f.write_str("Connected"),
            Self::NoCarrier => f.write_str("No carrier"),
            Self::SendOk => f.write_str("Send OK"),
            Self::SendFail => f.write_str("Send failed"),
            Self::CodedError(code) => write!(f, "Error {}: {}", code, ErrorCode::from(*code)),
        }
    }
}

/// Tag of the data header of `AT+QSSLRECV=<id>,<len>`.
pub(crate) const RECV_DATA: &[u8] = b"+QSSLRECV:";

/// Where a `+QSSLRECV: <len>` payload sits in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Absent,
    /// The header line or the announced number of bytes has not arrived yet.
    Incomplete,
    /// Offsets of the first payload byte and one past the last.
    Within(usize, usize),
}

/// A data header carries a single decimal length; the comma separated
/// counters of `AT+QSSLRECV=<id>,0` are a regular information line.
fn recv_payload(frame: &[u8]) -> Payload {
    let Some(pos) = find(frame, RECV_DATA) else {
        return Payload::Absent;
    };
    let header = &frame[pos + RECV_DATA.len()..];
    let Some(eol) = find(header, b"\r\n") else {
        return Payload::Incomplete;
    };
    let len = match core::str::from_utf8(&header[..eol])
        .ok()
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<usize>().ok())
    {
        Some(len) => len,
        None => return Payload::Absent,
    };

    let start = pos + RECV_DATA.len() + eol + 2;
    if frame.len() < start + len {
        Payload::Incomplete
    } else {
        Payload::Within(start, start + len)
    }
}

/// The part of `frame` that may carry the final result code: everything
/// after a data payload, or the whole frame when there is none.
fn result_scope(frame: &[u8]) -> Option<&[u8]> {
    match recv_payload(frame) {
        Payload::Absent => Some(frame),
        Payload::Incomplete => None,
        Payload::Within(_, end) => Some(&frame[end..]),
    }
}

/// Standard terminal condition: one of the literal final result codes as a
/// suffix, or a complete `+CME ERROR:` line anywhere in the frame. Bytes of a
/// `+QSSLRECV` payload never count.
pub(crate) fn is_terminal(frame: &[u8]) -> bool {
    const MARKERS: [&[u8]; 6] = [OK, ERROR, CONNECT, NO_CARRIER, SEND_OK, SEND_FAIL];

    result_scope(frame)
        .map(|scope| MARKERS.iter().any(|m| scope.ends_with(m)) || coded_line_complete(scope))
        .unwrap_or(false)
}

/// `true` once the `+CME ERROR:` tag has been followed by a line terminator.
pub(crate) fn coded_line_complete(frame: &[u8]) -> bool {
    find(frame, CME_ERROR)
        .map(|pos| {
            frame[pos + CME_ERROR.len()..]
                .iter()
                .any(|b| *b == b'\r' || *b == b'\n')
        })
        .unwrap_or(false)
}

/// Extract the code following `+CME ERROR:`, or `None` if the tag is absent.
///
/// A tag with a malformed tail yields [`INVALID_CODE`].
pub(crate) fn coded_error(frame: &[u8]) -> Option<i32> {
    let pos = find(frame, CME_ERROR)?;
    let tail = &frame[pos + CME_ERROR.len()..];
    let end = tail
        .iter()
        .position(|b| *b == b'\r' || *b == b'\n')
        .unwrap_or(tail.len());

    Some(
        core::str::from_utf8(&tail[..end])
            .ok()
            .and_then(|s| s.trim().parse::<i32>().ok())
            .unwrap_or(INVALID_CODE),
    )
}

/// Map a frame to its outcome. `terminated` is whether the accumulator saw a
/// terminal condition before its deadline.
pub fn classify(frame: &[u8], terminated: bool) -> Outcome {
    if !terminated {
        return Outcome::Timeout;
    }
    let frame = result_scope(frame).unwrap_or(frame);

    if let Some(code) = coded_error(frame) {
        return Outcome::CodedError(code);
    }

    // Longer markers first: "SEND OK" also ends with "OK".
    if frame.ends_with(SEND_OK) {
        Outcome::SendOk
    } else if frame.ends_with(SEND_FAIL) {
        Outcome::SendFail
    } else if frame.ends_with(NO_CARRIER) {
        Outcome::NoCarrier
    } else if frame.ends_with(CONNECT) {
        Outcome::Connect
    } else if frame.ends_with(ERROR) {
        Outcome::GenericError
    } else if frame.ends_with(OK) {
        Outcome::Success
    } else {
        Outcome::GenericError
    }
}

fn trim_start(mut s: &[u8]) -> &[u8] {
    while let [b'\r' | b'\n', rest @ ..] = s {
        s = rest;
    }
    s
}

fn trim_end(mut s: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = s {
        s = rest;
    }
    s
}

/// Information text of a successful frame: without the command echo, the
/// surrounding line breaks and the final `OK`. A data payload is kept
/// byte-exact.
pub(crate) fn response_body(frame: &[u8]) -> &[u8] {
    let mut body = frame;
    if body.starts_with(b"AT") {
        body = match body.iter().position(|b| *b == b'\n') {
            Some(eol) => &body[eol + 1..],
            None => &[],
        };
    }
    let body = trim_start(body);

    match recv_payload(body) {
        Payload::Within(_, end) => &body[..end],
        _ => trim_end(body.strip_suffix(OK).unwrap_or(body)),
    }
}

/// Response framing of the EC200U.
///
/// A response is complete once its final result code arrived. The driver
/// reads each reply into a frame of its own, so the whole buffer is the
/// response and is consumed at once. Unsolicited result codes are not
/// separated out: they are drained before each command is written.
#[derive(Debug, Default)]
pub struct Ec200uDigester;

impl Ec200uDigester {
    pub const fn new() -> Self {
        Self
    }
}

impl Digester for Ec200uDigester {
    fn digest<'a>(&mut self, buf: &'a [u8]) -> (DigestResult<'a>, usize) {
        if !is_terminal(buf) {
            return (DigestResult::None, 0);
        }

        let result = match classify(buf, true) {
            Outcome::Success => Ok(response_body(buf)),
            Outcome::GenericError => Err(InternalError::Error),
            _ => Err(InternalError::Custom(buf)),
        };
        (DigestResult::Response(result), buf.len())
    }
}

impl From<&DigestResult<'_>> for Outcome {
    fn from(result: &DigestResult<'_>) -> Self {
        match result {
            DigestResult::Response(Ok(_)) => Outcome::Success,
            DigestResult::Response(Err(InternalError::Custom(frame))) => classify(frame, true),
            DigestResult::Response(Err(InternalError::Timeout)) | DigestResult::None => {
                Outcome::Timeout
            }
            _ => Outcome::GenericError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_and_ok_is_success() {
        assert_eq!(classify(b"AT\r\n\r\nOK\r\n", true), Outcome::Success);
    }

    #[test]
    fn coded_error_is_extracted() {
        assert_eq!(
            classify(b"\r\n+CME ERROR: 516\r\n", true),
            Outcome::CodedError(516)
        );
        assert!(coded_line_complete(b"\r\n+CME ERROR: 516\r\n"));
        assert!(!coded_line_complete(b"\r\n+CME ERROR: 51"));
    }

    #[test]
    fn coded_error_takes_precedence_over_generic_error() {
        assert_eq!(
            classify(b"\r\n+CME ERROR: 505\r\n\r\nERROR\r\n", true),
            Outcome::CodedError(505)
        );
    }

    #[test]
    fn malformed_code_yields_sentinel() {
        assert_eq!(
            classify(b"\r\n+CME ERROR: SIM busy\r\n", true),
            Outcome::CodedError(INVALID_CODE)
        );
        assert_eq!(
            classify(b"+CME ERROR:\r\n", true),
            Outcome::CodedError(INVALID_CODE)
        );
    }

    #[test]
    fn unknown_codes_are_forwarded() {
        assert_eq!(
            classify(b"+CME ERROR: 9999\r\n", true),
            Outcome::CodedError(9999)
        );
    }

    #[test]
    fn timeout_ignores_partial_content() {
        assert_eq!(classify(b"\r\n+QGPSLOC: 1234", false), Outcome::Timeout);
        assert_eq!(classify(b"OK\r\n", false), Outcome::Timeout);
        assert_eq!(classify(b"", false), Outcome::Timeout);
    }

    #[test]
    fn send_markers_win_over_ok() {
        assert_eq!(classify(b"\r\nSEND OK\r\n", true), Outcome::SendOk);
        assert_eq!(classify(b"\r\nSEND FAIL\r\n", true), Outcome::SendFail);
        assert_eq!(classify(b"\r\nNO CARRIER\r\n", true), Outcome::NoCarrier);
        assert_eq!(classify(b"\r\nCONNECT\r\n", true), Outcome::Connect);
        assert_eq!(classify(b"\r\nERROR\r\n", true), Outcome::GenericError);
    }

    #[test]
    fn terminal_markers() {
        assert!(is_terminal(b"AT\r\n\r\nOK\r\n"));
        assert!(is_terminal(b"\r\nCONNECT\r\n"));
        assert!(!is_terminal(b"\r\nOK"));
        assert!(!is_terminal(b"\r\n+CSQ: 20,99\r\n"));
    }

    #[test]
    fn final_results_inside_a_payload_do_not_terminate() {
        let payload = b"HTTP/1.1 200 OK\r\n+CME ERROR: 3\r\nab";
        let mut frame = b"\r\n+QSSLRECV: 34\r\n".to_vec();
        for (i, b) in payload.iter().enumerate() {
            frame.push(*b);
            if i + 1 < payload.len() {
                assert!(!is_terminal(&frame), "terminated after {} bytes", i + 1);
            }
        }
        assert!(!is_terminal(&frame));
        frame.extend_from_slice(b"\r\n\r\nOK\r\n");
        assert!(is_terminal(&frame));
        assert_eq!(classify(&frame, true), Outcome::Success);
        let body = [&b"+QSSLRECV: 34\r\n"[..], &payload[..]].concat();
        assert_eq!(response_body(&frame), &body[..]);
    }

    #[test]
    fn error_after_a_payload() {
        let frame = b"\r\n+QSSLRECV: 2\r\nOK\r\n+CME ERROR: 551\r\n";
        assert!(is_terminal(frame));
        assert_eq!(classify(frame, true), Outcome::CodedError(551));
    }

    #[test]
    fn buffer_counters_are_an_information_line() {
        let frame = b"\r\n+QSSLRECV: 10,4,6\r\n\r\nOK\r\n";
        assert!(is_terminal(frame));
        assert_eq!(response_body(frame), b"+QSSLRECV: 10,4,6");
    }

    #[test]
    fn body_strips_echo_and_final_result() {
        assert_eq!(response_body(b"AT+CSQ\r\r\n+CSQ: 20,99\r\n\r\nOK\r\n"), b"+CSQ: 20,99");
        assert_eq!(response_body(b"ATE0\r\n\r\nOK\r\n"), b"");
        assert_eq!(response_body(b"\r\nOK\r\n"), b"");
    }

    #[test]
    fn digester_hands_out_whole_frames() {
        let mut digester = Ec200uDigester::new();

        let (result, used) = digester.digest(b"\r\n+CSQ: 20,99\r\n");
        assert_eq!(used, 0);
        assert_eq!(Outcome::from(&result), Outcome::Timeout);

        let frame = b"\r\n+CSQ: 20,99\r\n\r\nOK\r\n";
        let (result, used) = digester.digest(frame);
        assert_eq!(used, frame.len());
        assert!(matches!(result, DigestResult::Response(Ok(b"+CSQ: 20,99"))));

        let (result, _) = digester.digest(b"\r\nERROR\r\n");
        assert!(matches!(result, DigestResult::Response(Err(InternalError::Error))));
        assert_eq!(Outcome::from(&result), Outcome::GenericError);

        let (result, _) = digester.digest(b"\r\n+CME ERROR: 505\r\n\r\nERROR\r\n");
        assert_eq!(Outcome::from(&result), Outcome::CodedError(505));

        let (result, _) = digester.digest(b"\r\nCONNECT\r\n");
        assert_eq!(Outcome::from(&result), Outcome::Connect);
    }

    #[test]
    fn display() {
        use std::string::ToString;

        assert_eq!(Outcome::Success.to_string(), "Success");
        assert_eq!(
            Outcome::CodedError(516).to_string(),
            "Error 516: GNSS not fixed now"
        );
    }
}
