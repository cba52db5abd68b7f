//! AT Commands for the Quectel EC200U series
//!
//! Following the EC200U series AT Commands Manual, the GNSS Application Note
//! and the SSL Application Note.

pub mod error;
pub mod general;
pub mod gnss;
pub mod mobile_control;
pub mod network_service;
pub mod psn;
pub mod ssl;
pub mod time;

use atat::atat_derive::{AtatCmd, AtatResp};

/// Room for the longest command line, `AT+QSSLOPEN` with a full host name.
pub const MAX_COMMAND_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
pub struct NoResponse;

/// Attention
///
/// Bare `AT`, answered with `OK` by a responsive modem.
#[derive(Clone, AtatCmd)]
#[at_cmd("", NoResponse, timeout_ms = 1000)]
pub struct AT;

#[cfg(test)]
pub(crate) fn text<Cmd: atat::AtatCmd>(cmd: &Cmd) -> std::string::String {
    let mut buf = [0u8; MAX_COMMAND_LEN];
    let len = cmd.write(&mut buf);
    std::string::String::from_utf8(buf[..len].to_vec()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attention() {
        assert_eq!(text(&AT), "AT\r\n");
    }
}
