//! Clock and network time Commands
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;
use responses::*;
use types::*;

use super::NoResponse;

/// Obtain the latest time synchronized through the network +QLTS
///
/// Answers `+QLTS: "<time>"`, with an empty string when the module has not
/// synchronized with the network yet.
#[derive(Clone, AtatCmd)]
#[at_cmd("+QLTS", NetworkTime)]
pub struct GetNetworkTime {
    #[at_arg(position = 0)]
    pub mode: TimeQueryMode,
}

/// Set the real time clock +CCLK
///
/// `time` is `yy/MM/dd,hh:mm:ss±zz`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CCLK", NoResponse)]
pub struct SetClock<'a> {
    #[at_arg(position = 0, len = 22)]
    pub time: &'a str,
}

/// Read the real time clock +CCLK?
#[derive(Clone, AtatCmd)]
#[at_cmd("+CCLK?", Clock)]
pub struct GetClock;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::text;

    #[test]
    fn network_time() {
        let cmd = GetNetworkTime {
            mode: TimeQueryMode::Local,
        };
        assert_eq!(text(&cmd), "AT+QLTS=2\r\n");
    }

    #[test]
    fn clock() {
        let cmd = SetClock {
            time: "24/11/26,14:30:00+32",
        };
        assert_eq!(text(&cmd), "AT+CCLK=\"24/11/26,14:30:00+32\"\r\n");
        assert_eq!(text(&GetClock), "AT+CCLK?\r\n");
    }
}
