//! General Commands
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;
use responses::*;
use types::*;

use super::NoResponse;

/// Set command echo mode E
///
/// Controls whether the modem echoes characters received from the host.
#[derive(Clone, AtatCmd)]
#[at_cmd("E", NoResponse, value_sep = false)]
pub struct SetEcho {
    #[at_arg(position = 0)]
    pub enabled: EchoMode,
}

/// Request International Mobile Equipment Identity +GSN
///
/// Returns the IMEI of the module as a bare line.
#[derive(Clone, AtatCmd)]
#[at_cmd("+GSN", Imei)]
pub struct GetIMEI;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::text;

    #[test]
    fn echo() {
        let cmd = SetEcho {
            enabled: EchoMode::Off,
        };
        assert_eq!(text(&cmd), "ATE0\r\n");
    }

    #[test]
    fn imei() {
        assert_eq!(text(&GetIMEI), "AT+GSN\r\n");
        assert_eq!(
            atat::serde_at::from_slice(b"864475040123456"),
            Ok(Imei {
                imei: 864475040123456
            })
        );
    }
}
