//! GNSS Commands
//!
//! The GNSS engine of the EC200U is controlled entirely through AT commands
//! on the main port; positions are polled with `AT+QGPSLOC`.
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;
use responses::*;
use types::*;

use super::NoResponse;

/// Configure NMEA output source +QGPSCFG="nmeasrc"
///
/// Enables or disables acquisition of NMEA sentences through AT+QGPSGNMEA.
#[derive(Clone, AtatCmd)]
#[at_cmd("+QGPSCFG=\"nmeasrc\",", NoResponse, value_sep = false)]
pub struct ConfigureNmeaSource {
    #[at_arg(position = 0)]
    pub source: NmeaSource,
}

/// Turn on GNSS +QGPS
///
/// Starts a GNSS session. <fixmaxtime> is the maximum positioning time in
/// seconds and defaults to 30 on the module when omitted.
#[derive(Clone, AtatCmd)]
#[at_cmd("+QGPS", NoResponse)]
pub struct TurnOnGnss {
    #[at_arg(position = 0)]
    pub mode: GnssMode,
    #[at_arg(position = 1)]
    pub fix_max_time: Option<u16>,
}

/// Turn off GNSS +QGPSEND
#[derive(Clone, AtatCmd)]
#[at_cmd("+QGPSEND", NoResponse)]
pub struct TurnOffGnss;

/// Acquire positioning information +QGPSLOC
///
/// Answers `+QGPSLOC: <UTC>,<latitude>,<longitude>,<HDOP>,<altitude>,<fix>,
/// <COG>,<spkm>,<spkn>,<date>,<nsat>` once a fix is available, and
/// `+CME ERROR: 516` while it is not.
///
/// Only for [`CoordinateFormat::DegreesMinutes`] and
/// [`CoordinateFormat::DecimalDegrees`]; the hemisphere format prints two
/// more fields and is read with [`GetLocationHemisphere`].
#[derive(Clone, AtatCmd)]
#[at_cmd("+QGPSLOC", Location, timeout_ms = 5000)]
pub struct GetLocation {
    #[at_arg(position = 0)]
    pub format: CoordinateFormat,
}

/// Acquire positioning information +QGPSLOC=1
///
/// Like [`GetLocation`], with each hemisphere letter in a field of its own
/// after the coordinate.
#[derive(Clone, AtatCmd)]
#[at_cmd("+QGPSLOC=1", LocationHemisphere, timeout_ms = 5000)]
pub struct GetLocationHemisphere;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::text;

    #[test]
    fn nmea_source() {
        let cmd = ConfigureNmeaSource {
            source: NmeaSource::Enabled,
        };
        assert_eq!(text(&cmd), "AT+QGPSCFG=\"nmeasrc\",1\r\n");
    }

    #[test]
    fn turn_on() {
        let cmd = TurnOnGnss {
            mode: GnssMode::Standalone,
            fix_max_time: None,
        };
        assert_eq!(text(&cmd), "AT+QGPS=1\r\n");

        let cmd = TurnOnGnss {
            mode: GnssMode::Standalone,
            fix_max_time: Some(60),
        };
        assert_eq!(text(&cmd), "AT+QGPS=1,60\r\n");
    }

    #[test]
    fn location() {
        let cmd = GetLocation {
            format: CoordinateFormat::DecimalDegrees,
        };
        assert_eq!(text(&cmd), "AT+QGPSLOC=2\r\n");
        assert_eq!(text(&GetLocationHemisphere), "AT+QGPSLOC=1\r\n");
        assert_eq!(text(&TurnOffGnss), "AT+QGPSEND\r\n");
    }
}
