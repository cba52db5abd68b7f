//! Argument and parameter types used by GNSS Commands
use atat::atat_derive::AtatEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NmeaSource {
    Disabled = 0,
    Enabled = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GnssMode {
    Standalone = 1,
    MsBased = 2,
    MsAssisted = 3,
    SpeedOptimal = 4,
}

/// <mode> of AT+QGPSLOC, selecting how latitude and longitude are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoordinateFormat {
    /// `ddmm.mmmmN` / `dddmm.mmmmE`
    DegreesMinutes = 0,
    /// `ddmm.mmmmmm,N` / `dddmm.mmmmmm,E`
    DegreesMinutesHemisphere = 1,
    /// `(-)dd.ddddd` / `(-)ddd.ddddd`
    DecimalDegrees = 2,
}

/// <fix> of `+QGPSLOC`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixMode {
    None,
    TwoD,
    ThreeD,
}

impl TryFrom<u8> for FixMode {
    type Error = ();

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 | 1 => Ok(Self::None),
            2 => Ok(Self::TwoD),
            3 => Ok(Self::ThreeD),
            _ => Err(()),
        }
    }
}
