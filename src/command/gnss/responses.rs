//! Responses for GNSS Commands
//!
//! Decimals are kept as printed; [`crate::gnss::PositionFix`] does the
//! numeric conversion so that a report is accepted or rejected as a whole.
use atat::atat_derive::AtatResp;
use heapless::String;

/// `+QGPSLOC` in formats 0 and 2
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
pub struct Location {
    /// `hhmmss.sss`
    #[at_arg(position = 0)]
    pub utc: String<12>,
    #[at_arg(position = 1)]
    pub latitude: String<16>,
    #[at_arg(position = 2)]
    pub longitude: String<16>,
    #[at_arg(position = 3)]
    pub hdop: String<8>,
    #[at_arg(position = 4)]
    pub altitude: String<10>,
    /// 2 for a 2D fix, 3 for a 3D fix
    #[at_arg(position = 5)]
    pub fix: u8,
    /// Course over ground, `ddd.mm`
    #[at_arg(position = 6)]
    pub cog: String<10>,
    #[at_arg(position = 7)]
    pub spkm: String<10>,
    #[at_arg(position = 8)]
    pub spkn: String<10>,
    /// `ddmmyy`
    #[at_arg(position = 9)]
    pub date: String<6>,
    #[at_arg(position = 10)]
    pub nsat: u8,
}

/// `+QGPSLOC` in format 1
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
pub struct LocationHemisphere {
    #[at_arg(position = 0)]
    pub utc: String<12>,
    #[at_arg(position = 1)]
    pub latitude: String<16>,
    /// `N` or `S`
    #[at_arg(position = 2)]
    pub north_south: String<1>,
    #[at_arg(position = 3)]
    pub longitude: String<16>,
    /// `E` or `W`
    #[at_arg(position = 4)]
    pub east_west: String<1>,
    #[at_arg(position = 5)]
    pub hdop: String<8>,
    #[at_arg(position = 6)]
    pub altitude: String<10>,
    #[at_arg(position = 7)]
    pub fix: u8,
    #[at_arg(position = 8)]
    pub cog: String<10>,
    #[at_arg(position = 9)]
    pub spkm: String<10>,
    #[at_arg(position = 10)]
    pub spkn: String<10>,
    #[at_arg(position = 11)]
    pub date: String<6>,
    #[at_arg(position = 12)]
    pub nsat: u8,
}
