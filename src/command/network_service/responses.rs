//! Responses for Network service Commands
use atat::atat_derive::AtatResp;
use heapless::String;

use super::types::RegistrationStatus;

/// Signal quality +CSQ
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalQuality {
    /// 0-31, 99 when not known or not detectable
    #[at_arg(position = 0)]
    pub rssi: u8,
    /// 0-7, 99 when not known or not detectable
    #[at_arg(position = 1)]
    pub ber: u8,
}

impl SignalQuality {
    /// Received signal strength in dBm, `None` when unknown.
    pub fn dbm(&self) -> Option<i16> {
        match self.rssi {
            0..=31 => Some(-113 + 2 * self.rssi as i16),
            _ => None,
        }
    }
}

/// Network registration status +CREG
///
/// The location fields are only reported with <n> = 2.
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkRegistrationStatus {
    #[at_arg(position = 0)]
    pub n: u8,
    #[at_arg(position = 1)]
    pub stat: RegistrationStatus,
    /// Location area code, hexadecimal
    #[at_arg(position = 2)]
    pub lac: Option<String<8>>,
    /// Cell ID, hexadecimal
    #[at_arg(position = 3)]
    pub ci: Option<String<10>>,
    /// Access technology of the serving cell
    #[at_arg(position = 4)]
    pub act: Option<u8>,
}
