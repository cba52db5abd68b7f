//! Responses for General Commands
use atat::atat_derive::AtatResp;

/// International Mobile Equipment Identity, 15 decimal digits
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Imei {
    #[at_arg(position = 0)]
    pub imei: u64,
}
