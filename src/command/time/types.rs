//! Argument and parameter types used by clock and network time Commands
use atat::atat_derive::AtatEnum;

/// <mode> of AT+QLTS
#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeQueryMode {
    /// Time of the last network synchronization
    LastSync = 0,
    /// Current GMT time computed from the last synchronization
    Gmt = 1,
    /// Current local time computed from the last synchronization
    Local = 2,
}
