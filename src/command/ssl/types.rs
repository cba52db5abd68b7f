//! Argument and parameter types used by SSL Commands
use core::fmt::Write;

use atat::atat_derive::{AtatEnum, AtatLen};
use atat::AtatLen;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Error;

/// SSL context identifier, 0-5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AtatLen)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SslContextId(pub u8);

/// SSL socket index, 0-11
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AtatLen)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SocketId(u8);

impl SocketId {
    pub const MAX: u8 = 11;

    pub fn new(id: u8) -> Result<Self, Error> {
        if id > Self::MAX {
            return Err(Error::InvalidArgument);
        }
        Ok(Self(id))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SocketId {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Error> {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SslVersion {
    Ssl3_0 = 0,
    Tls1_0 = 1,
    Tls1_1 = 2,
    Tls1_2 = 3,
    /// Negotiate any of the above
    All = 4,
}

/// <access_mode> of AT+QSSLOPEN
#[derive(Debug, Clone, Copy, PartialEq, Eq, AtatEnum)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessMode {
    Buffer = 0,
    DirectPush = 1,
    Transparent = 2,
}

/// Cipher suite code, printed as `0x` and four hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CipherSuite(pub u16);

impl CipherSuite {
    /// Every cipher suite the module supports
    pub const ALL: Self = Self(0xFFFF);
}

impl AtatLen for CipherSuite {
    const LEN: usize = 6;
}

impl Serialize for CipherSuite {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = heapless::String::<6>::new();
        write!(s, "0x{:04X}", self.0).ok();
        Serializer::serialize_bytes(serializer, s.as_bytes())
    }
}
