//! Responses for SSL Commands
use atat::atat_derive::AtatResp;
use atat::AtatResp;
use heapless::{String, Vec};

use crate::helpers::find;

/// Most data one `AT+QSSLRECV` returns
pub const MAX_RECV_LEN: usize = 1500;

/// Receive buffer counters of `AT+QSSLRECV=<id>,0`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AtatResp)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SslBufferStatus {
    #[at_arg(position = 0)]
    pub total: u32,
    #[at_arg(position = 1)]
    pub read: u32,
    #[at_arg(position = 2)]
    pub unread: u32,
}

/// Result of the last TCP/IP or SSL operation, `+QIGETERROR`
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
pub struct LastError {
    /// 0 when the last operation succeeded
    #[at_arg(position = 0)]
    pub code: i32,
    #[at_arg(position = 1)]
    pub description: String<64>,
}

/// Data of `+QSSLRECV: <len>\r\n<data>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SslData {
    pub data: Vec<u8, MAX_RECV_LEN>,
}

impl SslData {
    pub(crate) fn new(payload: &[u8]) -> Result<Self, atat::Error> {
        Ok(Self {
            data: Vec::from_slice(payload).map_err(|_| atat::Error::InvalidResponse)?,
        })
    }
}

impl AtatResp for SslData {}

/// Exactly `<len>` bytes following the `+QSSLRECV: <len>` header line.
pub fn recv_payload(resp: &[u8]) -> Result<&[u8], atat::Error> {
    const TAG: &[u8] = b"+QSSLRECV:";

    let pos = find(resp, TAG).ok_or(atat::Error::Parse)?;
    let header = &resp[pos + TAG.len()..];
    let eol = find(header, b"\r\n").ok_or(atat::Error::Parse)?;
    let len = core::str::from_utf8(&header[..eol])
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .ok_or(atat::Error::Parse)?;

    let start = pos + TAG.len() + eol + 2;
    resp.get(start..start + len).ok_or(atat::Error::Parse)
}
