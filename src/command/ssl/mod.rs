//! SSL Commands
//!
//! Secure sockets on top of an active PDP context. Each of the 12 sockets is
//! bound to one of 6 SSL contexts, which carry the TLS configuration.
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;
use atat::{AtatCmd, InternalError};
use serde::Serialize;

use responses::*;
use types::*;

use super::psn::types::ContextId;
use super::NoResponse;

/// Configure the SSL version of a context +QSSLCFG="sslversion"
#[derive(Clone, AtatCmd)]
#[at_cmd("+QSSLCFG=\"sslversion\",", NoResponse, value_sep = false)]
pub struct SetSslVersion {
    #[at_arg(position = 0)]
    pub ssl_ctx: SslContextId,
    #[at_arg(position = 1)]
    pub version: SslVersion,
}

/// Configure the cipher suites of a context +QSSLCFG="ciphersuite"
#[derive(Clone, AtatCmd)]
#[at_cmd("+QSSLCFG=\"ciphersuite\",", NoResponse, value_sep = false)]
pub struct SetCipherSuite {
    #[at_arg(position = 0)]
    pub ssl_ctx: SslContextId,
    #[at_arg(position = 1)]
    pub suite: CipherSuite,
}

/// Configure the maximum handshake time of a context +QSSLCFG="negotiatetime"
#[derive(Clone, AtatCmd)]
#[at_cmd("+QSSLCFG=\"negotiatetime\",", NoResponse, value_sep = false)]
pub struct SetNegotiateTime {
    #[at_arg(position = 0)]
    pub ssl_ctx: SslContextId,
    /// 10-300 seconds
    #[at_arg(position = 1)]
    pub seconds: u16,
}

/// Open an SSL socket to connect a remote server +QSSLOPEN
///
/// In transparent access mode the module answers `CONNECT` once the
/// handshake completed and the serial line becomes a raw data bridge.
/// Failures are reported as `ERROR`, `+CME ERROR: <err>` or
/// `+QSSLOPEN: <clientID>,<err>`.
#[derive(Clone, AtatCmd)]
#[at_cmd("+QSSLOPEN", NoResponse, timeout_ms = 450000)]
pub struct OpenSslSocket<'a> {
    #[at_arg(position = 0)]
    pub cid: ContextId,
    #[at_arg(position = 1)]
    pub ssl_ctx: SslContextId,
    #[at_arg(position = 2)]
    pub socket: SocketId,
    #[at_arg(position = 3, len = 128)]
    pub host: &'a str,
    #[at_arg(position = 4)]
    pub port: u16,
    #[at_arg(position = 5)]
    pub mode: AccessMode,
}

/// Close an SSL socket +QSSLCLOSE
#[derive(Clone, AtatCmd)]
#[at_cmd("+QSSLCLOSE", NoResponse, timeout_ms = 10000)]
pub struct CloseSslSocket {
    #[at_arg(position = 0)]
    pub socket: SocketId,
}

/// Receive data through an SSL socket +QSSLRECV
///
/// Only valid in buffer access mode, or after leaving transparent mode with
/// the socket still open. Answers `+QSSLRECV: <len>` followed by exactly
/// `<len>` bytes of data, which may hold anything including `OK` lines, so
/// the response is parsed by length rather than by line.
#[derive(Debug, Clone, Serialize)]
pub struct ReadSslData {
    pub socket: SocketId,
    /// 1-1500
    pub length: u16,
}

impl AtatCmd for ReadSslData {
    type Response = SslData;

    const MAX_LEN: usize = 24;

    fn write(&self, buf: &mut [u8]) -> usize {
        atat::serde_at::to_slice(
            self,
            "+QSSLRECV",
            buf,
            atat::serde_at::SerializeOptions::default(),
        )
        .unwrap_or(0)
    }

    fn parse(&self, resp: Result<&[u8], InternalError>) -> Result<SslData, atat::Error> {
        let payload = recv_payload(resp?)?;
        if payload.len() > self.length as usize {
            return Err(atat::Error::InvalidResponse);
        }
        SslData::new(payload)
    }
}

/// Query the receive buffer of an SSL socket +QSSLRECV=<clientID>,0
#[derive(Clone, AtatCmd)]
#[at_cmd("+QSSLRECV", SslBufferStatus)]
pub struct GetSslBufferStatus {
    #[at_arg(position = 0)]
    pub socket: SocketId,
    #[at_arg(position = 1)]
    query: u8,
}

impl GetSslBufferStatus {
    pub fn new(socket: SocketId) -> Self {
        Self { socket, query: 0 }
    }
}

/// Query the last error code +QIGETERROR
#[derive(Clone, AtatCmd)]
#[at_cmd("+QIGETERROR", LastError)]
pub struct GetLastError;
