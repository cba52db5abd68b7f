//! SSL sockets in transparent access mode.
//!
//! After `AT+QSSLOPEN` answers `CONNECT`, the serial line stops carrying AT
//! commands and bridges raw bytes to the TLS peer. Leaving the bridge needs
//! the `+++` escape surrounded by a guard period of silence; the socket stays
//! open afterwards and its remaining data can be read in buffer mode until it
//! is closed.
//!
//! Bytes coming off the bridge are watched for the `NO CARRIER` line the
//! modem prints when the peer hangs up. A possible start of that line is held
//! back until it either completes or turns out to be data, so the marker is
//! found whatever the read sizes. Data read while leaving the bridge is kept
//! in a backlog that [`Client::receive`] serves first.

use atat::{AtatCmd, Digester};
use embassy_time::{Duration, Instant};
use heapless::{Deque, String, Vec};

use crate::client::Client;
use crate::command::psn::{types::ContextId, ActivatePdpContext};
use crate::command::ssl::{
    responses::{LastError, SslBufferStatus, MAX_RECV_LEN},
    types::{AccessMode, CipherSuite, SocketId, SslContextId, SslVersion},
    CloseSslSocket, GetLastError, GetSslBufferStatus, OpenSslSocket, ReadSslData,
    SetCipherSuite, SetNegotiateTime, SetSslVersion,
};
use crate::command::MAX_COMMAND_LEN;
use crate::config::ModemConfig;
use crate::digest::{self, Ec200uDigester, Outcome, INVALID_CODE};
use crate::error::Error;
use crate::helpers::{find, LossyStr};
use crate::traits::Transport;

pub const MAX_HOST_LEN: usize = 128;

/// Bridge data kept aside for [`Client::receive`].
pub const BACKLOG_LEN: usize = 1024;

/// Handshake time the module is configured with by [`Client::ssl_begin`].
const DEFAULT_NEGOTIATE_TIME: u16 = 300;

const ESCAPE: &[u8] = b"+++";
const OPEN_RESULT: &[u8] = b"+QSSLOPEN:";
/// Printed by the modem on the bridge when the peer closes the connection.
const CARRIER_LOST: &[u8] = b"\r\nNO CARRIER\r\n";
/// The only reply that confirms the escape.
const ESCAPE_CONFIRMED: &[u8] = b"\r\nOK\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SslMode {
    Closed,
    /// `AT+QSSLOPEN` sent, waiting for `CONNECT`
    Opening,
    /// The serial line is a raw data bridge to the peer
    Transparent,
    /// Back in command mode with the socket still open
    Closing,
    /// `+++` was sent but never confirmed. The modem may still be bridging,
    /// so the line is treated as busy until the socket is closed.
    EscapeUnconfirmed,
}

pub(crate) struct SslSession {
    pub(crate) mode: SslMode,
    socket: Option<SocketId>,
    peer: Option<(String<MAX_HOST_LEN>, u16)>,
    last_error: Option<i32>,
    contexts: Option<(ContextId, SslContextId)>,
    backlog: Deque<u8, BACKLOG_LEN>,
    /// Trailing bridge bytes that are a prefix of [`CARRIER_LOST`]
    held: Vec<u8, 14>,
    held_at: Instant,
}

impl SslSession {
    pub(crate) const fn new() -> Self {
        Self {
            mode: SslMode::Closed,
            socket: None,
            peer: None,
            last_error: None,
            contexts: None,
            backlog: Deque::new(),
            held: Vec::new(),
            held_at: Instant::from_ticks(0),
        }
    }

    /// Keeps the backlog: data received before the peer hung up stays
    /// readable.
    fn finish(&mut self) {
        self.mode = SslMode::Closed;
        self.socket = None;
        self.peer = None;
        self.held.clear();
    }

    fn stash(&mut self, byte: u8) {
        if self.backlog.push_back(byte).is_err() {
            warn!("SSL backlog full, dropping a byte");
        }
    }

    /// Room for one more byte from the line, including whatever it may
    /// release from `held`.
    fn has_room(&self) -> bool {
        self.backlog.capacity() - self.backlog.len() > self.held.len()
    }

    /// Feed one byte from the bridge. Returns `true` once the carrier-lost
    /// line is complete; its bytes are not data.
    fn watch(&mut self, byte: u8, now: Instant) -> bool {
        if self.held.push(byte).is_err() {
            self.stash(byte);
            return false;
        }
        self.held_at = now;

        while !CARRIER_LOST.starts_with(&self.held) {
            let front = self.held.remove(0);
            self.stash(front);
        }

        if self.held.as_slice() == CARRIER_LOST {
            self.held.clear();
            return true;
        }
        false
    }

    fn release_held(&mut self) {
        let held = core::mem::take(&mut self.held);
        for byte in held {
            self.stash(byte);
        }
    }

    fn drain_backlog(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.backlog.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }
}

/// Terminal condition of the `AT+QSSLOPEN` exchange in transparent mode.
fn open_terminal(frame: &[u8]) -> bool {
    open_result(frame).is_some() || digest::is_terminal(frame)
}

/// `<err>` of a complete `+QSSLOPEN: <clientID>,<err>` line.
fn open_result(frame: &[u8]) -> Option<i32> {
    let pos = find(frame, OPEN_RESULT)?;
    let tail = &frame[pos + OPEN_RESULT.len()..];
    let end = tail.iter().position(|b| *b == b'\r' || *b == b'\n')?;

    Some(
        core::str::from_utf8(&tail[..end])
            .ok()
            .and_then(|line| line.rsplit(',').next())
            .and_then(|err| err.trim().parse().ok())
            .unwrap_or(INVALID_CODE),
    )
}

fn open_outcome(digester: &mut Ec200uDigester, frame: &[u8]) -> Outcome {
    match open_result(frame) {
        Some(0) => Outcome::GenericError,
        Some(err) => Outcome::CodedError(err),
        None => Outcome::from(&digester.digest(frame).0),
    }
}

impl<T, C> Client<T, C>
where
    T: Transport,
    C: ModemConfig,
{
    pub fn ssl_mode(&self) -> SslMode {
        self.ssl.mode
    }

    pub fn ssl_socket(&self) -> Option<SocketId> {
        self.ssl.socket
    }

    pub fn ssl_peer(&self) -> Option<(&str, u16)> {
        self.ssl
            .peer
            .as_ref()
            .map(|(host, port)| (host.as_str(), *port))
    }

    /// Code of the last failed open, or the last nonzero `AT+QIGETERROR`.
    pub fn ssl_error_code(&self) -> Option<i32> {
        self.ssl.last_error
    }

    /// Activate the PDP context and give the SSL context a permissive
    /// default configuration: every cipher suite and a 300 s handshake.
    ///
    /// Subsequent [`connect`](Self::connect) calls use these contexts.
    pub async fn ssl_begin(
        &mut self,
        cid: ContextId,
        ssl_ctx: SslContextId,
        version: SslVersion,
    ) -> Result<(), Error> {
        self.send(&ActivatePdpContext { cid }).await?;
        self.send(&SetSslVersion { ssl_ctx, version }).await?;
        self.ssl_configure(ssl_ctx, CipherSuite::ALL, DEFAULT_NEGOTIATE_TIME)
            .await?;

        self.ssl.contexts = Some((cid, ssl_ctx));
        info!("SSL context {} ready on PDP context {}", ssl_ctx.0, cid.0);
        Ok(())
    }

    pub async fn ssl_configure(
        &mut self,
        ssl_ctx: SslContextId,
        suite: CipherSuite,
        negotiate_time: u16,
    ) -> Result<(), Error> {
        if !(10..=300).contains(&negotiate_time) {
            return Err(Error::InvalidArgument);
        }
        self.send(&SetCipherSuite { ssl_ctx, suite }).await?;
        self.send(&SetNegotiateTime {
            ssl_ctx,
            seconds: negotiate_time,
        })
        .await?;
        Ok(())
    }

    /// Open `socket` to `host:port` in transparent mode.
    ///
    /// On success the serial line is bridged to the peer until
    /// [`exit_transparent`](Self::exit_transparent) or
    /// [`disconnect`](Self::disconnect). A failed open leaves the session
    /// closed with the reported code in [`ssl_error_code`](Self::ssl_error_code).
    pub async fn connect(&mut self, host: &str, port: u16, socket: u8) -> Result<(), Error> {
        let socket = SocketId::new(socket)?;
        if host.is_empty() || host.contains('"') {
            return Err(Error::InvalidArgument);
        }
        if self.ssl.mode != SslMode::Closed {
            return Err(Error::InvalidState);
        }
        let mut peer = String::new();
        peer.push_str(host).map_err(|_| Error::InvalidArgument)?;

        let (cid, ssl_ctx) = self
            .ssl
            .contexts
            .unwrap_or((C::CONTEXT_ID, C::SSL_CONTEXT_ID));
        let cmd = OpenSslSocket {
            cid,
            ssl_ctx,
            socket,
            host,
            port,
            mode: AccessMode::Transparent,
        };
        let mut buf = [0u8; MAX_COMMAND_LEN];
        let len = cmd.write(&mut buf);
        self.write_command(&buf[..len]).await?;
        self.transport.flush().await.map_err(Error::from_io)?;

        self.ssl.mode = SslMode::Opening;
        self.ssl.socket = Some(socket);
        self.ssl.backlog.clear();
        self.ssl.held.clear();

        let timeout = Duration::from_millis(OpenSslSocket::MAX_TIMEOUT_MS as u64);
        if let Err(e) = self
            .ingress
            .read_until(&mut self.transport, timeout, C::POLL_INTERVAL, open_terminal)
            .await
        {
            self.ssl.finish();
            return Err(e);
        }

        let outcome = open_outcome(&mut self.digester, self.ingress.frame());
        debug!("<< {:?} {:?}", LossyStr(self.ingress.frame()), outcome);

        if outcome != Outcome::Connect {
            warn!("SSL open of {}:{} failed: {:?}", host, port, outcome);
            self.ssl.finish();
            self.ssl.last_error = outcome.code();
            return Err(Error::Command(outcome));
        }

        self.ssl.mode = SslMode::Transparent;
        self.ssl.peer = Some((peer, port));
        self.ssl.last_error = None;
        info!("SSL socket {} connected to {}:{}", socket.get(), host, port);
        Ok(())
    }

    /// Write raw bytes to the peer.
    pub async fn send_data(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.ssl.mode != SslMode::Transparent {
            return Err(Error::InvalidState);
        }
        self.write_all(data).await?;
        self.transport.flush().await.map_err(Error::from_io)
    }

    /// Read whatever the peer sent so far into `buf`, without waiting.
    ///
    /// Data kept back while leaving the bridge comes first. In transparent
    /// mode bytes are copied off the line; if the modem reports `NO CARRIER`
    /// the session is closed and only the bytes before the marker are
    /// returned. With the socket back in command mode, the data is fetched
    /// with `AT+QSSLRECV`.
    pub async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        match self.ssl.mode {
            SslMode::Transparent => {
                self.pump(buf.len()).await?;
            }
            SslMode::Opening => return Err(Error::Busy),
            _ if !self.ssl.backlog.is_empty() => {}
            SslMode::Closing => return self.receive_buffered(buf).await,
            SslMode::EscapeUnconfirmed => return Err(Error::Busy),
            SslMode::Closed => return Err(Error::InvalidState),
        }
        Ok(self.ssl.drain_backlog(buf))
    }

    /// Move bytes waiting on the bridge into the backlog until it holds
    /// `want` bytes or the line is empty. Returns `true` if the peer hung up.
    async fn pump(&mut self, want: usize) -> Result<bool, Error> {
        while self.ssl.backlog.len() < want
            && self.ssl.has_room()
            && self.transport.read_ready().map_err(Error::from_io)?
        {
            let mut byte = [0u8; 1];
            if self.transport.read(&mut byte).await.map_err(Error::from_io)? == 0 {
                break;
            }
            let now = self.transport.now();
            if self.ssl.watch(byte[0], now) {
                warn!("SSL peer closed the connection");
                self.ssl.finish();
                return Ok(true);
            }
        }

        if !self.ssl.held.is_empty() && !self.transport.read_ready().map_err(Error::from_io)? {
            let quiet = self
                .transport
                .now()
                .checked_duration_since(self.ssl.held_at)
                .map_or(false, |quiet| quiet >= C::CARRIER_HOLD_TIME);
            if quiet {
                self.ssl.release_held();
            }
        }
        Ok(false)
    }

    async fn receive_buffered(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let Some(socket) = self.ssl.socket else {
            return Err(Error::InvalidState);
        };
        if buf.is_empty() {
            return Ok(0);
        }

        let length = buf.len().min(MAX_RECV_LEN) as u16;
        let received = self.send(&ReadSslData { socket, length }).await?;
        let n = received.data.len();
        if n > buf.len() {
            return Err(Error::Overflow);
        }
        buf[..n].copy_from_slice(&received.data);
        Ok(n)
    }

    /// Whether the peer has sent data that was not read yet.
    pub async fn has_data(&mut self) -> Result<bool, Error> {
        if !self.ssl.backlog.is_empty() {
            return Ok(true);
        }
        match self.ssl.mode {
            SslMode::Transparent => Ok(!self.ssl.held.is_empty()
                || self.transport.read_ready().map_err(Error::from_io)?),
            SslMode::Closing => Ok(self.receive_buffer_status().await?.unread > 0),
            SslMode::Opening | SslMode::EscapeUnconfirmed => Err(Error::Busy),
            SslMode::Closed => Ok(false),
        }
    }

    /// Receive buffer counters of the open socket, in command mode only.
    pub async fn receive_buffer_status(&mut self) -> Result<SslBufferStatus, Error> {
        let Some(socket) = self.ssl.socket else {
            return Err(Error::InvalidState);
        };
        self.send(&GetSslBufferStatus::new(socket)).await
    }

    /// Result code of the last TCP/IP or SSL operation.
    pub async fn last_ssl_error(&mut self) -> Result<LastError, Error> {
        let err = self.send(&GetLastError).await?;
        if err.code != 0 {
            self.ssl.last_error = Some(err.code);
        }
        Ok(err)
    }

    /// Leave transparent mode with the `+++` escape sequence.
    ///
    /// Data still waiting on the bridge is moved to the backlog first. The
    /// sequence is only recognized with `ESCAPE_GUARD_TIME` of silence before
    /// and after it:
    ///
    /// - bytes during the leading guard mean the peer is still talking; the
    ///   escape is not sent and [`Error::Busy`] is returned.
    /// - bytes during the trailing guard void the escape.
    /// - afterwards only a standalone `OK` line confirms it. Anything else
    ///   is kept as data, the session becomes
    ///   [`SslMode::EscapeUnconfirmed`] and [`Error::EscapeUnconfirmed`] is
    ///   returned.
    ///
    /// A `NO CARRIER` at any point closes the session and counts as success.
    pub async fn exit_transparent(&mut self) -> Result<(), Error> {
        match self.ssl.mode {
            SslMode::Transparent | SslMode::EscapeUnconfirmed => {}
            SslMode::Closing => return Ok(()),
            SslMode::Closed | SslMode::Opening => return Err(Error::InvalidState),
        }

        if self.absorb().await? {
            return Ok(());
        }

        self.transport.delay(C::ESCAPE_GUARD_TIME).await;
        if self.transport.read_ready().map_err(Error::from_io)? {
            if self.absorb().await? {
                return Ok(());
            }
            warn!("Peer data during the escape guard, staying in transparent mode");
            return Err(Error::Busy);
        }
        self.ssl.release_held();

        debug!(">> {:?}", LossyStr(ESCAPE));
        self.write_all(ESCAPE).await?;
        self.transport.flush().await.map_err(Error::from_io)?;
        self.transport.delay(C::ESCAPE_GUARD_TIME).await;

        if self.transport.read_ready().map_err(Error::from_io)? {
            let lost = match self.absorb().await {
                Ok(lost) => lost,
                Err(Error::Busy) => false,
                Err(e) => return Err(e),
            };
            if lost {
                return Ok(());
            }
            self.ssl.release_held();
            warn!("Data during the trailing escape guard");
            self.ssl.mode = SslMode::EscapeUnconfirmed;
            return Err(Error::EscapeUnconfirmed);
        }

        self.ingress.clear();
        self.ingress
            .read_until(
                &mut self.transport,
                C::ESCAPE_CONFIRM_TIMEOUT,
                C::POLL_INTERVAL,
                |frame| frame.ends_with(digest::OK) || frame.ends_with(CARRIER_LOST),
            )
            .await?;
        let frame = self.ingress.frame();
        debug!("<< {:?}", LossyStr(frame));

        if frame == ESCAPE_CONFIRMED {
            self.ssl.mode = SslMode::Closing;
            debug!("Left transparent mode");
            return Ok(());
        }

        let (data, lost) = match find(frame, CARRIER_LOST) {
            Some(pos) => (&frame[..pos], true),
            None => (frame, false),
        };
        for byte in data {
            self.ssl.stash(*byte);
        }

        if lost {
            warn!("SSL peer closed the connection");
            self.ssl.finish();
            return Ok(());
        }

        warn!("Escape from transparent mode not confirmed");
        self.ssl.mode = SslMode::EscapeUnconfirmed;
        Err(Error::EscapeUnconfirmed)
    }

    /// Take everything waiting on the bridge into the backlog. Returns `true`
    /// if the peer hung up, and [`Error::Busy`] if the backlog filled up
    /// with more data on the line.
    async fn absorb(&mut self) -> Result<bool, Error> {
        if self.pump(BACKLOG_LEN).await? {
            return Ok(true);
        }
        if self.transport.read_ready().map_err(Error::from_io)? {
            warn!("SSL backlog full, can not leave transparent mode");
            return Err(Error::Busy);
        }
        Ok(false)
    }

    /// Close `socket`, leaving transparent mode first if it holds the bridge.
    ///
    /// The close command is sent even if the escape was not confirmed, but
    /// not while the peer keeps the line busy. Disconnecting a closed session
    /// does nothing.
    pub async fn disconnect(&mut self, socket: u8) -> Result<(), Error> {
        let socket = SocketId::new(socket)?;
        if self.ssl.mode == SslMode::Closed {
            return Ok(());
        }
        if self.ssl.socket != Some(socket) {
            return Err(Error::InvalidArgument);
        }

        if matches!(
            self.ssl.mode,
            SslMode::Transparent | SslMode::EscapeUnconfirmed
        ) {
            match self.exit_transparent().await {
                Err(Error::Busy) => return Err(Error::Busy),
                Err(e) => warn!("Closing socket {} anyway: {:?}", socket.get(), e),
                Ok(()) => {}
            }
            if self.ssl.mode == SslMode::Closed {
                info!("SSL socket {} closed by the peer", socket.get());
                return Ok(());
            }
        }

        // Sent regardless of the session state, so it bypasses the busy check.
        let outcome = self.dispatch_cmd(&CloseSslSocket { socket }).await?;
        if !outcome.is_success() {
            error!("SSL close of socket {} failed: {:?}", socket.get(), outcome);
            return Err(Error::Command(outcome));
        }

        self.ssl.finish();
        info!("SSL socket {} closed", socket.get());
        Ok(())
    }
}
