use core::marker::PhantomData;

use atat::{AtatCmd, DigestResult, Digester};
use embassy_time::Duration;

use crate::command::{
    general::{responses::Imei, types::EchoMode, GetIMEI, SetEcho},
    mobile_control::{
        types::{Functionality, ResetMode, TerminationErrorMode},
        SetModuleFunctionality, SetReportMobileTerminationError,
    },
    network_service::{
        responses::{NetworkRegistrationStatus, SignalQuality},
        GetNetworkRegistrationStatus, GetSignalQuality,
    },
    AT, MAX_COMMAND_LEN,
};
use crate::config::{DefaultConfig, ModemConfig};
use crate::digest::{Ec200uDigester, Outcome};
use crate::error::Error;
use crate::gnss::GnssState;
use crate::helpers::{utf8_prefix, LossyStr};
use crate::ingress::Ingress;
use crate::ssl::{SslMode, SslSession};
use crate::traits::Transport;

/// Classified reply to a raw command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    pub outcome: Outcome,
    /// Everything received for the command, including echo and final result
    /// code. On timeout this holds whatever arrived before the deadline.
    pub frame: &'a [u8],
}

impl<'a> Response<'a> {
    /// The frame as text, up to the first byte that is not valid UTF-8.
    pub fn text(&self) -> &'a str {
        utf8_prefix(self.frame)
    }
}

/// Driver for one EC200U on one serial line.
///
/// All operations take `&mut self`: at most one command is in flight at any
/// time, and while an SSL socket owns the line in transparent mode, AT
/// commands are refused with [`Error::Busy`].
pub struct Client<T: Transport, C: ModemConfig = DefaultConfig> {
    pub(crate) transport: T,
    pub(crate) ingress: Ingress,
    pub(crate) digester: Ec200uDigester,
    pub(crate) ssl: SslSession,
    pub(crate) gnss: GnssState,
    _config: PhantomData<C>,
}

impl<T, C> Client<T, C>
where
    T: Transport,
    C: ModemConfig,
{
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            ingress: Ingress::new(),
            digester: Ec200uDigester::new(),
            ssl: SslSession::new(),
            gnss: GnssState::NotStarted,
            _config: PhantomData,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn release(self) -> T {
        self.transport
    }

    /// Check the modem answers, turn off command echo and enable numeric
    /// `+CME ERROR` result codes.
    pub async fn init(&mut self) -> Result<(), Error> {
        self.ping().await?;
        self.send(&SetEcho {
            enabled: EchoMode::Off,
        })
        .await?;
        self.send(&SetReportMobileTerminationError {
            n: TerminationErrorMode::Enabled,
        })
        .await?;
        info!("Modem initialized");
        Ok(())
    }

    /// Send a bare `AT` until the modem answers `OK`, up to
    /// `C::PING_ATTEMPTS` times.
    pub async fn ping(&mut self) -> Result<(), Error> {
        let mut last = Outcome::Timeout;
        for attempt in 1..=C::PING_ATTEMPTS {
            match self.send(&AT).await {
                Ok(_) => return Ok(()),
                Err(Error::Command(outcome)) => {
                    debug!("AT {}/{}: {:?}", attempt, C::PING_ATTEMPTS, outcome);
                    last = outcome;
                }
                Err(e) => return Err(e),
            }
            if attempt < C::PING_ATTEMPTS {
                self.transport.delay(C::PING_INTERVAL).await;
            }
        }
        warn!("Modem not responding to AT");
        Err(Error::Command(last))
    }

    /// Full functionality with a module restart, `AT+CFUN=1,1`.
    pub async fn reset(&mut self) -> Result<(), Error> {
        self.send(&SetModuleFunctionality {
            fun: Functionality::Full,
            rst: Some(ResetMode::Reset),
        })
        .await?;
        self.ssl = SslSession::new();
        self.gnss = GnssState::NotStarted;
        Ok(())
    }

    pub async fn signal_quality(&mut self) -> Result<SignalQuality, Error> {
        self.send(&GetSignalQuality).await
    }

    pub async fn imei(&mut self) -> Result<Imei, Error> {
        self.send(&GetIMEI).await
    }

    pub async fn network_registration(&mut self) -> Result<NetworkRegistrationStatus, Error> {
        self.send(&GetNetworkRegistrationStatus).await
    }

    /// Send a raw command line and classify the reply.
    ///
    /// Non-success outcomes, including [`Outcome::Timeout`], are returned in
    /// the [`Response`]; only transport failures and a busy line are errors.
    /// This is useful for commands the driver does not wrap, but might break
    /// the session state if the command interferes with it.
    pub async fn execute(&mut self, command: &str, timeout: Duration) -> Result<Response<'_>, Error> {
        self.ensure_command_mode()?;
        self.write_command(command.as_bytes()).await?;
        self.write_all(b"\r\n").await?;
        self.transport.flush().await.map_err(Error::from_io)?;
        let outcome = self.read_reply(timeout).await?;
        Ok(Response {
            outcome,
            frame: self.ingress.frame(),
        })
    }

    /// Send a typed command, mapping anything but `OK` to
    /// [`Error::Command`] and parsing the information text into the
    /// command's response.
    pub async fn send<Cmd: AtatCmd>(&mut self, cmd: &Cmd) -> Result<Cmd::Response, Error> {
        self.ensure_command_mode()?;
        self.dispatch_cmd(cmd).await?;
        match self.digester.digest(self.ingress.frame()) {
            (DigestResult::Response(Ok(body)), _) => cmd.parse(Ok(body)).map_err(|e| {
                warn!("Failed to parse {:?}", LossyStr(body));
                Error::from(e)
            }),
            (other, _) => Err(Error::Command(Outcome::from(&other))),
        }
    }

    /// Write `cmd` and wait for its reply, within the command's own
    /// deadline.
    pub(crate) async fn dispatch_cmd<Cmd: AtatCmd>(&mut self, cmd: &Cmd) -> Result<Outcome, Error> {
        if Cmd::MAX_LEN > MAX_COMMAND_LEN {
            return Err(Error::Overflow);
        }
        let mut buf = [0u8; MAX_COMMAND_LEN];
        let len = cmd.write(&mut buf);
        self.write_command(&buf[..len]).await?;
        self.transport.flush().await.map_err(Error::from_io)?;
        self.read_reply(Duration::from_millis(Cmd::MAX_TIMEOUT_MS as u64))
            .await
    }

    fn ensure_command_mode(&self) -> Result<(), Error> {
        match self.ssl.mode {
            SslMode::Opening | SslMode::Transparent | SslMode::EscapeUnconfirmed => {
                Err(Error::Busy)
            }
            SslMode::Closed | SslMode::Closing => Ok(()),
        }
    }

    /// Accumulate the reply to the command just written until the digester
    /// sees a final result code or `timeout` passes.
    async fn read_reply(&mut self, timeout: Duration) -> Result<Outcome, Error> {
        let digester = &mut self.digester;
        self.ingress
            .read_until(&mut self.transport, timeout, C::POLL_INTERVAL, |frame| {
                digester.digest(frame).1 > 0
            })
            .await?;

        let outcome = Outcome::from(&self.digester.digest(self.ingress.frame()).0);
        debug!("<< {:?} {:?}", LossyStr(self.ingress.frame()), outcome);
        Ok(outcome)
    }

    /// Clear the frame and any unread input, then write `command` as given.
    pub(crate) async fn write_command(&mut self, command: &[u8]) -> Result<(), Error> {
        self.ingress.clear();
        let stale = self.ingress.drain(&mut self.transport).await?;
        if stale > 0 {
            debug!("Discarded {} stale bytes", stale);
        }

        debug!(">> {:?}", LossyStr(command));
        self.write_all(command).await
    }

    pub(crate) async fn write_all(&mut self, data: &[u8]) -> Result<(), Error> {
        self.transport.write_all(data).await.map_err(Error::from_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{block_on, client, MockTransport};

    #[test]
    fn echo_and_ok() {
        let mut transport = MockTransport::new();
        transport.expect("AT", b"AT\r\n\r\nOK\r\n");
        let mut modem = client(transport);

        let res = block_on(modem.execute("AT", Duration::from_secs(1))).unwrap();

        assert_eq!(res.outcome, Outcome::Success);
        assert_eq!(res.text(), "AT\r\n\r\nOK\r\n");
    }

    #[test]
    fn coded_error() {
        let mut transport = MockTransport::new();
        transport.expect("AT+QGPSLOC=2", b"\r\n+CME ERROR: 516\r\n");
        let mut modem = client(transport);

        let res = block_on(modem.execute("AT+QGPSLOC=2", Duration::from_secs(1))).unwrap();

        assert_eq!(res.outcome, Outcome::CodedError(516));
    }

    #[test]
    fn stale_bytes_never_leak_into_the_next_command() {
        let mut transport = MockTransport::new();
        transport
            .expect("AT+CSQ", b"\r\n+CSQ: 20,99\r\n\r\nOK\r\n")
            .expect("AT+QGPSEND", b"\r\n+CME ERROR: 505\r\n");
        let mut modem = client(transport);

        block_on(modem.execute("AT+CSQ", Duration::from_secs(1))).unwrap();
        // A late duplicate from the first exchange.
        modem.transport.inject(b"\r\nOK\r\n");
        let res = block_on(modem.execute("AT+QGPSEND", Duration::from_secs(1))).unwrap();

        assert_eq!(res.outcome, Outcome::CodedError(505));
        // The frame ends as soon as the coded line is terminated.
        assert_eq!(res.text(), "\r\n+CME ERROR: 505\r");
    }

    #[test]
    fn timeout_keeps_partial_frame() {
        let mut transport = MockTransport::new();
        transport.expect("AT+QGPSLOC=2", b"\r\n+QGPSLOC: 1234");
        let mut modem = client(transport);

        let res = block_on(modem.execute("AT+QGPSLOC=2", Duration::from_millis(300))).unwrap();

        assert_eq!(res.outcome, Outcome::Timeout);
        assert_eq!(res.frame, b"\r\n+QGPSLOC: 1234");
        assert!(modem.transport.now_ms() >= 300);
    }

    #[test]
    fn silent_modem_times_out() {
        let mut modem = client(MockTransport::new());

        let res = block_on(modem.execute("AT", Duration::from_millis(50))).unwrap();

        assert_eq!(res.outcome, Outcome::Timeout);
        assert!(res.frame.is_empty());
    }

    #[test]
    fn command_line_is_terminated() {
        let mut transport = MockTransport::new();
        transport.expect("AT+CSQ", b"\r\n+CSQ: 20,99\r\n\r\nOK\r\n");
        let mut modem = client(transport);

        let sq = block_on(modem.signal_quality()).unwrap();

        assert_eq!(sq.rssi, 20);
        assert_eq!(modem.transport.written(), b"AT+CSQ\r\n");
    }

    #[test]
    fn send_maps_failures() {
        let mut transport = MockTransport::new();
        transport.expect("AT+CSQ", b"\r\nERROR\r\n");
        let mut modem = client(transport);

        assert_eq!(
            block_on(modem.signal_quality()),
            Err(Error::Command(Outcome::GenericError))
        );
    }

    #[test]
    fn ping_retries() {
        let mut transport = MockTransport::new();
        transport
            .expect("AT", b"\r\nERROR\r\n")
            .expect("AT", b"\r\nOK\r\n");
        let mut modem = client(transport);

        block_on(modem.ping()).unwrap();

        assert_eq!(modem.transport.commands().len(), 2);
        assert!(modem.transport.now_ms() >= 500);
    }

    #[test]
    fn ping_gives_up() {
        let mut modem = client(MockTransport::new());

        assert_eq!(
            block_on(modem.ping()),
            Err(Error::Command(Outcome::Timeout))
        );
        assert_eq!(modem.transport.commands().len(), 3);
    }

    #[test]
    fn init() {
        let mut transport = MockTransport::new();
        transport
            .expect("AT", b"AT\r\n\r\nOK\r\n")
            .expect("ATE0", b"ATE0\r\n\r\nOK\r\n")
            .expect("AT+CMEE=1", b"\r\nOK\r\n");
        let mut modem = client(transport);

        block_on(modem.init()).unwrap();

        assert!(modem.transport.script_done());
    }

    #[test]
    fn identity_and_registration() {
        let mut transport = MockTransport::new();
        transport
            .expect("AT+GSN", b"\r\n864475040123456\r\n\r\nOK\r\n")
            .expect("AT+CREG?", b"\r\n+CREG: 0,1\r\n\r\nOK\r\n")
            .expect("AT+CFUN=1,1", b"\r\nOK\r\n");
        let mut modem = client(transport);

        let imei = block_on(modem.imei()).unwrap();
        assert_eq!(imei.imei, 864475040123456);
        let reg = block_on(modem.network_registration()).unwrap();
        assert!(reg.stat.is_registered());
        block_on(modem.reset()).unwrap();
    }
}
