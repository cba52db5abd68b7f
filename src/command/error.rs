//! Lookup tables for the numeric codes carried by `+CME ERROR: <code>`.
//!
//! Mobile equipment errors (including the GNSS range 501-517) and SSL stack
//! errors (550-579) share one namespace on the EC200U. The framing layer
//! forwards codes untouched; these tables only give them a name.

use core::fmt;
use core::str::FromStr;

macro_rules! code_table {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident = $code:literal => $desc:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub enum $name {
            $( $variant, )*
        }

        impl $name {
            pub const fn code(&self) -> i32 {
                match self {
                    $( Self::$variant => $code, )*
                }
            }

            pub const fn description(&self) -> &'static str {
                match self {
                    $( Self::$variant => $desc, )*
                }
            }

            pub const fn from_code(code: i32) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )*
                    _ => None,
                }
            }
        }

        impl FromStr for $name {
            type Err = ();

            /// Accepts the numeric code as well as the verbose text form.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if let Ok(code) = s.parse::<i32>() {
                    return Self::from_code(code).ok_or(());
                }
                match s {
                    $( $desc => Ok(Self::$variant), )*
                    _ => Err(()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.description())
            }
        }
    };
}

code_table! {
    /// Mobile termination error result codes +CME ERROR
    pub enum CmeError {
        PhoneFailure = 0 => "Phone failure",
        NoConnectionToPhone = 1 => "No connection to phone",
        PhoneAdaptorLinkReserved = 2 => "Phone-adaptor link reserved",
        OperationNotAllowed = 3 => "Operation not allowed",
        OperationNotSupported = 4 => "Operation not supported",
        PhSimPinRequired = 5 => "PH-SIM PIN required",
        SimNotInserted = 10 => "SIM not inserted",
        SimPinRequired = 11 => "SIM PIN required",
        SimPukRequired = 12 => "SIM PUK required",
        SimFailure = 13 => "SIM failure",
        SimBusy = 14 => "SIM busy",
        SimWrong = 15 => "SIM wrong",
        IncorrectPassword = 16 => "Incorrect password",
        MemoryFull = 20 => "Memory full",
        InvalidIndex = 21 => "Invalid index",
        NotFound = 22 => "Not found",

        // GNSS
        InvalidParameters = 501 => "Invalid parameters",
        GnssOperationNotSupported = 502 => "GNSS operation not supported",
        GnssSubsystemBusy = 503 => "GNSS subsystem busy",
        SessionOngoing = 504 => "GNSS session is ongoing",
        SessionNotActive = 505 => "GNSS session not active",
        OperationTimeout = 506 => "Operation timeout",
        FunctionNotEnabled = 507 => "Function not enabled",
        TimeInformationError = 508 => "Time information error",
        ValidityTimeOutOfRange = 512 => "Validity time is out of range",
        InternalResourceError = 513 => "Internal resource error",
        GnssLocked = 514 => "GNSS locked",
        EndByE911 = 515 => "End by E911",
        NotFixedNow = 516 => "GNSS not fixed now",
        CmuxPortNotOpened = 517 => "CMUX port is not opened",
    }
}

code_table! {
    /// SSL stack error codes, reported through +CME ERROR, `+QSSLOPEN` and
    /// `AT+QIGETERROR`
    pub enum SslError {
        UnknownError = 550 => "SSL unknown error",
        OperationBlocked = 551 => "SSL operation blocked",
        InvalidParameter = 552 => "SSL invalid parameter",
        MemoryNotEnough = 553 => "SSL memory not enough",
        CreateSocketFailed = 554 => "SSL create socket failed",
        OperationNotSupported = 555 => "SSL operation not supported",
        SocketBindFailed = 556 => "SSL socket bind failed",
        SocketListenFailed = 557 => "SSL socket listen failed",
        SocketWriteFailed = 558 => "SSL socket write failed",
        SocketReadFailed = 559 => "SSL socket read failed",
        SocketAcceptFailed = 560 => "SSL socket accept failed",
        OpenPdpContextFailed = 561 => "SSL open PDP context failed",
        ClosePdpContextFailed = 562 => "SSL close PDP context failed",
        SocketIdentityUsed = 563 => "SSL socket identity has been used",
        DnsBusy = 564 => "SSL DNS busy",
        DnsParseFailed = 565 => "SSL DNS parse failed",
        SocketConnectFailed = 566 => "SSL connection failed",
        SocketClosed = 567 => "SSL socket closed",
        OperationBusy = 568 => "SSL operation busy",
        OperationTimeout = 569 => "SSL operation timeout",
        PdpContextBroken = 570 => "SSL PDP context broken",
        CancelSend = 571 => "SSL cancel send",
        OperationNotAllowed = 572 => "SSL operation not allowed",
        ApnNotConfigured = 573 => "SSL APN not configured",
        PortBusy = 574 => "SSL port busy",
        HandshakeFailed = 579 => "SSL handshake failed",
    }
}

/// A coded error resolved against both tables by exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    Cme(CmeError),
    Ssl(SslError),
    Unknown(i32),
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        match self {
            Self::Cme(e) => e.code(),
            Self::Ssl(e) => e.code(),
            Self::Unknown(code) => *code,
        }
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        if let Some(e) = CmeError::from_code(code) {
            Self::Cme(e)
        } else if let Some(e) = SslError::from_code(code) {
            Self::Ssl(e)
        } else {
            Self::Unknown(code)
        }
    }
}

impl FromStr for ErrorCode {
    type Err = ();

    /// Parses a full `+CME ERROR: <err>` line, numeric or verbose.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = s.trim().strip_prefix("+CME ERROR:").ok_or(())?.trim();
        if let Ok(code) = err.parse::<i32>() {
            return Ok(Self::from(code));
        }
        err.parse::<CmeError>()
            .map(Self::Cme)
            .or_else(|_| err.parse::<SslError>().map(Self::Ssl))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cme(e) => fmt::Display::fmt(e, f),
            Self::Ssl(e) => fmt::Display::fmt(e, f),
            Self::Unknown(code) => write!(f, "Unknown error {}", code),
        }
    }
}
