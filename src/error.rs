use crate::digest::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The underlying serial transport reported an I/O error
    Transport(embedded_io::ErrorKind),
    /// A fixed-capacity buffer (ingress frame, command line, payload) was full
    Overflow,

    /// The modem answered with something other than the expected final
    /// result code
    Command(Outcome),
    /// The modem answered successfully, but the payload could not be decoded
    Parse,

    InvalidArgument,
    /// The operation is not valid in the current session state
    InvalidState,
    /// The serial line is bridged to an SSL socket in transparent mode and
    /// can not carry AT commands
    Busy,

    /// All GNSS location attempts were used up without a fix
    NoFix { last: Option<Outcome> },
    /// The escape sequence was sent, but the modem never confirmed leaving
    /// transparent mode. The data bridge may or may not still be active.
    EscapeUnconfirmed,
}

impl Error {
    pub(crate) fn from_io<E: embedded_io::Error>(e: E) -> Self {
        Self::Transport(e.kind())
    }

    /// The coded error attached to this error, if the modem reported one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Command(outcome) | Self::NoFix { last: Some(outcome) } => outcome.code(),
            _ => None,
        }
    }
}

impl From<Outcome> for Error {
    fn from(outcome: Outcome) -> Self {
        Self::Command(outcome)
    }
}

impl From<atat::Error> for Error {
    fn from(e: atat::Error) -> Self {
        match e {
            atat::Error::Error => Self::Command(Outcome::GenericError),
            atat::Error::Timeout => Self::Command(Outcome::Timeout),
            _ => Self::Parse,
        }
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::Overflow
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(kind) => write!(f, "transport error: {:?}", kind),
            Self::Overflow => f.write_str("buffer overflow"),
            Self::Command(outcome) => write!(f, "command failed: {}", outcome),
            Self::Parse => f.write_str("malformed response"),
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::InvalidState => f.write_str("invalid session state"),
            Self::Busy => f.write_str("serial line busy in transparent mode"),
            Self::NoFix { last: Some(outcome) } => write!(f, "no GNSS fix ({})", outcome),
            Self::NoFix { last: None } => f.write_str("no GNSS fix"),
            Self::EscapeUnconfirmed => f.write_str("transparent mode exit unconfirmed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_exposed_for_coded_failures() {
        assert_eq!(Error::Command(Outcome::CodedError(516)).code(), Some(516));
        assert_eq!(
            Error::NoFix {
                last: Some(Outcome::CodedError(516))
            }
            .code(),
            Some(516)
        );
        assert_eq!(Error::Command(Outcome::GenericError).code(), None);
        assert_eq!(Error::Busy.code(), None);
    }

    #[test]
    fn response_errors() {
        assert_eq!(Error::from(atat::Error::Parse), Error::Parse);
        assert_eq!(Error::from(atat::Error::InvalidResponse), Error::Parse);
        assert_eq!(
            Error::from(atat::Error::Error),
            Error::Command(Outcome::GenericError)
        );
    }

    #[test]
    fn io_errors_keep_their_kind() {
        #[derive(Debug)]
        struct Broken;
        impl embedded_io::Error for Broken {
            fn kind(&self) -> embedded_io::ErrorKind {
                embedded_io::ErrorKind::BrokenPipe
            }
        }

        assert_eq!(
            Error::from_io(Broken),
            Error::Transport(embedded_io::ErrorKind::BrokenPipe)
        );
    }
}
