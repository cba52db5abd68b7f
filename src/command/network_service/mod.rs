//! Network service Commands
pub mod responses;
pub mod types;

use atat::atat_derive::AtatCmd;
use responses::*;

/// Signal quality +CSQ
///
/// Returns the received signal strength indication <rssi> and the channel
/// bit error rate <ber>.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CSQ", SignalQuality)]
pub struct GetSignalQuality;

/// Network registration status +CREG
///
/// Shows whether the MT is currently registered to the circuit switched
/// network, and how.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CREG?", NetworkRegistrationStatus)]
pub struct GetNetworkRegistrationStatus;

#[cfg(test)]
mod tests {
    use super::types::RegistrationStatus;
    use super::*;
    use crate::command::text;
    use atat::serde_at::from_slice;

    #[test]
    fn signal_quality() {
        assert_eq!(text(&GetSignalQuality), "AT+CSQ\r\n");
        let res: SignalQuality = from_slice(b"+CSQ: 24,99").unwrap();
        assert_eq!(res, SignalQuality { rssi: 24, ber: 99 });
        assert_eq!(res.dbm(), Some(-65));
        assert_eq!(SignalQuality { rssi: 99, ber: 99 }.dbm(), None);
    }

    #[test]
    fn signal_quality_missing_field() {
        assert!(from_slice::<SignalQuality>(b"+CSQ: 24").is_err());
    }

    #[test]
    fn registration() {
        assert_eq!(text(&GetNetworkRegistrationStatus), "AT+CREG?\r\n");
        let res: NetworkRegistrationStatus = from_slice(b"+CREG: 0,5").unwrap();
        assert_eq!(res.stat, RegistrationStatus::Roaming);
        assert!(res.stat.is_registered());
        assert_eq!(res.lac, None);

        let res: NetworkRegistrationStatus =
            from_slice(b"+CREG: 2,2,\"1A2B\",\"01C3D4E5\",7").unwrap();
        assert_eq!(res.n, 2);
        assert_eq!(res.stat, RegistrationStatus::Searching);
        assert!(!res.stat.is_registered());
        assert_eq!(res.lac.as_deref(), Some("1A2B"));
        assert_eq!(res.act, Some(7));
    }
}
