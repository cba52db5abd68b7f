//! Mobile equipment control and status Commands
pub mod types;

use atat::atat_derive::AtatCmd;
use types::*;

use super::NoResponse;

/// Set UE functionality +CFUN
///
/// Selects the level of functionality <fun> in the MT. With <rst> = 1 the
/// module restarts before changing functionality, which is how a full reset
/// is requested.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CFUN", NoResponse, timeout_ms = 15000)]
pub struct SetModuleFunctionality {
    #[at_arg(position = 0)]
    pub fun: Functionality,
    #[at_arg(position = 1)]
    pub rst: Option<ResetMode>,
}

/// Report mobile termination error +CMEE
///
/// Configures the formatting of the result code +CME ERROR: <err>. When
/// enabled, MT related errors cause +CME ERROR: <err> final result code
/// instead of the regular ERROR final result code.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMEE", NoResponse)]
pub struct SetReportMobileTerminationError {
    #[at_arg(position = 0)]
    pub n: TerminationErrorMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::text;
    use atat::AtatCmd;

    #[test]
    fn reset() {
        let cmd = SetModuleFunctionality {
            fun: Functionality::Full,
            rst: Some(ResetMode::Reset),
        };
        assert_eq!(text(&cmd), "AT+CFUN=1,1\r\n");
        assert_eq!(SetModuleFunctionality::MAX_TIMEOUT_MS, 15_000);
    }

    #[test]
    fn functionality_without_reset() {
        let cmd = SetModuleFunctionality {
            fun: Functionality::Minimum,
            rst: None,
        };
        assert_eq!(text(&cmd), "AT+CFUN=0\r\n");
    }

    #[test]
    fn numeric_errors() {
        let cmd = SetReportMobileTerminationError {
            n: TerminationErrorMode::Enabled,
        };
        assert_eq!(text(&cmd), "AT+CMEE=1\r\n");
    }
}
