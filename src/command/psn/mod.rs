//! Packet Switched Data Services Commands
//!
//! The EC200U carries its TCP/IP and SSL stacks on top of a PDP context,
//! which has to be active before any SSL socket can be opened.
pub mod types;

use atat::atat_derive::AtatCmd;
use types::ContextId;

use super::NoResponse;

/// Activate a PDP context +QIACT
///
/// Blocks until the context is active or the network rejects it, which can
/// take up to 150 seconds on a poorly covered cell.
#[derive(Clone, AtatCmd)]
#[at_cmd("+QIACT", NoResponse, timeout_ms = 150000)]
pub struct ActivatePdpContext {
    #[at_arg(position = 0)]
    pub cid: ContextId,
}
