use embassy_time::Duration;

use crate::command::psn::types::ContextId;
use crate::command::ssl::types::SslContextId;

/// Compile-time tuning of the driver.
///
/// Every constant has a default matching the EC200U documentation, so an
/// application only overrides what it needs:
///
/// ```ignore
/// struct MyConfig;
///
/// impl ModemConfig for MyConfig {
///     const CONTEXT_ID: ContextId = ContextId(2);
/// }
/// ```
pub trait ModemConfig {
    /// How often [`crate::Client::ping`] sends a bare `AT` before giving up.
    const PING_ATTEMPTS: u8 = 3;
    const PING_INTERVAL: Duration = Duration::from_millis(500);
    /// Sleep between ingress polls while waiting for a terminal marker.
    const POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Silence required on the line before and after the `+++` escape.
    const ESCAPE_GUARD_TIME: Duration = Duration::from_secs(1);
    /// How long to wait for `OK` after the trailing guard period.
    const ESCAPE_CONFIRM_TIMEOUT: Duration = Duration::from_secs(2);
    /// How long a partial `NO CARRIER` line is held back from bridge reads
    /// once the line went quiet.
    const CARRIER_HOLD_TIME: Duration = Duration::from_millis(50);

    /// Delay after (re)starting the GNSS engine before querying it again.
    const GNSS_SETTLE_TIME: Duration = Duration::from_secs(2);

    const CONTEXT_ID: ContextId = ContextId(1);
    const SSL_CONTEXT_ID: SslContextId = SslContextId(1);

    const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
    const HTTP_POLL_INTERVAL: Duration = Duration::from_millis(100);
}

/// All defaults.
pub struct DefaultConfig;

impl ModemConfig for DefaultConfig {}
