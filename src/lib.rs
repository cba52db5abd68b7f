#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod client;
pub mod command;
pub mod config;
pub mod digest;
pub mod error;
pub mod gnss;
mod helpers;
pub mod http;
mod ingress;
pub mod ssl;
pub mod time;
pub mod traits;

#[cfg(test)]
mod test_helpers;

pub use client::{Client, Response};
pub use config::{DefaultConfig, ModemConfig};
pub use digest::{Ec200uDigester, Outcome};
pub use error::Error;
pub use gnss::{GnssState, PositionFix};
pub use helpers::LossyStr;
pub use http::HttpResponse;
pub use ingress::INGRESS_BUF_SIZE;
pub use ssl::SslMode;
pub use time::ModemTime;
pub use traits::{TimedTransport, Transport};
