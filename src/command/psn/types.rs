use atat::atat_derive::AtatLen;
use serde::{Deserialize, Serialize};

/// PDP context identifier, 1-15
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AtatLen)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContextId(pub u8);
