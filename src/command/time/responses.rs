//! Responses for clock and network time Commands
use atat::atat_derive::AtatResp;
use heapless::String;

/// `+QLTS: "<time>"`, empty until the network provided the time
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
pub struct NetworkTime {
    #[at_arg(position = 0)]
    pub time: String<32>,
}

/// `+CCLK: "<time>"`
#[derive(Debug, Clone, PartialEq, Eq, AtatResp)]
pub struct Clock {
    #[at_arg(position = 0)]
    pub time: String<24>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use atat::serde_at::from_slice;

    #[test]
    fn network_time() {
        let t: NetworkTime = from_slice(b"+QLTS: \"2024/11/26,14:30:00+32,0\"").unwrap();
        assert_eq!(t.time.as_str(), "2024/11/26,14:30:00+32,0");

        let t: NetworkTime = from_slice(b"+QLTS: \"\"").unwrap();
        assert!(t.time.is_empty());
    }

    #[test]
    fn clock() {
        let t: Clock = from_slice(b"+CCLK: \"24/11/26,14:30:00+32\"").unwrap();
        assert_eq!(t.time.as_str(), "24/11/26,14:30:00+32");
    }
}
