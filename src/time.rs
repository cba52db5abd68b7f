//! Network time and real time clock.
//!
//! The module reports time in two fixed-width layouts:
//!
//! - network time, `AT+QLTS`: `YYYY/MM/DD,HH:MM:SS±QQ[,D]`
//! - real time clock, `AT+CCLK`: `YY/MM/DD,HH:MM:SS±QQ`
//!
//! `QQ` is the offset from GMT in quarters of an hour and `D` the daylight
//! saving adjustment in hours. Both decode into [`ModemTime`], which keeps
//! the text as reported; only the RTC layout is ever encoded.

use core::fmt::{self, Write};

use heapless::String;

use crate::client::Client;
use crate::command::time::{types::TimeQueryMode, GetClock, GetNetworkTime, SetClock};
use crate::config::ModemConfig;
use crate::error::Error;
use crate::traits::Transport;

const MIN_TZ_QUARTERS: i8 = -48;
const MAX_TZ_QUARTERS: i8 = 56;

/// Longest time text of either layout.
pub const MAX_TIME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Offset from GMT in quarters of an hour
    pub timezone_quarters: i8,
    /// Only reported by the network time query
    pub daylight_saving: Option<bool>,
    /// `+QLTS` or `+CCLK` text the fields were decoded from. Times built
    /// with [`ModemTime::new`] carry their RTC encoding.
    pub raw: String<MAX_TIME_LEN>,
}

impl ModemTime {
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        timezone_quarters: i8,
    ) -> Result<Self, Error> {
        let mut time = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            timezone_quarters,
            daylight_saving: None,
            raw: String::new(),
        };
        if !time.is_valid() {
            return Err(Error::InvalidArgument);
        }
        let mut raw = String::new();
        time.write_rtc(&mut raw)?;
        time.raw = raw;
        Ok(time)
    }

    /// Whole hours of the GMT offset, truncated towards zero.
    pub fn timezone_hours(&self) -> i8 {
        self.timezone_quarters / 4
    }

    pub fn utc_offset_minutes(&self) -> i16 {
        self.timezone_quarters as i16 * 15
    }

    /// Whether both denote the same wall clock time and offset, whatever
    /// layout they were read from.
    pub fn same_time(&self, other: &Self) -> bool {
        (
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.timezone_quarters,
        ) == (
            other.year,
            other.month,
            other.day,
            other.hour,
            other.minute,
            other.second,
            other.timezone_quarters,
        )
    }

    fn is_valid(&self) -> bool {
        (2000..=2099).contains(&self.year)
            && (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hour <= 23
            && self.minute <= 59
            && self.second <= 59
            && (MIN_TZ_QUARTERS..=MAX_TZ_QUARTERS).contains(&self.timezone_quarters)
    }

    /// Decode the `AT+QLTS` layout `YYYY/MM/DD,HH:MM:SS±QQ[,D]`.
    pub fn parse_network(s: &str) -> Result<Self, Error> {
        let (mut time, rest) = decode(s, 4)?;
        time.daylight_saving = match rest {
            "" => None,
            dst => match dst.strip_prefix(',').map(str::trim) {
                Some("0") => Some(false),
                Some(d) if d.parse::<u8>().is_ok() => Some(true),
                _ => return Err(Error::Parse),
            },
        };
        Ok(time)
    }

    /// Decode the `AT+CCLK?` layout `YY/MM/DD,HH:MM:SS±QQ`.
    pub fn parse_rtc(s: &str) -> Result<Self, Error> {
        let (time, rest) = decode(s, 2)?;
        if !rest.is_empty() {
            return Err(Error::Parse);
        }
        Ok(time)
    }

    /// Encode the `AT+CCLK=` layout `YY/MM/DD,HH:MM:SS±QQ`.
    pub fn write_rtc<W: Write>(&self, w: &mut W) -> fmt::Result {
        let sign = if self.timezone_quarters < 0 { '-' } else { '+' };
        write!(
            w,
            "{:02}/{:02}/{:02},{:02}:{:02}:{:02}{}{:02}",
            self.year % 100,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            sign,
            self.timezone_quarters.unsigned_abs()
        )
    }
}

/// Decode either layout, given the width of its year field. Returns the
/// time and whatever follows the timezone.
fn decode(s: &str, year_width: usize) -> Result<(ModemTime, &str), Error> {
    let s = s.trim();
    let b = s.as_bytes();
    let y = year_width;

    // YY(YY)/MM/DD,HH:MM:SS
    let seps = [(y, b'/'), (y + 3, b'/'), (y + 6, b','), (y + 9, b':'), (y + 12, b':')];
    if b.len() < y + 15 || seps.iter().any(|(i, c)| b[*i] != *c) {
        return Err(Error::Parse);
    }

    let num = |from: usize, len: usize| -> Result<u16, Error> {
        let digits = s.get(from..from + len).ok_or(Error::Parse)?;
        if !digits.bytes().all(|c| c.is_ascii_digit()) {
            return Err(Error::Parse);
        }
        digits.parse().map_err(|_| Error::Parse)
    };

    let year = match y {
        2 => 2000 + num(0, 2)?,
        _ => num(0, y)?,
    };
    let month = num(y + 1, 2)? as u8;
    let day = num(y + 4, 2)? as u8;
    let hour = num(y + 7, 2)? as u8;
    let minute = num(y + 10, 2)? as u8;
    let second = num(y + 13, 2)? as u8;

    // ±QQ, optional for the RTC layout
    let tail = &s[y + 15..];
    let (timezone_quarters, rest) = match tail.as_bytes().first() {
        Some(b'+') | Some(b'-') => {
            let end = tail.find(',').unwrap_or(tail.len());
            let tz = tail[..end].parse::<i8>().map_err(|_| Error::Parse)?;
            (tz, &tail[end..])
        }
        _ => (0, tail),
    };

    let time = ModemTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
        timezone_quarters,
        daylight_saving: None,
        raw: String::try_from(s).map_err(|_| Error::Parse)?,
    };
    if !time.is_valid() {
        return Err(Error::Parse);
    }

    Ok((time, rest))
}

impl<T, C> Client<T, C>
where
    T: Transport,
    C: ModemConfig,
{
    /// Time as last synchronized from the network, or `None` when the module
    /// has never been synchronized.
    pub async fn network_time(&mut self, mode: TimeQueryMode) -> Result<Option<ModemTime>, Error> {
        let reported = self.send(&GetNetworkTime { mode }).await?;
        match reported.time.as_str() {
            "" => Ok(None),
            text => ModemTime::parse_network(text).map(Some),
        }
    }

    pub async fn set_rtc(&mut self, time: &ModemTime) -> Result<(), Error> {
        if !time.is_valid() {
            return Err(Error::InvalidArgument);
        }
        let mut text: String<MAX_TIME_LEN> = String::new();
        time.write_rtc(&mut text)?;
        self.send(&SetClock { time: &text }).await?;
        Ok(())
    }

    pub async fn rtc(&mut self) -> Result<ModemTime, Error> {
        let clock = self.send(&GetClock).await?;
        ModemTime::parse_rtc(&clock.time)
    }

    /// Copy local network time into the RTC. Returns the time written, or
    /// `None` if no network time is available yet.
    pub async fn sync_rtc_from_network(&mut self) -> Result<Option<ModemTime>, Error> {
        let Some(time) = self.network_time(TimeQueryMode::Local).await? else {
            warn!("Network time not synchronized yet");
            return Ok(None);
        };

        self.set_rtc(&time).await?;
        info!(
            "RTC set to {}/{}/{} {}:{}:{}",
            time.year,
            time.month,
            time.day,
            time.hour,
            time.minute,
            time.second
        );
        Ok(Some(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{block_on, client, MockTransport};

    fn rtc_text(t: &ModemTime) -> String<MAX_TIME_LEN> {
        let mut s = String::new();
        t.write_rtc(&mut s).unwrap();
        s
    }

    #[test]
    fn rtc_layout() {
        let t = ModemTime::parse_rtc("24/11/26,14:30:00+32").unwrap();
        assert_eq!(t.year, 2024);
        assert_eq!(t.month, 11);
        assert_eq!(t.day, 26);
        assert_eq!(t.hour, 14);
        assert_eq!(t.minute, 30);
        assert_eq!(t.second, 0);
        assert_eq!(t.timezone_quarters, 32);
        assert_eq!(t.timezone_hours(), 8);
        assert_eq!(t.daylight_saving, None);
    }

    #[test]
    fn network_layout() {
        let t = ModemTime::parse_network("2024/11/26,06:30:00-20,1").unwrap();
        assert_eq!(t.year, 2024);
        assert_eq!(t.hour, 6);
        assert_eq!(t.timezone_quarters, -20);
        assert_eq!(t.timezone_hours(), -5);
        assert_eq!(t.utc_offset_minutes(), -300);
        assert_eq!(t.daylight_saving, Some(true));

        let t = ModemTime::parse_network("2024/11/26,06:30:00+00").unwrap();
        assert_eq!(t.daylight_saving, None);
    }

    #[test]
    fn both_layouts_decode_to_the_same_fields() {
        let network = ModemTime::parse_network("2024/11/26,14:30:00+32").unwrap();
        let rtc = ModemTime::parse_rtc("24/11/26,14:30:00+32").unwrap();
        assert!(network.same_time(&rtc));
        assert_ne!(network.raw, rtc.raw);
    }

    #[test]
    fn rtc_round_trip() {
        let t = ModemTime::new(2031, 2, 3, 4, 5, 6, -7).unwrap();
        let text = rtc_text(&t);
        assert_eq!(text.as_str(), "31/02/03,04:05:06-07");
        assert_eq!(t.raw, text);
        assert_eq!(ModemTime::parse_rtc(&text), Ok(t));
    }

    #[test]
    fn rtc_sign_is_mandatory() {
        let t = ModemTime::new(2024, 1, 1, 0, 0, 0, 0).unwrap();
        assert_eq!(rtc_text(&t).as_str(), "24/01/01,00:00:00+00");
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        assert_eq!(
            ModemTime::new(2024, 13, 1, 0, 0, 0, 0),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            ModemTime::new(2024, 1, 1, 24, 0, 0, 0),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            ModemTime::new(2024, 1, 1, 0, 0, 0, 57),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            ModemTime::parse_rtc("24/00/26,14:30:00+32"),
            Err(Error::Parse)
        );
    }

    #[test]
    fn malformed_text() {
        assert_eq!(ModemTime::parse_rtc(""), Err(Error::Parse));
        assert_eq!(ModemTime::parse_rtc("24-11-26,14:30:00+32"), Err(Error::Parse));
        assert_eq!(ModemTime::parse_rtc("24/11/26,14:3x:00+32"), Err(Error::Parse));
        assert_eq!(ModemTime::parse_network("24/11/26,14:30:00+32"), Err(Error::Parse));
    }

    #[test]
    fn sync_rtc_from_network() {
        let mut transport = MockTransport::new();
        transport
            .expect(
                "AT+QLTS=2",
                b"\r\n+QLTS: \"2024/11/26,14:30:00+32,0\"\r\n\r\nOK\r\n",
            )
            .expect("AT+CCLK=\"24/11/26,14:30:00+32\"", b"\r\nOK\r\n");
        let mut modem = client(transport);

        let time = block_on(modem.sync_rtc_from_network()).unwrap().unwrap();

        assert_eq!(time.hour, 14);
        assert_eq!(time.raw.as_str(), "2024/11/26,14:30:00+32,0");
        assert!(modem.transport().script_done());
    }

    #[test]
    fn sync_without_network_time_leaves_rtc_alone() {
        let mut transport = MockTransport::new();
        transport.expect("AT+QLTS=2", b"\r\n+QLTS: \"\"\r\n\r\nOK\r\n");
        let mut modem = client(transport);

        assert_eq!(block_on(modem.sync_rtc_from_network()), Ok(None));
        assert_eq!(modem.transport().commands().len(), 1);
    }

    #[test]
    fn read_rtc() {
        let mut transport = MockTransport::new();
        transport.expect("AT+CCLK?", b"\r\n+CCLK: \"24/11/26,14:30:00+32\"\r\n\r\nOK\r\n");
        let mut modem = client(transport);

        let t = block_on(modem.rtc()).unwrap();
        assert_eq!(t.timezone_hours(), 8);
        assert_eq!(t.raw.as_str(), "24/11/26,14:30:00+32");
    }
}
