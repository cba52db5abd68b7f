//! GNSS positioning.
//!
//! A fix is polled with `AT+QGPSLOC` until the engine reports one. While the
//! receiver is still searching, the module answers `+CME ERROR: 516`; if the
//! GNSS session was never started it answers `+CME ERROR: 505`, in which case
//! the session is started once and polling resumes.

use core::str::FromStr;

use embassy_time::Duration;
use heapless::String;

use crate::client::Client;
use crate::command::error::CmeError;
use crate::command::gnss::{
    responses::{Location, LocationHemisphere},
    types::{CoordinateFormat, FixMode, GnssMode, NmeaSource},
    ConfigureNmeaSource, GetLocation, GetLocationHemisphere, TurnOffGnss, TurnOnGnss,
};
use crate::config::ModemConfig;
use crate::digest::Outcome;
use crate::error::Error;
use crate::traits::Transport;

/// Fix time the module assumes when `AT+QGPS` carries no <fixmaxtime>.
const DEFAULT_FIX_MAX_TIME: u16 = 30;

const NOT_FIXED_NOW: i32 = CmeError::NotFixedNow.code();
const SESSION_NOT_ACTIVE: i32 = CmeError::SessionNotActive.code();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GnssState {
    NotStarted,
    Retrying,
    Fixed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    /// Width of the whole-degree prefix in degrees-minutes notation
    fn degree_digits(self) -> usize {
        match self {
            Self::Latitude => 2,
            Self::Longitude => 3,
        }
    }

    fn negative(self, hemisphere: char) -> Option<bool> {
        match (self, hemisphere) {
            (Self::Latitude, 'N') | (Self::Longitude, 'E') => Some(false),
            (Self::Latitude, 'S') | (Self::Longitude, 'W') => Some(true),
            _ => None,
        }
    }
}

/// One complete `+QGPSLOC` report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionFix {
    /// `hhmmss.sss`
    pub utc: String<12>,
    /// Decimal degrees, negative south of the equator
    pub latitude: f64,
    /// Decimal degrees, negative west of Greenwich
    pub longitude: f64,
    /// Latitude as printed by the module
    pub latitude_raw: String<20>,
    /// Longitude as printed by the module
    pub longitude_raw: String<20>,
    pub hdop: f32,
    /// Meters above sea level
    pub altitude: f32,
    pub fix_mode: FixMode,
    /// Course over ground in degrees
    pub course: f32,
    pub speed_kmh: f32,
    pub speed_knots: f32,
    /// `ddmmyy`
    pub date: String<6>,
    pub satellites: u8,
}

impl PositionFix {
    /// Convert a report in [`CoordinateFormat::DegreesMinutes`] or
    /// [`CoordinateFormat::DecimalDegrees`].
    ///
    /// All fields must be present and well formed; otherwise nothing of the
    /// report is kept.
    pub fn from_location(loc: &Location, format: CoordinateFormat) -> Result<Self, Error> {
        let (latitude, longitude) = match format {
            CoordinateFormat::DecimalDegrees => (number(&loc.latitude)?, number(&loc.longitude)?),
            CoordinateFormat::DegreesMinutes => (
                trailing_hemisphere(&loc.latitude, Axis::Latitude).ok_or(Error::Parse)?,
                trailing_hemisphere(&loc.longitude, Axis::Longitude).ok_or(Error::Parse)?,
            ),
            CoordinateFormat::DegreesMinutesHemisphere => return Err(Error::InvalidArgument),
        };

        Self::assemble(
            loc,
            (latitude, text(&loc.latitude)?),
            (longitude, text(&loc.longitude)?),
        )
    }

    /// Convert a report in [`CoordinateFormat::DegreesMinutesHemisphere`].
    pub fn from_hemisphere(loc: &LocationHemisphere) -> Result<Self, Error> {
        let latitude = degrees_minutes(&loc.latitude, &loc.north_south, Axis::Latitude)
            .ok_or(Error::Parse)?;
        let longitude = degrees_minutes(&loc.longitude, &loc.east_west, Axis::Longitude)
            .ok_or(Error::Parse)?;

        let flat = Location {
            utc: loc.utc.clone(),
            latitude: loc.latitude.clone(),
            longitude: loc.longitude.clone(),
            hdop: loc.hdop.clone(),
            altitude: loc.altitude.clone(),
            fix: loc.fix,
            cog: loc.cog.clone(),
            spkm: loc.spkm.clone(),
            spkn: loc.spkn.clone(),
            date: loc.date.clone(),
            nsat: loc.nsat,
        };
        Self::assemble(
            &flat,
            (latitude, joined(&loc.latitude, &loc.north_south)?),
            (longitude, joined(&loc.longitude, &loc.east_west)?),
        )
    }

    fn assemble(
        loc: &Location,
        (latitude, latitude_raw): (f64, String<20>),
        (longitude, longitude_raw): (f64, String<20>),
    ) -> Result<Self, Error> {
        if loc.utc.is_empty() || loc.date.is_empty() {
            return Err(Error::Parse);
        }

        Ok(Self {
            utc: loc.utc.clone(),
            latitude,
            longitude,
            latitude_raw,
            longitude_raw,
            hdop: number(&loc.hdop)?,
            altitude: number(&loc.altitude)?,
            fix_mode: FixMode::try_from(loc.fix).map_err(|_| Error::Parse)?,
            course: number(&loc.cog)?,
            speed_kmh: number(&loc.spkm)?,
            speed_knots: number(&loc.spkn)?,
            date: loc.date.clone(),
            satellites: loc.nsat,
        })
    }
}

fn number<N: FromStr>(s: &str) -> Result<N, Error> {
    s.trim().parse().map_err(|_| Error::Parse)
}

fn text(s: &str) -> Result<String<20>, Error> {
    String::try_from(s).map_err(|_| Error::Parse)
}

fn joined(value: &str, hemisphere: &str) -> Result<String<20>, Error> {
    let mut s = text(value)?;
    s.push(',').map_err(|_| Error::Parse)?;
    s.push_str(hemisphere).map_err(|_| Error::Parse)?;
    Ok(s)
}

/// `ddmm.mmmm` (latitude) or `dddmm.mmmm` (longitude) into decimal degrees.
fn degrees_minutes(value: &str, hemisphere: &str, axis: Axis) -> Option<f64> {
    let mut h = hemisphere.chars();
    let negative = match (h.next(), h.next()) {
        (Some(c), None) => axis.negative(c)?,
        _ => return None,
    };

    let width = axis.degree_digits();
    if value.len() <= width || !value.is_char_boundary(width) {
        return None;
    }
    let (deg, min) = value.split_at(width);
    if !deg.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let deg: f64 = deg.parse().ok()?;
    let min: f64 = min.parse().ok()?;
    if !(0.0..60.0).contains(&min) {
        return None;
    }

    let degrees = deg + min / 60.0;
    Some(if negative { -degrees } else { degrees })
}

/// `ddmm.mmmmN` with the hemisphere letter glued to the value.
fn trailing_hemisphere(value: &str, axis: Axis) -> Option<f64> {
    let split = value.len().checked_sub(1)?;
    if !value.is_char_boundary(split) {
        return None;
    }
    let (value, hemisphere) = value.split_at(split);
    degrees_minutes(value, hemisphere, axis)
}

impl<T, C> Client<T, C>
where
    T: Transport,
    C: ModemConfig,
{
    pub fn gnss_state(&self) -> GnssState {
        self.gnss
    }

    /// Enable NMEA sentence output of the GNSS engine.
    pub async fn gnss_configure(&mut self) -> Result<(), Error> {
        self.send(&ConfigureNmeaSource {
            source: NmeaSource::Enabled,
        })
        .await?;
        Ok(())
    }

    /// Start a GNSS session. `fix_max_time` is in seconds; the module default
    /// of 30 is left implicit.
    pub async fn gnss_on(&mut self, mode: GnssMode, fix_max_time: u16) -> Result<(), Error> {
        let fix_max_time = (fix_max_time != DEFAULT_FIX_MAX_TIME).then_some(fix_max_time);
        self.send(&TurnOnGnss { mode, fix_max_time }).await?;
        Ok(())
    }

    pub async fn gnss_off(&mut self) -> Result<(), Error> {
        self.send(&TurnOffGnss).await?;
        self.gnss = GnssState::NotStarted;
        Ok(())
    }

    /// Poll for a position until one is reported or `max_retries` location
    /// queries went unanswered.
    ///
    /// "Not fixed now" and unparsable or missing replies use up one retry and
    /// wait `retry_delay`. "Session not active" starts the GNSS engine once per
    /// call without using up a retry. Any other coded error ends the
    /// acquisition immediately.
    pub async fn acquire_fix(
        &mut self,
        format: CoordinateFormat,
        max_retries: u8,
        retry_delay: Duration,
    ) -> Result<PositionFix, Error> {
        if max_retries == 0 {
            return Err(Error::InvalidArgument);
        }

        let mut last = None;
        let mut activated = false;
        let mut attempt = 0;
        self.gnss = GnssState::Retrying;

        while attempt < max_retries {
            let report = match format {
                CoordinateFormat::DegreesMinutesHemisphere => self
                    .send(&GetLocationHemisphere)
                    .await
                    .and_then(|loc| PositionFix::from_hemisphere(&loc)),
                _ => self
                    .send(&GetLocation { format })
                    .await
                    .and_then(|loc| PositionFix::from_location(&loc, format)),
            };

            match report {
                Ok(fix) => {
                    info!(
                        "GNSS fix after {} attempt(s): {:?}, {:?} ({} satellites)",
                        attempt + 1,
                        fix.latitude,
                        fix.longitude,
                        fix.satellites
                    );
                    self.gnss = GnssState::Fixed;
                    return Ok(fix);
                }
                Err(Error::Command(outcome @ Outcome::CodedError(NOT_FIXED_NOW))) => {
                    debug!("GNSS not fixed yet ({}/{})", attempt + 1, max_retries);
                    last = Some(outcome);
                }
                Err(Error::Command(outcome @ Outcome::CodedError(SESSION_NOT_ACTIVE)))
                    if !activated =>
                {
                    info!("GNSS session not active, starting it");
                    last = Some(outcome);
                    activated = true;
                    if let Err(e) = self.gnss_on(GnssMode::Standalone, DEFAULT_FIX_MAX_TIME).await {
                        error!("Failed to start GNSS session: {:?}", e);
                        self.gnss = GnssState::Failed;
                        return Err(e);
                    }
                    self.transport.delay(C::GNSS_SETTLE_TIME).await;
                    continue;
                }
                Err(Error::Command(outcome @ Outcome::CodedError(SESSION_NOT_ACTIVE))) => {
                    warn!("GNSS session still not active ({}/{})", attempt + 1, max_retries);
                    last = Some(outcome);
                }
                Err(Error::Command(outcome @ Outcome::CodedError(code))) => {
                    error!("GNSS location failed: {:?}", code);
                    self.gnss = GnssState::Failed;
                    return Err(Error::Command(outcome));
                }
                Err(Error::Command(outcome)) => {
                    warn!("GNSS location query: {:?}", outcome);
                    last = Some(outcome);
                }
                Err(Error::Parse) => {
                    warn!("Incomplete GNSS location report");
                }
                Err(e) => {
                    self.gnss = GnssState::Failed;
                    return Err(e);
                }
            }

            attempt += 1;
            if attempt < max_retries {
                self.transport.delay(retry_delay).await;
            }
        }

        warn!("No GNSS fix after {} attempts", max_retries);
        self.gnss = GnssState::Failed;
        Err(Error::NoFix { last })
    }

    /// Decimal latitude and longitude, polling up to 10 times, 2 s apart.
    pub async fn coordinates(&mut self) -> Result<(f64, f64), Error> {
        let fix = self
            .acquire_fix(CoordinateFormat::DecimalDegrees, 10, Duration::from_secs(2))
            .await?;
        Ok((fix.latitude, fix.longitude))
    }

    /// Single location query.
    pub async fn is_fixed(&mut self) -> Result<bool, Error> {
        match self
            .acquire_fix(CoordinateFormat::DecimalDegrees, 1, Duration::from_millis(100))
            .await
        {
            Ok(_) => Ok(true),
            Err(Error::NoFix { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
