use chrono::NaiveDate;
use log::debug;
use thiserror::Error;

use super::astro::{ self, darccos, darccot, dcos, dsin, dtan, fix_hour, SunPosition };
use super::config::{ HighLatitudeRule, MethodParams, PrayerConfig, TimeFormat, Twilight, UnknownKey };
use super::coordinates::{ Coordinates, CoordinatesError };
use super::format::{ format_time, ParseTimeError };
use super::hijri::{ self, HijriError };
use super::{ Prayer, PrayerTimes };

/// Sun center depression at sunrise/sunset: refraction plus semi-diameter.
const RISE_SET_ANGLE: f64 = 0.833;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("invalid coordinates. {0}")]
    Coordinates(#[from] CoordinatesError),

    #[error(transparent)]
    UnknownKey(#[from] UnknownKey),

    #[error("{event} is not attainable on {date} at latitude {latitude}")]
    Unattainable { event: &'static str, date: NaiveDate, latitude: f64 },

    #[error("{0} is outside the supported date range")]
    DateOutOfRange(NaiveDate),

    #[error("unable to read back a computed time. {0}")]
    Parse(#[from] ParseTimeError),
}

/// Decimal hours in the coordinates' timezone. Values past local midnight
/// exceed 24 so the sequence stays increasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTimes {
    pub fajr: f64,
    pub sunrise: f64,
    pub dhuhr: f64,
    pub asr: f64,
    pub sunset: f64,
    pub maghrib: f64,
    pub isha: f64,
}

impl DayTimes {
    pub fn get(&self, prayer: Prayer) -> f64 {
        match prayer {
            Prayer::Fajr => self.fajr,
            Prayer::Sunrise => self.sunrise,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
        }
    }

    pub fn format(&self, format: TimeFormat) -> PrayerTimes {
        PrayerTimes {
            fajr: format_time(self.fajr, format),
            sunrise: format_time(self.sunrise, format),
            dhuhr: format_time(self.dhuhr, format),
            asr: format_time(self.asr, format),
            maghrib: format_time(self.maghrib, format),
            isha: format_time(self.isha, format),
        }
    }

    fn values_mut(&mut self) -> [&mut f64; 7] {
        [&mut self.fajr, &mut self.sunrise, &mut self.dhuhr, &mut self.asr, &mut self.sunset, &mut self.maghrib, &mut self.isha]
    }

    fn named(&self) -> [(&'static str, f64); 7] {
        [("fajr", self.fajr), ("sunrise", self.sunrise), ("dhuhr", self.dhuhr), ("asr", self.asr),
            ("sunset", self.sunset), ("maghrib", self.maghrib), ("isha", self.isha)]
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Side {
    Morning,
    Evening,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrayerTimeCalculator {
    config: PrayerConfig,
    coordinates: Coordinates,
}

impl PrayerTimeCalculator {
    pub fn new(config: PrayerConfig, coordinates: Coordinates) -> Result<Self, CalcError> {
        coordinates.validate()?;
        Ok(PrayerTimeCalculator { config, coordinates })
    }

    /// Like [`PrayerTimeCalculator::new`] but from textual config keys.
    pub fn from_keys(method: &str, asr: &str, high_lats: &str, format: &str, coordinates: Coordinates) -> Result<Self, CalcError> {
        Self::new(PrayerConfig::from_keys(method, asr, high_lats, format)?, coordinates)
    }

    pub fn config(&self) -> &PrayerConfig {
        &self.config
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    pub fn calculate_prayer_times(&self, date: NaiveDate) -> Result<PrayerTimes, CalcError> {
        Ok(self.day_times(date)?.format(self.config.time_format))
    }

    pub fn day_times(&self, date: NaiveDate) -> Result<DayTimes, CalcError> {
        let params = self.config.calculation_method.params();
        let mut times = self.compute(date, &params);
        self.adjust(&mut times, &params);

        match times.named().into_iter().find(|(_, v)| !v.is_finite()) {
            Some((event, _)) => Err(CalcError::Unattainable { event, date, latitude: self.coordinates.latitude }),
            None => Ok(times),
        }
    }

    fn compute(&self, date: NaiveDate, params: &MethodParams) -> DayTimes {
        let sun = Sun {
            jdate: astro::julian_date(date) - self.coordinates.longitude / (15.0 * 24.0),
            latitude: self.coordinates.latitude,
        };

        let sunset = sun.angle_time(RISE_SET_ANGLE, 18.0, Side::Evening);
        let evening = |twilight: Twilight| match twilight {
            Twilight::Angle(angle) => sun.angle_time(angle, 18.0, Side::Evening),
            // placed in adjust()
            Twilight::Minutes(_) => sunset,
        };

        DayTimes {
            fajr: sun.angle_time(params.fajr, 5.0, Side::Morning),
            sunrise: sun.angle_time(RISE_SET_ANGLE, 6.0, Side::Morning),
            dhuhr: sun.mid_day(12.0),
            asr: sun.asr_time(self.config.asr_juristic.shadow_factor(), 13.0),
            sunset,
            maghrib: evening(params.maghrib),
            isha: evening(params.isha),
        }
    }

    fn adjust(&self, times: &mut DayTimes, params: &MethodParams) {
        let shift = self.coordinates.timezone as f64 - self.coordinates.longitude / 15.0;
        for v in times.values_mut() {
            *v += shift;
        }

        self.adjust_high_lats(times, params);

        if let Twilight::Minutes(m) = params.maghrib {
            times.maghrib = times.sunset + m / 60.0;
        }
        if let Twilight::Minutes(m) = params.isha {
            times.isha = times.maghrib + m / 60.0;
        }
    }

    fn adjust_high_lats(&self, times: &mut DayTimes, params: &MethodParams) {
        let night = fix_hour(times.sunrise - times.sunset);
        let portion = |angle: f64| -> Option<f64> {
            let fraction = match self.config.adjust_high_lats {
                HighLatitudeRule::None => return None,
                HighLatitudeRule::AngleBased => angle / 60.0,
                HighLatitudeRule::MidNight => 0.5,
                HighLatitudeRule::OneSeventh => 1.0 / 7.0,
            };
            Some(fraction * night)
        };

        if let Some(p) = portion(params.fajr) {
            times.fajr = clamp_to_night("fajr", times.fajr, times.sunrise, p, Side::Morning);
        }
        if let Twilight::Angle(a) = params.isha {
            if let Some(p) = portion(a) {
                times.isha = clamp_to_night("isha", times.isha, times.sunset, p, Side::Evening);
            }
        }
        if let Twilight::Angle(a) = params.maghrib {
            if let Some(p) = portion(a) {
                times.maghrib = clamp_to_night("maghrib", times.maghrib, times.sunset, p, Side::Evening);
            }
        }
    }

    /// Hijri date for the given day, see [`hijri`].
    pub fn convert_to_hijri(&self, date: NaiveDate) -> Result<String, HijriError> {
        hijri::convert_to_hijri(date)
    }
}

/// Keeps `time` no further than `portion` hours from `base` on the night side.
fn clamp_to_night(event: &str, time: f64, base: f64, portion: f64, side: Side) -> f64 {
    let diff = match side {
        Side::Morning => fix_hour(base - time),
        Side::Evening => fix_hour(time - base),
    };
    if time.is_nan() || diff > portion {
        let clamped = match side {
            Side::Morning => base - portion,
            Side::Evening => base + portion,
        };
        debug!("{event} moved from {time:.3}h to {clamped:.3}h by high latitude rule");
        clamped
    } else {
        time
    }
}

struct Sun {
    jdate: f64,
    latitude: f64,
}

impl Sun {
    fn position(&self, hour: f64) -> SunPosition {
        astro::sun_position(self.jdate + hour / 24.0)
    }

    fn mid_day(&self, hour: f64) -> f64 {
        fix_hour(12.0 - self.position(hour).equation_of_time)
    }

    /// Time at which the sun is `angle` degrees below the horizon, NaN if never.
    fn angle_time(&self, angle: f64, hour: f64, side: Side) -> f64 {
        let decl = self.position(hour).declination;
        let noon = self.mid_day(hour);
        let lat = self.latitude;
        let t = darccos((-dsin(angle) - dsin(decl) * dsin(lat)) / (dcos(decl) * dcos(lat))) / 15.0;
        match side {
            Side::Morning => noon - t,
            Side::Evening => noon + t,
        }
    }

    fn asr_time(&self, factor: f64, hour: f64) -> f64 {
        let decl = self.position(hour).declination;
        let angle = -darccot(factor + dtan((self.latitude - decl).abs()));
        self.angle_time(angle, hour, Side::Evening)
    }
}
