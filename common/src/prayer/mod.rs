//! Prayer time computation.
//!
//! [`PrayerTimeCalculator`] turns a [`PrayerConfig`] and [`Coordinates`] into the
//! six daily times, finds the next prayer relative to a clock reading, and
//! converts dates to the Hijri calendar.

pub mod astro;
mod calc;
mod config;
mod coordinates;
mod format;
pub mod hijri;
mod next;

use serde::{ Deserialize, Serialize };

pub use calc::{ CalcError, DayTimes, PrayerTimeCalculator };
pub use config::{
    AsrJuristic, CalculationMethod, HighLatitudeRule, MethodParams, PrayerConfig, PrayerConfigUpdate,
    TimeFormat, Twilight, UnknownKey,
};
pub use coordinates::{ Coordinates, CoordinatesError };
pub use format::{ format_time, parse_time, ParseTimeError };
pub use hijri::{ convert_to_hijri, HijriDate, HijriError };
pub use next::{ upcoming, NextPrayer };

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prayer {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    /// In daily order.
    pub const ALL: [Prayer; 6] = [Prayer::Fajr, Prayer::Sunrise, Prayer::Dhuhr, Prayer::Asr, Prayer::Maghrib, Prayer::Isha];

    pub fn key(self) -> &'static str {
        match self {
            Prayer::Fajr => "fajr",
            Prayer::Sunrise => "sunrise",
            Prayer::Dhuhr => "dhuhr",
            Prayer::Asr => "asr",
            Prayer::Maghrib => "maghrib",
            Prayer::Isha => "isha",
        }
    }
}

impl std::fmt::Display for Prayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The day's times, formatted per the configured [`TimeFormat`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTimes {
    pub fajr: String,
    pub sunrise: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}

impl PrayerTimes {
    pub fn get(&self, prayer: Prayer) -> &str {
        match prayer {
            Prayer::Fajr => &self.fajr,
            Prayer::Sunrise => &self.sunrise,
            Prayer::Dhuhr => &self.dhuhr,
            Prayer::Asr => &self.asr,
            Prayer::Maghrib => &self.maghrib,
            Prayer::Isha => &self.isha,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Prayer, &str)> + '_ {
        Prayer::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}
