//! Tabular (arithmetical) Islamic calendar, civil epoch, the "Kuwaiti algorithm".
//!
//! Observed calendars (Umm al-Qura, local moon sighting) can differ by a day or two;
//! callers may shift the input date to compensate.

use chrono::{ Datelike, NaiveDate };
use serde::{ Deserialize, Serialize };
use thiserror::Error;

/// Julian day number of 1 Muharram 1 AH (16 July 622, Julian calendar).
const EPOCH_JDN: i64 = 1948440;
/// Julian day number of 0001-01-01 minus chrono's day count for it.
const CE_JDN_OFFSET: i64 = 1721425;

pub const MONTH_NAMES: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HijriError {
    #[error("{0} is before the start of the Hijri calendar")]
    BeforeEpoch(NaiveDate),

    #[error("{day}/{month}/{year} is not a valid Hijri date")]
    Invalid { year: i64, month: u32, day: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HijriDate {
    pub year: i64,
    pub month: u32,
    pub day: u32,
}

impl HijriDate {
    pub fn new(year: i64, month: u32, day: u32) -> Result<HijriDate, HijriError> {
        let date = HijriDate { year, month, day };
        if year < 1 || !(1..=12).contains(&month) || day < 1 || day > month_length(year, month) {
            return Err(HijriError::Invalid { year, month, day });
        }
        Ok(date)
    }

    pub fn from_gregorian(date: NaiveDate) -> Result<HijriDate, HijriError> {
        let jdn = date.num_days_from_ce() as i64 + CE_JDN_OFFSET;
        if jdn < EPOCH_JDN {
            return Err(HijriError::BeforeEpoch(date));
        }

        let l = jdn - EPOCH_JDN + 10632;
        let n = (l - 1) / 10631;
        let l = l - 10631 * n + 354;
        let j = ((10985 - l) / 5316) * ((50 * l) / 17719) + (l / 5670) * ((43 * l) / 15238);
        let l = l - ((30 - j) / 15) * ((17719 * j) / 50) - (j / 16) * ((15238 * j) / 43) + 29;
        let month = (24 * l) / 709;
        let day = l - (709 * month) / 24;
        let year = 30 * n + j - 30;

        Ok(HijriDate { year, month: month as u32, day: day as u32 })
    }

    pub fn to_gregorian(&self) -> Result<NaiveDate, HijriError> {
        let HijriDate { year, month, day } = HijriDate::new(self.year, self.month, self.day)?;
        let (m, d) = (month as i64, day as i64);
        let jdn = (11 * year + 3) / 30 + 354 * year + 30 * m - (m - 1) / 2 + d + EPOCH_JDN - 385;

        i32::try_from(jdn - CE_JDN_OFFSET).ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .ok_or(HijriError::Invalid { year, month, day })
    }

    pub fn month_name(&self) -> &'static str {
        (self.month as usize).checked_sub(1)
            .and_then(|i| MONTH_NAMES.get(i))
            .copied()
            .unwrap_or("Unknown")
    }
}

impl std::fmt::Display for HijriDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.day, self.month_name(), self.year)
    }
}

/// 11 leap years per 30 year cycle, each adding a day to Dhu al-Hijjah.
pub fn is_leap_year(year: i64) -> bool {
    (14 + 11 * year).rem_euclid(30) < 11
}

pub fn month_length(year: i64, month: u32) -> u32 {
    match month {
        12 if is_leap_year(year) => 30,
        m if m % 2 == 1 => 30,
        _ => 29,
    }
}

/// "D MonthName YYYY", e.g. "5 Ramadan 1445".
pub fn convert_to_hijri(date: NaiveDate) -> Result<String, HijriError> {
    Ok(HijriDate::from_gregorian(date)?.to_string())
}
