use chrono::{ DateTime, Duration, NaiveDate, Utc };
use thiserror::Error;

use common::prayer::{ CalcError, Coordinates, HijriDate, HijriError, NextPrayer, PrayerConfig, PrayerTimeCalculator, PrayerTimes };

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error(transparent)]
    Hijri(#[from] HijriError),

    #[error("hijri offset moves {0} out of range")]
    DateOutOfRange(NaiveDate),
}

/// Everything the display shows for the local day containing `now`.
#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    pub date: NaiveDate,
    pub config: PrayerConfig,
    pub times: PrayerTimes,
    pub hijri: HijriDate,
    pub next: NextPrayer,
}

impl Day {
    pub fn compute(config: PrayerConfig, coordinates: Coordinates, hijri_offset: i64, now: DateTime<Utc>) -> Result<Day, ScheduleError> {
        let calc = PrayerTimeCalculator::new(config, coordinates)?;
        let date = now.with_timezone(&coordinates.offset()).date_naive();

        let times = calc.calculate_prayer_times(date)?;
        let next = calc.next_prayer(&now)?;
        let shifted = date.checked_add_signed(Duration::days(hijri_offset))
            .ok_or(ScheduleError::DateOutOfRange(date))?;
        let hijri = HijriDate::from_gregorian(shifted)?;

        Ok(Day { date, config, times, hijri, next })
    }

    /// Whether the printed table would differ; the next prayer is not part of it.
    pub fn same_table(&self, other: &Day) -> bool {
        self.date == other.date && self.config == other.config && self.times == other.times && self.hijri == other.hijri
    }
}
