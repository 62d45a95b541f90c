use chrono::{ DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Timelike, Utc };
use serde::Serialize;

use super::calc::{ CalcError, PrayerTimeCalculator };
use super::format::{ parse_time, ParseTimeError };
use super::{ Prayer, PrayerTimes };

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextPrayer {
    pub name: Prayer,
    pub formatted_time: String,
    /// Start of the prayer's minute in the coordinates' timezone.
    pub at: DateTime<FixedOffset>,
}

/// Earliest prayer of `times` strictly after `now_hours`, with its decimal hour.
///
/// Formatted times only carry the time of day, so a value smaller than its
/// predecessor is read as falling after midnight.
pub fn upcoming(now_hours: f64, times: &PrayerTimes) -> Result<Option<(Prayer, f64)>, ParseTimeError> {
    let mut previous = f64::NEG_INFINITY;
    for (prayer, formatted) in times.iter() {
        let mut hours = parse_time(formatted)?;
        while hours <= previous {
            hours += 24.0;
        }
        previous = hours;
        if hours > now_hours {
            return Ok(Some((prayer, hours)));
        }
    }
    Ok(None)
}

impl PrayerTimeCalculator {
    /// Next prayer after `now`. Past isha this is tomorrow's fajr, computed for tomorrow.
    ///
    /// Before fajr, yesterday's prayers that fell after midnight (isha at high
    /// latitudes in summer) come first.
    pub fn next_prayer<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<NextPrayer, CalcError> {
        let offset = self.coordinates().offset();
        let local = now.with_timezone(&offset);
        let today = local.date_naive();
        let now_hours = local.hour() as f64
            + local.minute() as f64 / 60.0
            + (local.second() as f64 + local.nanosecond() as f64 / 1e9) / 3600.0;

        let times = self.calculate_prayer_times(today)?;
        if let Some((name, hours)) = upcoming(now_hours, &times)? {
            let next = NextPrayer {
                name,
                formatted_time: times.get(name).to_string(),
                at: at_hours(today, hours, offset)?,
            };
            if name == Prayer::Fajr {
                if let Some(late) = self.carried_over(today, now_hours, offset)? {
                    if late.at < next.at {
                        return Ok(late);
                    }
                }
            }
            return Ok(next);
        }

        let tomorrow = today.succ_opt().ok_or(CalcError::DateOutOfRange(today))?;
        let times = self.calculate_prayer_times(tomorrow)?;
        let hours = parse_time(&times.fajr)?;
        Ok(NextPrayer {
            name: Prayer::Fajr,
            at: at_hours(tomorrow, hours, offset)?,
            formatted_time: times.fajr,
        })
    }

    /// Earliest prayer of yesterday's table still ahead of `now_hours` today.
    fn carried_over(&self, today: NaiveDate, now_hours: f64, offset: FixedOffset) -> Result<Option<NextPrayer>, CalcError> {
        let yesterday = match today.pred_opt() {
            Some(date) => date,
            None => return Ok(None),
        };
        let times = match self.calculate_prayer_times(yesterday) {
            Ok(times) => times,
            Err(CalcError::Unattainable { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        match upcoming(now_hours + 24.0, &times)? {
            Some((name, hours)) => Ok(Some(NextPrayer {
                name,
                formatted_time: times.get(name).to_string(),
                at: at_hours(yesterday, hours, offset)?,
            })),
            None => Ok(None),
        }
    }
}

fn at_hours(date: NaiveDate, hours: f64, offset: FixedOffset) -> Result<DateTime<FixedOffset>, CalcError> {
    let midnight = date.and_hms_opt(0, 0, 0).ok_or(CalcError::DateOutOfRange(date))?;
    let local = midnight + Duration::minutes((hours * 60.0).round() as i64);
    let utc = local - Duration::seconds(offset.local_minus_utc() as i64);
    Ok(Utc.from_utc_datetime(&utc).with_timezone(&offset))
}
