use thiserror::Error;

use super::astro::fix_hour;
use super::config::TimeFormat;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseTimeError {
    #[error("`{0}` is not a time of the form HH:MM or H:MM AM/PM")]
    Malformed(String),

    #[error("`{0}` is out of range")]
    OutOfRange(String),
}

/// Formats decimal hours, rounded to the nearest minute and wrapped into a day.
pub fn format_time(hours: f64, format: TimeFormat) -> String {
    let (h, m) = hours_minutes(hours);
    match format {
        TimeFormat::H24 => format!("{h:02}:{m:02}"),
        TimeFormat::H12 => {
            let period = if h >= 12 { "PM" } else { "AM" };
            let display = match h % 12 { 0 => 12, x => x };
            format!("{display}:{m:02} {period}")
        },
    }
}

fn hours_minutes(hours: f64) -> (u32, u32) {
    let total = (fix_hour(hours) * 60.0).round() as u32 % (24 * 60);
    (total / 60, total % 60)
}

/// Parses either "HH:MM" (24h) or "H:MM AM"/"H:MM PM" (12h) into decimal hours.
pub fn parse_time(s: &str) -> Result<f64, ParseTimeError> {
    let trimmed = s.trim();
    let malformed = || ParseTimeError::Malformed(s.to_string());

    let (clock, period) = match trimmed.rsplit_once(' ') {
        Some((clock, period)) => (clock.trim_end(), Some(period)),
        None => (trimmed, None),
    };

    let (h, m) = clock.split_once(':').ok_or_else(malformed)?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 { return Err(malformed()) }
    if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) { return Err(malformed()) }

    let (h, m): (u32, u32) = (h.parse().map_err(|_| malformed())?, m.parse().map_err(|_| malformed())?);
    if m >= 60 { return Err(ParseTimeError::OutOfRange(s.to_string())) }

    let hour = match period {
        None if h < 24 => h,
        None => return Err(ParseTimeError::OutOfRange(s.to_string())),
        Some(p) => {
            if !(1..=12).contains(&h) { return Err(ParseTimeError::OutOfRange(s.to_string())) }
            if p.eq_ignore_ascii_case("AM") { h % 12 }
            else if p.eq_ignore_ascii_case("PM") { h % 12 + 12 }
            else { return Err(malformed()) }
        },
    };

    Ok(hour as f64 + m as f64 / 60.0)
}
