//! Low precision solar position, good to about a minute of prayer time
//! between 1950 and 2050.

use chrono::{ Datelike, NaiveDate };

/// Julian day number of the calendar day at 0h UT.
pub fn julian_date(date: NaiveDate) -> f64 {
    let (mut year, mut month) = (date.year() as f64, date.month() as f64);
    let day = date.day() as f64;
    if month <= 2.0 {
        year -= 1.0;
        month += 12.0;
    }
    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor() + day + b - 1524.5
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    /// Declination in degrees.
    pub declination: f64,
    /// Equation of time in hours.
    pub equation_of_time: f64,
}

pub fn sun_position(jd: f64) -> SunPosition {
    let d = jd - 2451545.0;
    let g = fix_angle(357.529 + 0.98560028 * d);
    let q = fix_angle(280.459 + 0.98564736 * d);
    let l = fix_angle(q + 1.915 * dsin(g) + 0.020 * dsin(2.0 * g));
    let e = 23.439 - 0.00000036 * d;

    let right_ascension = darctan2(dcos(e) * dsin(l), dcos(l)) / 15.0;
    SunPosition {
        declination: darcsin(dsin(e) * dsin(l)),
        // q/15 and RA wrap independently around the equinox
        equation_of_time: fix_hour(q / 15.0 - fix_hour(right_ascension) + 12.0) - 12.0,
    }
}

pub fn dsin(d: f64) -> f64 { d.to_radians().sin() }
pub fn dcos(d: f64) -> f64 { d.to_radians().cos() }
pub fn dtan(d: f64) -> f64 { d.to_radians().tan() }

pub fn darcsin(x: f64) -> f64 { x.asin().to_degrees() }
/// NaN outside [-1, 1], which callers read as "angle never reached".
pub fn darccos(x: f64) -> f64 { x.acos().to_degrees() }
pub fn darctan2(y: f64, x: f64) -> f64 { y.atan2(x).to_degrees() }
pub fn darccot(x: f64) -> f64 { (1.0 / x).atan().to_degrees() }

pub fn fix_angle(a: f64) -> f64 { a.rem_euclid(360.0) }
pub fn fix_hour(h: f64) -> f64 { h.rem_euclid(24.0) }
