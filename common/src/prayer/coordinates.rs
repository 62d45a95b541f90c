use chrono::{ FixedOffset, Offset, Utc };
use serde::{ Deserialize, Deserializer, Serialize };
use thiserror::Error;

pub const TIMEZONE_RANGE: std::ops::RangeInclusive<i32> = -12..=14;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinatesError {
    #[error("latitude {0} is not within -90.0 <= x <= 90.0")]
    Latitude(f64),

    #[error("longitude {0} is not within -180.0 <= x <= 180.0")]
    Longitude(f64),

    #[error("timezone offset {0}h is not within -12 <= x <= 14")]
    Timezone(i32),
}

/// Observer location. The timezone is the whole-hour UTC offset the
/// computed times are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(deserialize_with = "deserialize_latitude")]
    pub latitude: f64,

    #[serde(deserialize_with = "deserialize_longitude")]
    pub longitude: f64,

    #[serde(deserialize_with = "deserialize_timezone")]
    pub timezone: i32,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64, timezone: i32) -> Result<Coordinates, CoordinatesError> {
        let c = Coordinates { latitude, longitude, timezone };
        c.validate()?;
        Ok(c)
    }

    pub fn validate(&self) -> Result<(), CoordinatesError> {
        if !valid_latitude(self.latitude) { return Err(CoordinatesError::Latitude(self.latitude)) }
        if !valid_longitude(self.longitude) { return Err(CoordinatesError::Longitude(self.longitude)) }
        if !TIMEZONE_RANGE.contains(&self.timezone) { return Err(CoordinatesError::Timezone(self.timezone)) }
        Ok(())
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone * 3600).unwrap_or_else(|| Utc.fix())
    }
}

pub fn valid_latitude(value: f64) -> bool {
    value.is_finite() && (-90.0..=90.0).contains(&value)
}

pub fn valid_longitude(value: f64) -> bool {
    value.is_finite() && (-180.0..=180.0).contains(&value)
}

fn deserialize_latitude<'de, D>(d: D) -> Result<f64, D::Error> where D: Deserializer<'de> {
    let value = f64::deserialize(d)?;
    if valid_latitude(value) { Ok(value) }
    else { Err(serde::de::Error::invalid_value(serde::de::Unexpected::Float(value), &"to be -90.0 <= x <= 90.0")) }
}

fn deserialize_longitude<'de, D>(d: D) -> Result<f64, D::Error> where D: Deserializer<'de> {
    let value = f64::deserialize(d)?;
    if valid_longitude(value) { Ok(value) }
    else { Err(serde::de::Error::invalid_value(serde::de::Unexpected::Float(value), &"to be -180.0 <= x <= 180.0")) }
}

fn deserialize_timezone<'de, D>(d: D) -> Result<i32, D::Error> where D: Deserializer<'de> {
    let value = i32::deserialize(d)?;
    if TIMEZONE_RANGE.contains(&value) { Ok(value) }
    else { Err(serde::de::Error::invalid_value(serde::de::Unexpected::Signed(value as i64), &"to be -12 <= x <= 14")) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(Coordinates::new(91.0, 0.0, 0), Err(CoordinatesError::Latitude(91.0)));
        assert_eq!(Coordinates::new(0.0, -181.0, 0), Err(CoordinatesError::Longitude(-181.0)));
        assert_eq!(Coordinates::new(0.0, 0.0, 15), Err(CoordinatesError::Timezone(15)));
        assert!(Coordinates::new(f64::NAN, 0.0, 0).is_err());
    }

    #[test]
    fn offset_follows_timezone_hours() {
        let tottori = Coordinates::new(35.5011, 134.2352, 9).unwrap();
        assert_eq!(tottori.offset().local_minus_utc(), 9 * 3600);

        let new_york = Coordinates::new(40.7128, -74.006, -5).unwrap();
        assert_eq!(new_york.offset().local_minus_utc(), -5 * 3600);
    }
}
