use std::str::FromStr;

use serde::{ Deserialize, Deserializer, de::Unexpected };

use common::prayer::{ AsrJuristic, CalculationMethod, HighLatitudeRule, PrayerConfig, TimeFormat, UnknownKey };

/// The configuration served until an administrator changes it.
#[derive(Debug, Deserialize)]
pub struct Prayer {
    #[serde(deserialize_with = "keyed")]
    pub calculation_method: CalculationMethod,
    #[serde(deserialize_with = "keyed")]
    pub asr_juristic: AsrJuristic,
    #[serde(deserialize_with = "keyed")]
    pub adjust_high_lats: HighLatitudeRule,
    #[serde(deserialize_with = "keyed")]
    pub time_format: TimeFormat,
}

impl Prayer {
    pub fn config(&self) -> PrayerConfig {
        PrayerConfig {
            calculation_method: self.calculation_method,
            asr_juristic: self.asr_juristic,
            adjust_high_lats: self.adjust_high_lats,
            time_format: self.time_format,
        }
    }
}

fn keyed<'de, D, T>(d: D) -> Result<T, D::Error> where D: Deserializer<'de>, T: FromStr<Err = UnknownKey> {
    let s = String::deserialize(d)?;
    match s.parse::<T>() {
        Ok(v) => Ok(v),
        Err(e) => Err(serde::de::Error::invalid_value(Unexpected::Str(&s), &format!("a known key. (prayer) {e}").as_str())),
    }
}
