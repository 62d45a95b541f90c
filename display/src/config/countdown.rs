use std::time::Duration;

use serde::{ Deserialize, Deserializer, de::Unexpected };

#[derive(Debug, Deserialize)]
pub struct Countdown {
    /// Recomputation period of the remaining time.
    #[serde(deserialize_with = "deserialize_tick")]
    pub tick: Duration,

    /// Recomputation period of the day's table.
    #[serde(deserialize_with = "deserialize_refresh")]
    pub refresh: Duration,
}

fn deserialize_tick<'de, D>(d: D) -> Result<Duration, D::Error> where D: Deserializer<'de> {
    seconds(String::deserialize(d)?, "countdown.tick")
}

fn deserialize_refresh<'de, D>(d: D) -> Result<Duration, D::Error> where D: Deserializer<'de> {
    seconds(String::deserialize(d)?, "countdown.refresh")
}

fn seconds<E: serde::de::Error>(s: String, key: &str) -> Result<Duration, E> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(Duration::from_secs_f64(v)),
        Ok(v) => Err(E::invalid_value(Unexpected::Float(v), &format!("to be greater than zero. ({key})").as_str())),
        Err(e) => Err(E::invalid_value(Unexpected::Str(&s), &format!("to be seconds as f64. ({key}) {e}").as_str())),
    }
}
