use serde::{ Deserialize, Deserializer, de::Unexpected };
use url::Url;

use crate::locale::Language;

pub const HIJRI_OFFSET_RANGE: std::ops::RangeInclusive<i64> = -2..=2;

#[derive(Debug, Deserialize)]
pub struct General {
    #[serde(deserialize_with = "deserialize_name")]
    pub name: String,

    pub module: RenderModule,

    #[serde(deserialize_with = "deserialize_server_url")]
    pub server_url: Url,

    pub language: Language,

    /// Days added before converting to the Hijri calendar.
    #[serde(deserialize_with = "deserialize_hijri_offset")]
    pub hijri_offset: i64,
}

#[derive(Debug, PartialEq, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderModule {
    Log,
    Terminal,
}

// sent as `name=` in the handshake query, which only accepts word characters
fn deserialize_name<'de, D>(d: D) -> Result<String, D::Error> where D: Deserializer<'de> {
    let s = String::deserialize(d)?;
    if !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Ok(s)
    } else {
        Err(serde::de::Error::invalid_value(Unexpected::Str(&s), &"to be a single word. (general.name)"))
    }
}

fn deserialize_server_url<'de, D>(d: D) -> Result<Url, D::Error> where D: Deserializer<'de> {
    let s = String::deserialize(d)?;
    match Url::parse(&s) {
        Ok(u) if matches!(u.scheme(), "ws" | "wss") => Ok(u),
        Ok(_) => Err(serde::de::Error::invalid_value(Unexpected::Str(&s), &"to be a ws:// or wss:// url. (general.server_url)")),
        Err(e) => Err(serde::de::Error::invalid_value(Unexpected::Str(&s), &format!("to be valid url. (general.server_url) {e}").as_str())),
    }
}

fn deserialize_hijri_offset<'de, D>(d: D) -> Result<i64, D::Error> where D: Deserializer<'de> {
    let s = String::deserialize(d)?;
    match s.parse::<i64>() {
        Ok(v) if HIJRI_OFFSET_RANGE.contains(&v) => Ok(v),
        Ok(v) => Err(serde::de::Error::invalid_value(Unexpected::Signed(v), &"to be -2 <= x <= 2. (general.hijri_offset)")),
        Err(e) => Err(serde::de::Error::invalid_value(Unexpected::Str(&s), &format!("to be an i64. (general.hijri_offset) {e}").as_str())),
    }
}
