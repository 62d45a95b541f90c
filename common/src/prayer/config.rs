use serde::{ Deserialize, Serialize };
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} `{key}`. expected one of {expected}")]
pub struct UnknownKey {
    pub kind: &'static str,
    pub key: String,
    pub expected: &'static str,
}

/// Implements `key()`, `ALL`, `Display` and `FromStr` for an enum whose variants
/// are addressed by a fixed textual key.
macro_rules! keyed_enum {
    ($name:ident, $kind:literal, { $( $variant:ident => $key:literal ),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            pub fn key(self) -> &'static str {
                match self {
                    $( $name::$variant => $key ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.key())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = UnknownKey;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $( k if k.eq_ignore_ascii_case($key) => Ok($name::$variant), )+
                    other => Err(UnknownKey {
                        kind: $kind,
                        key: other.to_string(),
                        expected: concat!($( $key, " " ),+),
                    }),
                }
            }
        }
    };
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationMethod {
    #[serde(rename = "MWL")]
    Mwl,
    #[serde(rename = "ISNA")]
    Isna,
    Egypt,
    Makkah,
    Karachi,
    Tehran,
    Jafari,
}

keyed_enum!(CalculationMethod, "calculation method", {
    Mwl => "MWL",
    Isna => "ISNA",
    Egypt => "Egypt",
    Makkah => "Makkah",
    Karachi => "Karachi",
    Tehran => "Tehran",
    Jafari => "Jafari",
});

/// How an evening (or morning) event is placed relative to the sun.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Twilight {
    /// Sun depression below the horizon in degrees.
    Angle(f64),
    /// Fixed offset in minutes from the preceding event.
    Minutes(f64),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MethodParams {
    pub fajr: f64,
    pub maghrib: Twilight,
    pub isha: Twilight,
}

impl CalculationMethod {
    pub fn params(self) -> MethodParams {
        use Twilight::{ Angle, Minutes };
        let (fajr, maghrib, isha) = match self {
            CalculationMethod::Mwl => (18.0, Minutes(0.0), Angle(17.0)),
            CalculationMethod::Isna => (15.0, Minutes(0.0), Angle(15.0)),
            CalculationMethod::Egypt => (19.5, Minutes(0.0), Angle(17.5)),
            CalculationMethod::Makkah => (18.5, Minutes(0.0), Minutes(90.0)),
            CalculationMethod::Karachi => (18.0, Minutes(0.0), Angle(18.0)),
            CalculationMethod::Tehran => (17.7, Angle(4.5), Angle(14.0)),
            CalculationMethod::Jafari => (16.0, Angle(4.0), Angle(14.0)),
        };
        MethodParams { fajr, maghrib, isha }
    }

    pub fn description(self) -> &'static str {
        match self {
            CalculationMethod::Mwl => "Muslim World League",
            CalculationMethod::Isna => "Islamic Society of North America",
            CalculationMethod::Egypt => "Egyptian General Authority of Survey",
            CalculationMethod::Makkah => "Umm al-Qura University, Makkah",
            CalculationMethod::Karachi => "University of Islamic Sciences, Karachi",
            CalculationMethod::Tehran => "Institute of Geophysics, University of Tehran",
            CalculationMethod::Jafari => "Shia Ithna Ashari, Leva Institute, Qum",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsrJuristic {
    Standard,
    Hanafi,
}

keyed_enum!(AsrJuristic, "asr juristic", {
    Standard => "Standard",
    Hanafi => "Hanafi",
});

impl AsrJuristic {
    /// Shadow length factor relative to the object's height.
    pub fn shadow_factor(self) -> f64 {
        match self {
            AsrJuristic::Standard => 1.0,
            AsrJuristic::Hanafi => 2.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HighLatitudeRule {
    None,
    MidNight,
    OneSeventh,
    AngleBased,
}

keyed_enum!(HighLatitudeRule, "high latitude rule", {
    None => "None",
    MidNight => "MidNight",
    OneSeventh => "OneSeventh",
    AngleBased => "AngleBased",
});

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFormat {
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "12h")]
    H12,
}

keyed_enum!(TimeFormat, "time format", {
    H24 => "24h",
    H12 => "12h",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerConfig {
    pub calculation_method: CalculationMethod,
    pub asr_juristic: AsrJuristic,
    pub adjust_high_lats: HighLatitudeRule,
    pub time_format: TimeFormat,
}

impl Default for PrayerConfig {
    fn default() -> Self {
        PrayerConfig {
            calculation_method: CalculationMethod::Mwl,
            asr_juristic: AsrJuristic::Standard,
            adjust_high_lats: HighLatitudeRule::AngleBased,
            time_format: TimeFormat::H24,
        }
    }
}

impl PrayerConfig {
    /// Builds a config from textual keys, failing on the first unknown one.
    pub fn from_keys(method: &str, asr: &str, high_lats: &str, format: &str) -> Result<Self, UnknownKey> {
        Ok(PrayerConfig {
            calculation_method: method.parse()?,
            asr_juristic: asr.parse()?,
            adjust_high_lats: high_lats.parse()?,
            time_format: format.parse()?,
        })
    }
}

impl std::fmt::Display for PrayerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "method={} asr={} high_lats={} format={}",
            self.calculation_method, self.asr_juristic, self.adjust_high_lats, self.time_format)
    }
}

/// Partial record used by administrative updates. Absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerConfigUpdate {
    pub calculation_method: Option<CalculationMethod>,
    pub asr_juristic: Option<AsrJuristic>,
    pub adjust_high_lats: Option<HighLatitudeRule>,
    pub time_format: Option<TimeFormat>,
}

impl PrayerConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.calculation_method.is_none()
            && self.asr_juristic.is_none()
            && self.adjust_high_lats.is_none()
            && self.time_format.is_none()
    }

    pub fn apply(&self, config: &PrayerConfig) -> PrayerConfig {
        PrayerConfig {
            calculation_method: self.calculation_method.unwrap_or(config.calculation_method),
            asr_juristic: self.asr_juristic.unwrap_or(config.asr_juristic),
            adjust_high_lats: self.adjust_high_lats.unwrap_or(config.adjust_high_lats),
            time_format: self.time_format.unwrap_or(config.time_format),
        }
    }
}
