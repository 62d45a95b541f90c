use serde::Deserialize;

use common::prayer::Prayer;

/// Display language. `jp` is accepted as an alias for Japanese.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[serde(alias = "jp")]
    Ja,
    Ar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    NextPrayer,
    HijriDate,
    Countdown,
    Hours,
    Minutes,
    Seconds,
}

impl Language {
    pub fn prayer(self, prayer: Prayer) -> &'static str {
        use Prayer::*;
        match (self, prayer) {
            (Language::En, Fajr) => "Fajr",
            (Language::En, Sunrise) => "Sunrise",
            (Language::En, Dhuhr) => "Dhuhr",
            (Language::En, Asr) => "Asr",
            (Language::En, Maghrib) => "Maghrib",
            (Language::En, Isha) => "Isha",

            (Language::Ja, Fajr) => "ファジュル",
            (Language::Ja, Sunrise) => "日の出",
            (Language::Ja, Dhuhr) => "ドゥフル",
            (Language::Ja, Asr) => "アスル",
            (Language::Ja, Maghrib) => "マグリブ",
            (Language::Ja, Isha) => "イシャー",

            (Language::Ar, Fajr) => "الفجر",
            (Language::Ar, Sunrise) => "الشروق",
            (Language::Ar, Dhuhr) => "الظهر",
            (Language::Ar, Asr) => "العصر",
            (Language::Ar, Maghrib) => "المغرب",
            (Language::Ar, Isha) => "العشاء",
        }
    }

    pub fn label(self, label: Label) -> &'static str {
        use Label::*;
        match (self, label) {
            (Language::En, NextPrayer) => "Next Prayer",
            (Language::En, HijriDate) => "Hijri Date",
            (Language::En, Countdown) => "Countdown",
            (Language::En, Hours) => "Hours",
            (Language::En, Minutes) => "Minutes",
            (Language::En, Seconds) => "Seconds",

            (Language::Ja, NextPrayer) => "次の礼拝",
            (Language::Ja, HijriDate) => "ヒジュラ暦",
            (Language::Ja, Countdown) => "カウントダウン",
            (Language::Ja, Hours) => "時間",
            (Language::Ja, Minutes) => "分",
            (Language::Ja, Seconds) => "秒",

            (Language::Ar, NextPrayer) => "الصلاة القادمة",
            (Language::Ar, HijriDate) => "التاريخ الهجري",
            (Language::Ar, Countdown) => "العد التنازلي",
            (Language::Ar, Hours) => "ساعات",
            (Language::Ar, Minutes) => "دقائق",
            (Language::Ar, Seconds) => "ثواني",
        }
    }

    /// "until Asr", with the word order of the language.
    pub fn until(self, prayer: Prayer) -> String {
        let name = self.prayer(prayer);
        match self {
            Language::En => format!("until {name}"),
            Language::Ja => format!("{name}まで"),
            Language::Ar => format!("حتى {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::de::value::{ Error, StrDeserializer };
    use serde::de::IntoDeserializer;

    use super::*;

    fn parse(s: &str) -> Result<Language, Error> {
        let d: StrDeserializer<Error> = s.into_deserializer();
        Language::deserialize(d)
    }

    #[test]
    fn every_prayer_has_a_name_in_every_language() {
        for language in [Language::En, Language::Ja, Language::Ar] {
            for prayer in Prayer::ALL {
                assert!(!language.prayer(prayer).is_empty());
            }
        }
        assert_eq!(Language::En.prayer(Prayer::Maghrib), "Maghrib");
        assert_eq!(Language::Ja.label(Label::NextPrayer), "次の礼拝");
    }

    #[test]
    fn until_follows_word_order() {
        assert_eq!(Language::En.until(Prayer::Asr), "until Asr");
        assert_eq!(Language::Ja.until(Prayer::Asr), "アスルまで");
        assert_eq!(Language::Ar.until(Prayer::Isha), "حتى العشاء");
    }

    #[test]
    fn deserializes_keys_and_alias() {
        assert_eq!(parse("en").unwrap(), Language::En);
        assert_eq!(parse("jp").unwrap(), Language::Ja);
        assert_eq!(parse("ja").unwrap(), Language::Ja);
        assert!(parse("fr").is_err());
    }
}
