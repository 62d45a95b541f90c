//! The `[logging]` config section both binaries share, and the log4rs setup built from it.

use std::path::Path;

use log::LevelFilter;
use log4rs::{
    append::{ console::{ ConsoleAppender, Target }, rolling_file::{ policy::compound::{ roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy }, RollingFileAppender } },
    config::{ Appender, Root },
    encode::pattern::PatternEncoder,
};
use serde::{ Deserialize, Deserializer, de::Unexpected };

pub const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l}):5} {t} {T} - {m}{n}";

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send>>;

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    #[serde(deserialize_with = "deserialize_level")]
    pub level: LevelFilter,
    pub path: String,
    /// MiB per file before rolling.
    #[serde(deserialize_with = "deserialize_size")]
    pub size: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub count: u32,
}

/// Console plus rolling `<path>/<stem>.log`, archived as `<stem>.{n}.log`.
pub fn generate_config(logging: &Logging, stem: &str) -> Result<log4rs::Config> {
    let size = logging.size.checked_mul(1024 * 1024).unwrap_or(u64::MAX);
    let dir = Path::new(&logging.path);

    let console_appender = ConsoleAppender::builder()
        .target(Target::Stdout)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let roller = FixedWindowRoller::builder()
        .build(&path_str(&dir.join(format!("{stem}.{{}}.log")))?, logging.count)?;

    let rolling_file_appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(
            path_str(&dir.join(format!("{stem}.log")))?,
            Box::new(CompoundPolicy::new(Box::new(SizeTrigger::new(size)), Box::new(roller))),
        ).map_err(|e| -> Box<dyn std::error::Error + Send> { Box::new(e) })?;

    log4rs::Config::builder()
        .appender(Appender::builder().build("rolling_file_appender", Box::new(rolling_file_appender)))
        .appender(Appender::builder().build("console_appender", Box::new(console_appender)))
        .build(
            Root::builder()
                .appender("rolling_file_appender")
                .appender("console_appender")
                .build(logging.level),
        ).map_err(|e| -> Box<dyn std::error::Error + Send> { Box::new(e) })
}

fn path_str(path: &Path) -> Result<String> {
    match path.to_str() {
        Some(s) => Ok(s.to_string()),
        None => Err(Box::new(std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("log path is not utf-8: {}", path.display())))),
    }
}

fn deserialize_level<'de, D>(d: D) -> std::result::Result<LevelFilter, D::Error> where D: Deserializer<'de> {
    match String::deserialize(d)?.to_lowercase().as_str() {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        invalid => Err(serde::de::Error::invalid_value(Unexpected::Str(invalid), &"off, error, warn, info, debug or trace. (logging.level)")),
    }
}

fn deserialize_size<'de, D>(d: D) -> std::result::Result<u64, D::Error> where D: Deserializer<'de> {
    let s = String::deserialize(d)?;
    match s.parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        Ok(v) => Err(serde::de::Error::invalid_value(Unexpected::Unsigned(v), &"to be greater than zero. (logging.size)")),
        Err(e) => Err(serde::de::Error::invalid_value(Unexpected::Str(&s), &format!("to be a u64. (logging.size) {e}").as_str())),
    }
}

fn deserialize_count<'de, D>(d: D) -> std::result::Result<u32, D::Error> where D: Deserializer<'de> {
    let s = String::deserialize(d)?;
    match s.parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        Ok(v) => Err(serde::de::Error::invalid_value(Unexpected::Unsigned(v as u64), &"to be greater than zero. (logging.count)")),
        Err(e) => Err(serde::de::Error::invalid_value(Unexpected::Str(&s), &format!("to be a u32. (logging.count) {e}").as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_console_and_rolling_file_appenders() {
        let dir = std::env::temp_dir().join("miqat-logging-test");
        let logging = Logging { level: LevelFilter::Debug, path: dir.to_string_lossy().into_owned(), size: 1, count: 2 };

        let config = generate_config(&logging, "unit").unwrap();

        let names: Vec<&str> = config.appenders().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["rolling_file_appender", "console_appender"]);
        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert!(dir.join("unit.log").exists());
    }
}
