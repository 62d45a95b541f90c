pub mod general;
pub mod countdown;

use serde::Deserialize;
use config_rs;

use common::logging::Logging;
use common::prayer::Coordinates;

use general::General;
use countdown::Countdown;

const CONFIGS: &[&str] = &["display.toml"];
const ENV_PREFIX: &str = "MIQAT_DISPLAY";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub logging: Logging,
    pub gps: Coordinates,
    pub countdown: Countdown,
}

impl Config {
    pub fn new() -> Config {
        match Config::load(CONFIGS) {
            Ok(c) => c,
            Err(e) => panic!("loading config failed. {e}"),
        }
    }

    fn load(files: &[&str]) -> Result<Config, config_rs::ConfigError> {
        let mut config_rs_builder = defaults();
        for s in files {
            config_rs_builder = config_rs_builder.add_source(config_rs::File::with_name(s).required(false));
        }
        config_rs_builder
            .add_source(config_rs::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize::<Config>()
    }
}

fn defaults() -> config_rs::ConfigBuilder<config_rs::builder::DefaultState> {
    config_rs::Config::builder()
        .add_source(config_rs::File::from_str(include_str!("defaults/general.toml"), config_rs::FileFormat::Toml))
        .add_source(config_rs::File::from_str(include_str!("defaults/logging.toml"), config_rs::FileFormat::Toml))
        .add_source(config_rs::File::from_str(include_str!("defaults/gps.toml"), config_rs::FileFormat::Toml))
        .add_source(config_rs::File::from_str(include_str!("defaults/countdown.toml"), config_rs::FileFormat::Toml))
}
