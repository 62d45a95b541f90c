mod general;
mod prayer;

use serde::Deserialize;
use config_rs;

use common::logging::Logging;

use general::General;
use prayer::Prayer;

const CONFIGS: &[&str] = &["server.toml"];
const ENV_PREFIX: &str = "MIQAT_SERVER";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub logging: Logging,
    pub prayer: Prayer,
}

impl Config {
    pub fn new() -> Config {
        let mut config_rs_builder = defaults();
        for s in CONFIGS {
            config_rs_builder = config_rs_builder.add_source(config_rs::File::with_name(s).required(false));
        }
        config_rs_builder = config_rs_builder.add_source(config_rs::Environment::with_prefix(ENV_PREFIX).separator("__"));
        match config_rs_builder.build() {
            Ok(c) => {
                match c.try_deserialize::<Config>() {
                    Ok(c) => c,
                    Err(e) => panic!("deserializing config failed. {e}"),
                }
            },
            Err(e) => panic!("building config failed. {e}"),
        }
    }
}

fn defaults() -> config_rs::ConfigBuilder<config_rs::builder::DefaultState> {
    config_rs::Config::builder()
        .add_source(config_rs::File::from_str(include_str!("defaults/general.toml"), config_rs::FileFormat::Toml))
        .add_source(config_rs::File::from_str(include_str!("defaults/logging.toml"), config_rs::FileFormat::Toml))
        .add_source(config_rs::File::from_str(include_str!("defaults/prayer.toml"), config_rs::FileFormat::Toml))
}

#[cfg(test)]
mod tests {
    use common::prayer::{ CalculationMethod, PrayerConfig };
    use common::server::CancelBehaviour;

    use super::*;

    fn with_override(toml: &str) -> Result<Config, config_rs::ConfigError> {
        defaults()
            .add_source(config_rs::File::from_str(toml, config_rs::FileFormat::Toml))
            .build()?
            .try_deserialize::<Config>()
    }

    #[test]
    fn embedded_defaults_serve_the_default_config() {
        let config = with_override("").unwrap();
        assert_eq!(config.general.socket.port(), 9001);
        assert_eq!(config.general.push_behaviour, CancelBehaviour::IfUnequal);
        assert_eq!(config.prayer.config(), PrayerConfig::default());
    }

    #[test]
    fn prayer_keys_are_case_insensitive() {
        let config = with_override("[prayer]\ncalculation_method = \"makkah\"").unwrap();
        assert_eq!(config.prayer.calculation_method, CalculationMethod::Makkah);
    }

    #[test]
    fn unknown_keys_abort_loading() {
        let e = with_override("[prayer]\ncalculation_method = \"Moonsighting\"").unwrap_err().to_string();
        assert!(e.contains("unknown calculation method `Moonsighting`"), "{e}");

        let e = with_override("[general]\nsocket = \"localhost\"").unwrap_err().to_string();
        assert!(e.contains("general.socket"), "{e}");
    }
}
