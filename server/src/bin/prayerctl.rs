//! Reads or changes the prayer configuration served by a running server.

use std::process::ExitCode;
use std::time::Duration;

use clap::{ ArgGroup, Parser, Subcommand };
use futures::{ SinkExt, StreamExt };
use thiserror::Error;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use common::display::Message as DMsg;
use common::prayer::{ AsrJuristic, CalculationMethod, HighLatitudeRule, PrayerConfig, PrayerConfigUpdate, TimeFormat };
use common::server::Message as SMsg;

const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "prayerctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server to talk to
    #[arg(short = 'u', long = "url", value_name = "URL", default_value = "ws://127.0.0.1:9001", value_parser = parse_url)]
    url: Url,

    /// Name announced in the handshake
    #[arg(short = 'n', long = "name", default_value = "prayerctl")]
    name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current configuration
    Get,

    /// Change some fields of the configuration
    #[command(group(ArgGroup::new("fields").required(true).multiple(true)))]
    Set {
        /// MWL, ISNA, Egypt, Makkah, Karachi, Tehran or Jafari
        #[arg(long, group = "fields")]
        method: Option<CalculationMethod>,

        /// Standard or Hanafi
        #[arg(long, group = "fields")]
        asr: Option<AsrJuristic>,

        /// None, MidNight, OneSeventh or AngleBased
        #[arg(long = "high-lats", group = "fields")]
        high_lats: Option<HighLatitudeRule>,

        /// 24h or 12h
        #[arg(long, group = "fields")]
        format: Option<TimeFormat>,
    },
}

impl Command {
    fn message(&self) -> DMsg {
        match self {
            Command::Get => DMsg::RequestConfig,
            Command::Set { method, asr, high_lats, format } => DMsg::UpdateConfig(PrayerConfigUpdate {
                calculation_method: *method,
                asr_juristic: *asr,
                adjust_high_lats: *high_lats,
                time_format: *format,
            }),
        }
    }
}

#[derive(Error, Debug)]
enum CtlError {
    #[error("websocket error. {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("bincode error. {0}")]
    Bincode(#[from] bincode::Error),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("server closed the connection")]
    Closed,

    #[error("server rejected the request. {0}")]
    Rejected(String),
}

fn parse_url(s: &str) -> Result<Url, String> {
    match Url::parse(s) {
        Ok(u) if matches!(u.scheme(), "ws" | "wss") => Ok(u),
        Ok(_) => Err("expected a ws:// or wss:// url".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn handshake_url(base: &Url, name: &str) -> Url {
    let mut url = base.clone();
    url.set_query(Some(format!("name={name}").as_str()));
    url
}

fn describe(config: &PrayerConfig) -> String {
    format!("calculation_method = {method} ({description})\nasr_juristic       = {asr}\nadjust_high_lats   = {high_lats}\ntime_format        = {format}",
        method = config.calculation_method,
        description = config.calculation_method.description(),
        asr = config.asr_juristic,
        high_lats = config.adjust_high_lats,
        format = config.time_format,
    )
}

async fn run(cli: &Cli) -> Result<PrayerConfig, CtlError> {
    let (mut ws, _) = tokio_tungstenite::connect_async(&handshake_url(&cli.url, &cli.name)).await?;
    ws.send(Message::Binary(bincode::serialize(&cli.command.message())?)).await?;

    let reply = loop {
        let msg = tokio::time::timeout(REPLY_TIMEOUT, ws.next()).await
            .map_err(|_| CtlError::Timeout(REPLY_TIMEOUT))?
            .ok_or(CtlError::Closed)??;
        match msg {
            Message::Binary(b) => break bincode::deserialize::<SMsg>(&b)?,
            Message::Close(_) => return Err(CtlError::Closed),
            _ => { },
        }
    };
    // best effort, the reply is already in hand
    let _ = ws.close(None).await;

    match reply {
        SMsg::SetConfig { config, .. } => Ok(config),
        SMsg::Rejected { reason } => Err(CtlError::Rejected(reason)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(config) => {
            println!("{}", describe(&config));
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("prayerctl: {e}");
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_requests_the_config() {
        let cli = Cli::try_parse_from(["prayerctl", "get"]).unwrap();
        assert_eq!(cli.command.message(), DMsg::RequestConfig);
        assert_eq!(handshake_url(&cli.url, &cli.name).as_str(), "ws://127.0.0.1:9001/?name=prayerctl");
    }

    #[test]
    fn set_sends_only_the_given_fields() {
        let cli = Cli::try_parse_from(["prayerctl", "-u", "ws://10.0.0.2:9001", "set", "--method", "makkah", "--format", "12h"]).unwrap();
        assert_eq!(cli.url.host_str(), Some("10.0.0.2"));
        assert_eq!(cli.command.message(), DMsg::UpdateConfig(PrayerConfigUpdate {
            calculation_method: Some(CalculationMethod::Makkah),
            time_format: Some(TimeFormat::H12),
            ..PrayerConfigUpdate::default()
        }));
    }

    #[test]
    fn rejects_unknown_keys_and_empty_updates() {
        assert!(Cli::try_parse_from(["prayerctl", "set", "--method", "Moonsighting"]).is_err());
        assert!(Cli::try_parse_from(["prayerctl", "set", "--asr", "maliki"]).is_err());
        assert!(Cli::try_parse_from(["prayerctl", "set"]).is_err());
        assert!(Cli::try_parse_from(["prayerctl", "-u", "http://x", "get"]).is_err());
    }

    #[test]
    fn describes_every_field() {
        let text = describe(&PrayerConfig::default());
        assert!(text.starts_with("calculation_method = MWL ("));
        assert!(text.ends_with("time_format        = 24h"));
    }
}
