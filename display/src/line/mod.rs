//! Websocket connection to the configuration server.

use std::borrow::Cow;
use std::time::Duration;

use futures::{ SinkExt, StreamExt };
use log::{ debug, error, info, warn };
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{ self, Receiver, Sender };
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{ MaybeTlsStream, WebSocketStream, tungstenite::Message };
use url::Url;

use common::display::Message as DMsg;
use common::prayer::{ Coordinates, PrayerConfig };
use common::server::Message as SMsg;

use crate::state::SharedConfig;

const CONNECTION_FAILURE_RETRY_SLEEP: &[f64] = &[1.0, 1.0, 1.0, 10.0, 30.0, 60.0];
const CONFIG_REQUEST_INTERVAL: Duration = Duration::from_secs(10);

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Error, Debug)]
enum LineError {
    #[error("websocket error. {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("unable to serialize message. {0}")]
    Serialize(#[from] bincode::Error),
}

enum SessionEnd {
    Remote,
    Stopped,
}

/// Keeps a connection to the server open and stores every pushed config in a [`SharedConfig`].
pub struct Line {
    handle: JoinHandle<()>,
    request_config_tx: Sender<()>,
    config: SharedConfig,
}

impl Line {
    pub fn new(url: Url, config: SharedConfig) -> Line {
        let (request_config_tx, request_config_rx) = mpsc::channel(1);
        let handle = {
            let config = config.clone();
            tokio::spawn(async move {
                worker(url, config, request_config_rx).await;
            })
        };
        Line { handle, request_config_tx, config }
    }

    /// Waits for the first config, asking again every 10s while none arrived.
    pub async fn init_config(&self) -> PrayerConfig {
        let initialized = self.config.initialized();
        tokio::pin!(initialized);
        loop {
            tokio::select! {
                config = &mut initialized => return config,
                () = sleep(CONFIG_REQUEST_INTERVAL) => {
                    if self.request_config_tx.try_send(()).is_ok() {
                        debug!("still waiting for config. requested again.");
                    }
                },
            }
        }
    }
}

impl Drop for Line {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// `base` with the display's name and coordinates as handshake query.
pub fn handshake_url(base: &Url, name: &str, coordinates: &Coordinates) -> Url {
    let mut url = base.clone();
    url.set_query(Some(format!("name={name}&latitude={lat}&longitude={lon}&timezone={tz}",
        lat = coordinates.latitude,
        lon = coordinates.longitude,
        tz = coordinates.timezone,
    ).as_str()));
    url
}

fn retry_delay(failure_cnt: usize) -> Duration {
    let secs = CONNECTION_FAILURE_RETRY_SLEEP.get(failure_cnt.saturating_sub(1))
        .or(CONNECTION_FAILURE_RETRY_SLEEP.last())
        .copied()
        .unwrap_or(1.0);
    Duration::from_secs_f64(secs)
}

async fn worker(url: Url, config: SharedConfig, mut request_config_rx: Receiver<()>) {
    let mut failure_cnt = 0;
    loop {
        let mut ws = match tokio_tungstenite::connect_async(&url).await {
            Ok((ws, _)) => {
                info!("connected to {url}");
                failure_cnt = 0;
                ws
            },
            Err(e) => {
                failure_cnt += 1;
                let delay = retry_delay(failure_cnt);
                warn!("failed to connect to {url} {failure_cnt} times so far. retry in {delay:?}. {e}");
                sleep(delay).await;
                continue;
            },
        };

        match session(&mut ws, &config, &mut request_config_rx).await {
            Ok(SessionEnd::Stopped) => {
                debug!("line stopped.");
                return;
            },
            Ok(SessionEnd::Remote) => warn!("remote disconnected."),
            Err(e) => warn!("dropping connection. {e}"),
        }
        sleep(retry_delay(1)).await;
    }
}

async fn session(ws: &mut Ws, config: &SharedConfig, request_config_rx: &mut Receiver<()>) -> Result<SessionEnd, LineError> {
    // also catches pushes missed while disconnected
    send(ws, &DMsg::RequestConfig).await?;
    let mut open = true;

    loop {
        tokio::select! {
            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Binary(b))) => {
                        match bincode::deserialize::<SMsg>(&b) {
                            Ok(SMsg::SetConfig { config: pushed, cancel_behaviour }) => {
                                info!("received config {pushed}.");
                                config.set(pushed, cancel_behaviour);
                            },
                            Ok(SMsg::Rejected { reason }) => warn!("server rejected request. {reason}"),
                            Err(e) => {
                                error!("cannot deserialize message. {e}");
                                if open {
                                    open = false;
                                    close(ws, format!("cannot deserialize message. {e}")).await?;
                                }
                            },
                        }
                    },
                    Some(Ok(Message::Text(_))) => {
                        debug!("received text. unsupported. closing connection.");
                        if open {
                            open = false;
                            close(ws, "text unsupported".to_string()).await?;
                        }
                    },
                    Some(Ok(Message::Close(c))) => {
                        debug!("received close frame. {c:?}");
                        open = false;
                    },
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => { },
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(SessionEnd::Remote),
                }
            },
            rq = request_config_rx.recv(), if open => {
                match rq {
                    Some(()) => send(ws, &DMsg::RequestConfig).await?,
                    None => return Ok(SessionEnd::Stopped),
                }
            },
        }
    }
}

async fn send(ws: &mut Ws, msg: &DMsg) -> Result<(), LineError> {
    ws.send(Message::Binary(bincode::serialize(msg)?)).await?;
    debug!("sent {msg:?}");
    Ok(())
}

async fn close(ws: &mut Ws, reason: String) -> Result<(), LineError> {
    ws.send(Message::Close(Some(CloseFrame {
        code: CloseCode::Unsupported,
        reason: Cow::Owned(reason),
    }))).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use common::prayer::{ CalculationMethod, HighLatitudeRule };
    use common::server::CancelBehaviour;
    use tokio::net::TcpListener;

    use super::*;

    async fn server() -> (TcpListener, Url) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("ws://{}/", listener.local_addr().unwrap())).unwrap();
        (listener, url)
    }

    async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
        let (stream, _) = listener.accept().await.unwrap();
        tokio_tungstenite::accept_async(stream).await.unwrap()
    }

    #[test]
    fn handshake_carries_name_and_coordinates() {
        let base = Url::parse("ws://127.0.0.1:9001").unwrap();
        let url = handshake_url(&base, "tottori", &Coordinates::new(35.5011, 134.2352, 9).unwrap());
        assert_eq!(url.query(), Some("name=tottori&latitude=35.5011&longitude=134.2352&timezone=9"));
    }

    #[test]
    fn retry_delay_backs_off_and_saturates() {
        let delays: Vec<u64> = (1..=8).map(|n| retry_delay(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 1, 1, 10, 30, 60, 60, 60]);
    }

    #[tokio::test]
    async fn requests_and_stores_the_config() {
        let (listener, url) = server().await;
        let shared = SharedConfig::new();
        let line = Line::new(url, shared.clone());
        let mut ws = accept(&listener).await;

        let request = ws.next().await.unwrap().unwrap();
        assert_eq!(bincode::deserialize::<DMsg>(&request.into_data()).unwrap(), DMsg::RequestConfig);

        let pushed = PrayerConfig {
            calculation_method: CalculationMethod::Karachi,
            adjust_high_lats: HighLatitudeRule::OneSeventh,
            ..PrayerConfig::default()
        };
        let msg = SMsg::SetConfig { config: pushed, cancel_behaviour: CancelBehaviour::Never };
        ws.send(Message::Binary(bincode::serialize(&msg).unwrap())).await.unwrap();

        let config = tokio::time::timeout(Duration::from_secs(5), line.init_config()).await.unwrap();
        assert_eq!(config, pushed);
        assert_eq!(shared.get(), Some(pushed));
    }

    #[tokio::test]
    async fn closes_on_text_frames() {
        let (listener, url) = server().await;
        let _line = Line::new(url, SharedConfig::new());
        let mut ws = accept(&listener).await;
        ws.next().await.unwrap().unwrap();

        ws.send(Message::Text("hello".into())).await.unwrap();

        match ws.next().await.unwrap().unwrap() {
            Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Unsupported),
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}
