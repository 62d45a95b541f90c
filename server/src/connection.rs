use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::{ Arc, Mutex, PoisonError };
use std::sync::atomic::{ AtomicU64, Ordering };

use chrono::Utc;
use futures::{ SinkExt, StreamExt };
use lazy_static::lazy_static;
use log::{ debug, info, warn };
use regex::Regex;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::broadcast::{ self, error::RecvError };
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::server::{ ErrorResponse, Request, Response };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;

use common::display::Message as DMsg;
use common::prayer::{ Coordinates, PrayerConfig, PrayerTimeCalculator };
use common::server::{ CancelBehaviour, Message as SMsg };

use crate::store::ConfigStore;

const UPDATE_CAPACITY: usize = 16;

lazy_static! {
    static ref NAME_REGEX: Regex = Regex::new(r"(?:^|&)name=(\w+)").unwrap();
    static ref LATITUDE_REGEX: Regex = Regex::new(r"(?:^|&)(?:lat|latitude)=([+-]?(?:[0-9]*[.])?[0-9]+)").unwrap();
    static ref LONGITUDE_REGEX: Regex = Regex::new(r"(?:^|&)(?:lon|longitude)=([+-]?(?:[0-9]*[.])?[0-9]+)").unwrap();
    static ref TIMEZONE_REGEX: Regex = Regex::new(r"(?:^|&)(?:tz|timezone)=([+-]?[0-9]+)").unwrap();
}

#[derive(Error, Debug)]
pub enum WebSocketError {
    #[error("handshake failed: {0}")]
    Handshake(tokio_tungstenite::tungstenite::Error),

    #[error("error upon next(): {0}")]
    Read(tokio_tungstenite::tungstenite::Error),

    #[error("error upon send(): {0}")]
    Write(tokio_tungstenite::tungstenite::Error),

    #[error("parse failed: {0}")]
    Parse(bincode::ErrorKind),

    #[error("serialize failed: {0}")]
    Serialize(bincode::ErrorKind),
}

/// What a display tells about itself in the handshake query.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInfo {
    pub name: String,
    pub coordinates: Option<Coordinates>,
}

/// `None` without a `name`. Coordinates are kept only when complete and valid;
/// a missing timezone is derived from the longitude.
pub fn parse_query(query: &str) -> Option<ClientInfo> {
    let name = NAME_REGEX.captures(query)?.get(1)?.as_str().to_string();

    let capture = |regex: &Regex| regex.captures(query).and_then(|c| c.get(1)).map(|m| m.as_str());
    let coordinates = match (capture(&LATITUDE_REGEX), capture(&LONGITUDE_REGEX)) {
        (Some(lat), Some(lon)) => match (lat.parse::<f64>(), lon.parse::<f64>()) {
            (Ok(lat), Ok(lon)) => {
                let tz = capture(&TIMEZONE_REGEX)
                    .and_then(|tz| tz.parse::<i32>().ok())
                    .unwrap_or((lon / 15.0).round() as i32);
                Coordinates::new(lat, lon, tz).ok()
            },
            _ => None,
        },
        _ => None,
    };

    Some(ClientInfo { name, coordinates })
}

#[derive(Debug, Clone, Copy)]
struct Pushed {
    from: u64,
    config: PrayerConfig,
}

/// State shared by every connection: the store and the fan-out of updates.
pub struct Hub {
    store: Arc<dyn ConfigStore>,
    updates: broadcast::Sender<Pushed>,
    push_behaviour: CancelBehaviour,
    next_id: AtomicU64,
    // held across a store update and its broadcast
    publishing: Mutex<()>,
}

impl Hub {
    pub fn new(store: Arc<dyn ConfigStore>, push_behaviour: CancelBehaviour) -> Hub {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Hub { store, updates, push_behaviour, next_id: AtomicU64::new(0), publishing: Mutex::new(()) }
    }

    pub fn config(&self) -> PrayerConfig {
        self.store.get()
    }

    /// Reply to `msg` from connection `from`. Accepted updates are also
    /// broadcast to every other connection, in the order they were stored.
    fn respond(&self, from: u64, msg: DMsg) -> SMsg {
        match msg {
            DMsg::RequestConfig => SMsg::SetConfig { config: self.store.get(), cancel_behaviour: CancelBehaviour::IfUnequal },
            DMsg::UpdateConfig(update) => {
                let _publishing = self.publishing.lock().unwrap_or_else(PoisonError::into_inner);
                match self.store.update(&update) {
                    Ok(config) => {
                        // no receivers is fine
                        let _ = self.updates.send(Pushed { from, config });
                        SMsg::SetConfig { config, cancel_behaviour: self.push_behaviour }
                    },
                    Err(e) => SMsg::Rejected { reason: e.to_string() },
                }
            },
        }
    }
}

pub async fn accept_connection(stream: TcpStream, addr: SocketAddr, hub: Arc<Hub>) {
    if let Err(e) = handle_connection(stream, addr, hub).await {
        match e {
            WebSocketError::Handshake(e) => warn!("{addr}: handshake failed. {e}"),
            e => warn!("{addr}: {e}"),
        }
    } else {
        debug!("{addr}: done.");
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, hub: Arc<Hub>) -> Result<(), WebSocketError> {
    let mut client = None;

    let callback = |req: &Request, response: Response| {
        let query = req.uri().query().unwrap_or("");
        debug!("query={query:?}");
        match parse_query(query) {
            Some(info) => {
                client = Some(info);
                Ok(response)
            },
            None => {
                let mut error = ErrorResponse::new(Some("name required".to_string()));
                *error.status_mut() = StatusCode::UNAUTHORIZED;
                Err(error)
            },
        }
    };

    let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
        .await
        .map_err(WebSocketError::Handshake)?;
    let ClientInfo { name, coordinates } = client.unwrap_or(ClientInfo { name: "unknown".to_string(), coordinates: None });

    match coordinates {
        Some(coordinates) => {
            match PrayerTimeCalculator::new(hub.config(), coordinates).and_then(|c| c.next_prayer(&Utc::now())) {
                Ok(next) => info!("{name} connected from {addr}. next prayer there is {} at {}", next.name, next.formatted_time),
                Err(e) => warn!("{name} connected from {addr}. cannot compute its next prayer. {e}"),
            }
        },
        None => info!("{name} connected from {addr}."),
    }

    let id = hub.next_id.fetch_add(1, Ordering::Relaxed);
    let mut updates = hub.updates.subscribe();
    let mut open = true;

    loop {
        tokio::select! {
            next = ws.next() => {
                match next {
                    Some(item) => {
                        match item.map_err(WebSocketError::Read)? {
                            Message::Binary(b) => {
                                let msg: DMsg = bincode::deserialize(&b)
                                    .map_err(|e| WebSocketError::Parse(*e))?;
                                debug!("{name} sent {msg:?}");
                                let reply = hub.respond(id, msg);
                                if open {
                                    send(&mut ws, &reply).await?;
                                }
                            },
                            Message::Text(_) => {
                                debug!("{name} sent text. unsupported. closing connection.");
                                if open {
                                    open = false;
                                    ws.send(Message::Close(Some(CloseFrame {
                                        code: CloseCode::Unsupported,
                                        reason: Cow::Borrowed("text unsupported"),
                                    }))).await.map_err(WebSocketError::Write)?;
                                }
                            },
                            Message::Close(c) => {
                                debug!("received close frame {c:?}");
                                open = false;
                            },
                            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => { },
                        }
                    },
                    None => return Ok(()),
                }
            },
            pushed = updates.recv(), if open => {
                match pushed {
                    Ok(Pushed { from, config }) if from != id => {
                        debug!("pushing {config} to {name}");
                        send(&mut ws, &SMsg::SetConfig { config, cancel_behaviour: hub.push_behaviour }).await?;
                    },
                    Ok(_) => { },
                    Err(RecvError::Lagged(n)) => {
                        warn!("{name} missed {n} updates. pushing the current config.");
                        send(&mut ws, &SMsg::SetConfig { config: hub.config(), cancel_behaviour: hub.push_behaviour }).await?;
                    },
                    Err(RecvError::Closed) => return Ok(()),
                }
            },
        }
    }
}

async fn send(ws: &mut WebSocketStream<TcpStream>, msg: &SMsg) -> Result<(), WebSocketError> {
    let b = bincode::serialize(msg).map_err(|e| WebSocketError::Serialize(*e))?;
    ws.send(Message::Binary(b)).await.map_err(WebSocketError::Write)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio_tungstenite::{ MaybeTlsStream, tungstenite };

    use common::prayer::{ CalculationMethod, PrayerConfigUpdate };

    use super::*;
    use crate::store::{ MemStore, StoreError };

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    fn hub() -> Arc<Hub> {
        Arc::new(Hub::new(Arc::new(MemStore::default()), CancelBehaviour::IfUnequal))
    }

    fn makkah() -> PrayerConfigUpdate {
        PrayerConfigUpdate { calculation_method: Some(CalculationMethod::Makkah), ..PrayerConfigUpdate::default() }
    }

    async fn serve(hub: Arc<Hub>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                tokio::spawn(accept_connection(stream, peer, hub.clone()));
            }
        });
        addr
    }

    async fn connect(addr: SocketAddr, name: &str) -> Client {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/?name={name}")).await.unwrap();
        ws
    }

    async fn request(ws: &mut Client, msg: DMsg) -> SMsg {
        ws.send(Message::Binary(bincode::serialize(&msg).unwrap())).await.unwrap();
        receive(ws).await
    }

    async fn receive(ws: &mut Client) -> SMsg {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next()).await.unwrap().unwrap().unwrap();
        bincode::deserialize(&msg.into_data()).unwrap()
    }

    #[test]
    fn query_needs_a_name() {
        assert_eq!(parse_query(""), None);
        assert_eq!(parse_query("latitude=1&longitude=2"), None);
        assert_eq!(parse_query("nickname=x"), None);
        assert_eq!(parse_query("name=tottori"), Some(ClientInfo { name: "tottori".into(), coordinates: None }));
    }

    #[test]
    fn query_coordinates_in_long_and_short_form() {
        let info = parse_query("name=tottori&latitude=35.5011&longitude=134.2352&timezone=9").unwrap();
        assert_eq!(info.coordinates, Some(Coordinates::new(35.5011, 134.2352, 9).unwrap()));

        let info = parse_query("lat=-33.9&lon=18.4&tz=2&name=cape_town").unwrap();
        assert_eq!(info.name, "cape_town");
        assert_eq!(info.coordinates, Some(Coordinates::new(-33.9, 18.4, 2).unwrap()));
    }

    #[test]
    fn query_timezone_defaults_from_longitude_and_invalid_coordinates_are_dropped() {
        let info = parse_query("name=tottori&lat=35.5011&lon=134.2352").unwrap();
        assert_eq!(info.coordinates.unwrap().timezone, 9);

        assert_eq!(parse_query("name=x&lat=95&lon=10").unwrap().coordinates, None);
        assert_eq!(parse_query("name=x&lat=10").unwrap().coordinates, None);
    }

    #[test]
    fn respond_serves_updates_and_rejects_empty_ones() {
        let hub = hub();
        let mut updates = hub.updates.subscribe();

        assert_eq!(hub.respond(0, DMsg::RequestConfig),
            SMsg::SetConfig { config: PrayerConfig::default(), cancel_behaviour: CancelBehaviour::IfUnequal });

        assert!(matches!(hub.respond(0, DMsg::UpdateConfig(PrayerConfigUpdate::default())), SMsg::Rejected { .. }));
        assert!(updates.try_recv().is_err());

        let expected = makkah().apply(&PrayerConfig::default());
        assert_eq!(hub.respond(3, DMsg::UpdateConfig(makkah())),
            SMsg::SetConfig { config: expected, cancel_behaviour: CancelBehaviour::IfUnequal });
        let pushed = updates.try_recv().unwrap();
        assert_eq!((pushed.from, pushed.config), (3, expected));
        assert_eq!(hub.config(), expected);
    }

    /// Stalls after storing, the window in which a second update could overtake.
    struct SlowStore {
        inner: MemStore,
        stall: Duration,
    }

    impl ConfigStore for SlowStore {
        fn get(&self) -> PrayerConfig {
            self.inner.get()
        }

        fn update(&self, update: &PrayerConfigUpdate) -> Result<PrayerConfig, StoreError> {
            let config = self.inner.update(update)?;
            std::thread::sleep(self.stall);
            Ok(config)
        }
    }

    #[test]
    fn concurrent_updates_broadcast_in_store_order() {
        let store = SlowStore { inner: MemStore::default(), stall: Duration::from_millis(100) };
        let hub = Hub::new(Arc::new(store), CancelBehaviour::IfUnequal);
        let mut updates = hub.updates.subscribe();

        let karachi = PrayerConfigUpdate { calculation_method: Some(CalculationMethod::Karachi), ..PrayerConfigUpdate::default() };
        std::thread::scope(|s| {
            s.spawn(|| hub.respond(1, DMsg::UpdateConfig(makkah())));
            std::thread::sleep(Duration::from_millis(20));
            s.spawn(|| hub.respond(2, DMsg::UpdateConfig(karachi)));
        });

        let first = updates.try_recv().unwrap();
        let second = updates.try_recv().unwrap();
        assert_eq!((first.from, first.config.calculation_method), (1, CalculationMethod::Makkah));
        assert_eq!((second.from, second.config.calculation_method), (2, CalculationMethod::Karachi));
        assert_eq!(hub.config(), second.config);
    }

    #[tokio::test]
    async fn handshake_without_name_is_unauthorized() {
        let addr = serve(hub()).await;
        match tokio_tungstenite::connect_async(format!("ws://{addr}/?lat=1&lon=2")).await {
            Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), StatusCode::UNAUTHORIZED),
            Err(e) => panic!("expected 401, got {e}"),
            Ok(_) => panic!("expected 401, got a connection"),
        }
    }

    #[tokio::test]
    async fn updates_reach_the_caller_once_and_everyone_else() {
        let addr = serve(hub()).await;
        let mut admin = connect(addr, "admin").await;
        let mut display = connect(addr, "display").await;
        // both are subscribed once they got an answer
        request(&mut admin, DMsg::RequestConfig).await;
        request(&mut display, DMsg::RequestConfig).await;

        let expected = makkah().apply(&PrayerConfig::default());
        let reply = request(&mut admin, DMsg::UpdateConfig(makkah())).await;
        assert_eq!(reply, SMsg::SetConfig { config: expected, cancel_behaviour: CancelBehaviour::IfUnequal });

        assert_eq!(receive(&mut display).await, SMsg::SetConfig { config: expected, cancel_behaviour: CancelBehaviour::IfUnequal });

        // the admin's next message is the answer to its request, not an echo of its update
        let reply = request(&mut admin, DMsg::UpdateConfig(PrayerConfigUpdate::default())).await;
        assert_eq!(reply, SMsg::Rejected { reason: "update carries no fields".into() });
    }

    #[tokio::test]
    async fn text_frames_close_the_connection() {
        let addr = serve(hub()).await;
        let mut ws = connect(addr, "display").await;
        ws.send(Message::Text("config please".into())).await.unwrap();

        match tokio::time::timeout(Duration::from_secs(5), ws.next()).await.unwrap().unwrap().unwrap() {
            Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Unsupported),
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}
