mod config;
mod logging;

mod connection;
mod store;

use std::sync::Arc;

use log::{ debug, info, warn };
use lazy_static::lazy_static;
use tokio::net::TcpListener;

use config::Config;
use connection::Hub;
use store::{ ConfigStore, MemStore };

lazy_static!{
    static ref CONFIG: Config = Config::new();
}

#[tokio::main]
async fn main() {
    logging::init();

    let store: Arc<dyn ConfigStore> = Arc::new(MemStore::new(CONFIG.prayer.config()));
    let hub = Arc::new(Hub::new(store, CONFIG.general.push_behaviour));

    let listener = match TcpListener::bind(CONFIG.general.socket).await {
        Ok(l) => l,
        Err(e) => panic!("unable to bind {}. {e}", CONFIG.general.socket),
    };
    info!("listening on {} serving {}", CONFIG.general.socket, hub.config());

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("received new connection from {addr}");
                tokio::spawn(connection::accept_connection(stream, addr, hub.clone()));
            },
            Err(e) => warn!("accept failed. {e}"),
        }
    }
}
