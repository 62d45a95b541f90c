mod config;
mod logging;

mod countdown;
mod line;
mod locale;
mod presenter;
mod render;
mod schedule;
mod state;
mod sun;

use std::sync::Arc;

use log::info;

use lazy_static::lazy_static;

use common::clock::{ Clock, SystemClock };
use config::Config;

use line::Line;
use presenter::Presenter;
use state::SharedConfig;

lazy_static!{
    static ref CONFIG: Config = Config::new();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // initializing logger
    logging::init();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut render = render::build(CONFIG.general.module, CONFIG.general.language);

    // the line is the only writer of the shared config
    let shared = SharedConfig::new();
    let url = line::handshake_url(&CONFIG.general.server_url, &CONFIG.general.name, &CONFIG.gps);
    let line = Line::new(url, shared.clone());

    info!("waiting for config from {}", CONFIG.general.server_url);
    let config = line.init_config().await;
    info!("using {config}");

    {
        let ms = clock.now().timestamp_millis();
        info!("sun is at {:.2}° at ({}, {})", sun::altitude(ms, &CONFIG.gps), CONFIG.gps.latitude, CONFIG.gps.longitude);
    }

    let mut presenter = Presenter::new(clock, shared, config, CONFIG.gps)
        .hijri_offset(CONFIG.general.hijri_offset)
        .periods(CONFIG.countdown.tick, CONFIG.countdown.refresh);
    presenter.run(render.as_mut()).await;
}
