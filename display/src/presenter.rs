//! The display loop: table, countdown, and what ends a countdown.

use std::sync::Arc;
use std::time::Duration;

use log::{ debug, error, info };
use tokio::sync::watch;
use tokio::time::sleep;

use common::clock::Clock;
use common::prayer::{ Coordinates, Prayer, PrayerConfig };

use crate::countdown::Countdown;
use crate::render::Render;
use crate::schedule::{ Day, ScheduleError };
use crate::state::SharedConfig;
use crate::sun;

/// Why a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Reached(Prayer),
    ConfigChanged,
    Refreshed,
}

pub struct Presenter {
    clock: Arc<dyn Clock>,
    shared: SharedConfig,
    changes: watch::Receiver<Option<PrayerConfig>>,
    config: PrayerConfig,
    coordinates: Coordinates,
    hijri_offset: i64,
    tick: Duration,
    refresh: Duration,
    shown: Option<Day>,
}

impl Presenter {
    /// `config` is used until the shared config holds one.
    pub fn new(clock: Arc<dyn Clock>, shared: SharedConfig, config: PrayerConfig, coordinates: Coordinates) -> Presenter {
        let mut changes = shared.subscribe();
        changes.borrow_and_update();

        Presenter {
            clock,
            shared,
            changes,
            config,
            coordinates,
            hijri_offset: 0,
            tick: Duration::from_secs(1),
            refresh: Duration::from_secs(60),
            shown: None,
        }
    }

    pub fn hijri_offset(mut self, days: i64) -> Presenter {
        self.hijri_offset = days;
        self
    }

    pub fn periods(mut self, tick: Duration, refresh: Duration) -> Presenter {
        self.tick = tick;
        self.refresh = refresh;
        self
    }

    pub async fn run(&mut self, render: &mut dyn Render) {
        loop {
            if let Err(e) = self.cycle(render).await {
                error!("unable to compute prayer times. {e}");
                tokio::select! {
                    () = sleep(self.refresh) => { },
                    Ok(()) = self.changes.changed() => {
                        self.changes.borrow_and_update();
                    },
                }
            }
        }
    }

    /// Shows the current day and counts down to its next prayer.
    ///
    /// Returns once the prayer is reached, the config changes, or the refresh
    /// period has passed. The table is only rendered again when it differs.
    pub async fn cycle(&mut self, render: &mut dyn Render) -> Result<Cycle, ScheduleError> {
        if let Some(config) = self.shared.get() {
            self.config = config;
        }

        let day = Day::compute(self.config, self.coordinates, self.hijri_offset, self.clock.now())?;

        if !self.shown.as_ref().map_or(false, |s| s.same_table(&day)) {
            debug!("sun is {}.", if sun::is_up(self.clock.now().timestamp_millis(), &self.coordinates) { "up" } else { "down" });
            if let Err(e) = render.table(&day).await {
                error!("unable to render table. {e}");
            }
        }

        let mut countdown = Countdown::start(day.next.clone(), self.clock.clone(), self.tick);
        let refresh = sleep(self.refresh);
        tokio::pin!(refresh);
        self.shown = Some(day);

        loop {
            tokio::select! {
                remaining = countdown.changed() => {
                    match remaining {
                        Some(remaining) => {
                            if let Err(e) = render.countdown(countdown.target(), remaining).await {
                                error!("unable to render countdown. {e}");
                            }
                        },
                        None => {
                            info!("time for {}.", countdown.target().name);
                            return Ok(Cycle::Reached(countdown.target().name));
                        },
                    }
                },
                Ok(()) = self.changes.changed() => {
                    info!("config changed with {} left until {}. restarting countdown.", countdown.remaining(), countdown.target().name);
                    self.changes.borrow_and_update();
                    return Ok(Cycle::ConfigChanged);
                },
                () = &mut refresh => {
                    debug!("refreshing prayer times.");
                    return Ok(Cycle::Refreshed);
                },
            }
        }
    }
}
