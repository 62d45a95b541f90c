//! Live remaining time until a [`NextPrayer`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{ DateTime, FixedOffset, Utc };
use log::debug;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use common::clock::Clock;
use common::prayer::NextPrayer;

/// Whole seconds left, never negative.
///
/// Partial seconds count as a full one, so zero means the target is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Remaining {
    total: u64,
}

impl Remaining {
    pub fn between(now: DateTime<Utc>, target: &DateTime<FixedOffset>) -> Remaining {
        let millis = (target.with_timezone(&Utc) - now).num_milliseconds();
        let total = if millis <= 0 { 0 } else { (millis as u64 + 999) / 1000 };
        Remaining { total }
    }

    #[cfg(test)]
    pub fn from_secs(total: u64) -> Remaining {
        Remaining { total }
    }

    pub fn hours(&self) -> u64 {
        self.total / 3600
    }

    pub fn minutes(&self) -> u64 {
        self.total % 3600 / 60
    }

    pub fn seconds(&self) -> u64 {
        self.total % 60
    }

    pub fn is_zero(&self) -> bool {
        self.total == 0
    }

    pub fn is_less_than_hour(&self) -> bool {
        self.hours() == 0 && !self.is_zero()
    }
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours(), self.minutes(), self.seconds())
    }
}

/// Recomputes the remaining time once per tick on a background task.
///
/// The task ends by itself once the target is reached and is aborted when the
/// countdown is dropped.
pub struct Countdown {
    target: NextPrayer,
    rx: watch::Receiver<Remaining>,
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn start(target: NextPrayer, clock: Arc<dyn Clock>, tick: Duration) -> Countdown {
        let at = target.at;
        let (tx, rx) = watch::channel(Remaining::between(clock.now(), &at));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let remaining = Remaining::between(clock.now(), &at);
                if tx.send(remaining).is_err() || remaining.is_zero() {
                    break;
                }
            }
            debug!("countdown to {at} finished");
        });

        Countdown { target, rx, handle }
    }

    pub fn target(&self) -> &NextPrayer {
        &self.target
    }

    pub fn remaining(&self) -> Remaining {
        *self.rx.borrow()
    }

    #[cfg(test)]
    fn subscribe(&self) -> watch::Receiver<Remaining> {
        self.rx.clone()
    }

    /// Next recomputed value, `None` once the target has been reached.
    pub async fn changed(&mut self) -> Option<Remaining> {
        self.rx.changed().await.ok()?;
        let remaining = *self.rx.borrow_and_update();
        Some(remaining)
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Follows tokio's (pausable) time from a fixed start.
#[cfg(test)]
pub struct TokioClock {
    base: DateTime<Utc>,
    start: tokio::time::Instant,
}

#[cfg(test)]
impl TokioClock {
    pub fn new(base: DateTime<Utc>) -> TokioClock {
        TokioClock { base, start: tokio::time::Instant::now() }
    }
}

#[cfg(test)]
impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + chrono::Duration::from_std(self.start.elapsed()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use common::clock::ManualClock;
    use common::prayer::{ Coordinates, Prayer, PrayerConfig };

    use crate::schedule::Day;

    use super::*;

    fn tottori() -> Coordinates {
        Coordinates::new(35.5011, 134.2352, 9).unwrap()
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 6, 35, 57).unwrap()
    }

    fn next_prayer(at: DateTime<Utc>) -> NextPrayer {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        NextPrayer { name: Prayer::Asr, formatted_time: "15:36".into(), at: at.with_timezone(&offset) }
    }

    #[test]
    fn formats_and_clamps() {
        let target = next_prayer(base()).at;

        let r = Remaining::between(base() - chrono::Duration::seconds(3723), &target);
        assert_eq!(r.to_string(), "01:02:03");
        assert!(!r.is_less_than_hour());

        let r = Remaining::between(base() - chrono::Duration::milliseconds(59_999), &target);
        assert_eq!(r.to_string(), "00:01:00");
        assert!(r.is_less_than_hour());

        let r = Remaining::between(base() - chrono::Duration::milliseconds(500), &target);
        assert_eq!(r.to_string(), "00:00:01");
        assert!(!r.is_zero());

        let r = Remaining::between(base(), &target);
        assert_eq!(r.to_string(), "00:00:00");
        assert!(!r.is_less_than_hour());

        let r = Remaining::between(base() + chrono::Duration::hours(2), &target);
        assert!(r.is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_down_to_zero_then_finishes() {
        let clock = Arc::new(TokioClock::new(base()));
        let mut countdown = Countdown::start(next_prayer(base() + chrono::Duration::seconds(3)), clock, Duration::from_secs(1));
        assert_eq!(countdown.remaining(), Remaining::from_secs(3));

        let mut seen = Vec::new();
        while let Some(r) = countdown.changed().await {
            seen.push(r.to_string());
        }

        assert_eq!(seen, vec!["00:00:03", "00:00:02", "00:00:01", "00:00:00"]);
        assert!(countdown.remaining().is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn half_a_second_early_is_not_zero() {
        // 15:35:59.5 in Tottori, asr is at 15:36
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 6, 35, 59).unwrap() + chrono::Duration::milliseconds(500);
        let clock = Arc::new(ManualClock::new(now));
        let day = Day::compute(PrayerConfig::default(), tottori(), 0, clock.now()).unwrap();
        assert_eq!(day.next.name, Prayer::Asr);

        let mut countdown = Countdown::start(day.next.clone(), clock.clone(), Duration::from_secs(1));
        assert_eq!(countdown.remaining().to_string(), "00:00:01");
        assert_eq!(countdown.changed().await, Some(Remaining::from_secs(1)));

        clock.advance(chrono::Duration::milliseconds(500));
        assert_eq!(countdown.changed().await, Some(Remaining::default()));
        assert_eq!(countdown.changed().await, None);

        // once the countdown ends the schedule has moved on
        let day = Day::compute(PrayerConfig::default(), tottori(), 0, clock.now()).unwrap();
        assert_eq!(day.next.name, Prayer::Maghrib);
        assert!(!Remaining::between(clock.now(), &day.next.at).is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn past_target_starts_at_zero() {
        let clock = Arc::new(ManualClock::new(base() + chrono::Duration::minutes(5)));
        let mut countdown = Countdown::start(next_prayer(base()), clock, Duration::from_secs(1));

        assert!(countdown.remaining().is_zero());
        assert_eq!(countdown.changed().await, Some(Remaining::default()));
        assert_eq!(countdown.changed().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stops_the_task() {
        let clock = Arc::new(ManualClock::new(base()));
        let countdown = Countdown::start(next_prayer(base() + chrono::Duration::hours(1)), clock, Duration::from_secs(1));
        let mut rx = countdown.subscribe();
        rx.borrow_and_update();

        drop(countdown);

        let closed = tokio::time::timeout(Duration::from_secs(10), rx.changed()).await;
        assert!(matches!(closed, Ok(Err(_))));
    }
}
