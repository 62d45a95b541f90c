use std::sync::Arc;

use log::debug;
use tokio::sync::watch;

use common::prayer::PrayerConfig;
use common::server::CancelBehaviour;

/// The prayer configuration pushed by the server.
///
/// Empty until the first `SetConfig` arrives. Receivers are woken only when
/// the pushed [`CancelBehaviour`] asks for it, so a silent update is picked up
/// on the next table refresh instead of interrupting the countdown.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    tx: Arc<watch::Sender<Option<PrayerConfig>>>,
}

impl SharedConfig {
    pub fn new() -> SharedConfig {
        let (tx, _) = watch::channel(None);
        SharedConfig { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> Option<PrayerConfig> {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PrayerConfig>> {
        self.tx.subscribe()
    }

    /// Stores `config` and returns whether subscribers were notified.
    pub fn set(&self, config: PrayerConfig, behaviour: CancelBehaviour) -> bool {
        self.tx.send_if_modified(|current| {
            let init = current.is_none();
            let changed = current.as_ref() != Some(&config);
            *current = Some(config);
            let cancel = should_cancel(behaviour, changed, init);
            debug!("stored config. behaviour={behaviour:?} changed={changed} init={init} cancel={cancel}");
            cancel
        })
    }

    /// Waits for the first configuration.
    pub async fn initialized(&self) -> PrayerConfig {
        let mut rx = self.subscribe();
        loop {
            if let Some(config) = *rx.borrow_and_update() {
                return config;
            }
            // the sender lives in self, so this only returns on a change
            let _ = rx.changed().await;
        }
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        SharedConfig::new()
    }
}

/// The first configuration always interrupts, later ones per `behaviour`.
pub fn should_cancel(behaviour: CancelBehaviour, changed: bool, init: bool) -> bool {
    match (behaviour, changed, init) {
        (_, _, true) | (CancelBehaviour::Always, _, false) | (CancelBehaviour::IfUnequal, true, false) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::prayer::{ CalculationMethod, TimeFormat };

    use super::*;

    fn isna() -> PrayerConfig {
        PrayerConfig { calculation_method: CalculationMethod::Isna, ..PrayerConfig::default() }
    }

    #[test]
    fn cancel_table() {
        use CancelBehaviour::*;
        assert!(should_cancel(Never, false, true));
        assert!(should_cancel(Always, false, false));
        assert!(should_cancel(IfUnequal, true, false));
        assert!(!should_cancel(IfUnequal, false, false));
        assert!(!should_cancel(Never, true, false));
    }

    #[tokio::test]
    async fn first_config_wakes_waiters_even_when_never() {
        let shared = SharedConfig::new();
        assert_eq!(shared.get(), None);

        let waiter = {
            let shared = shared.clone();
            tokio::spawn(async move { shared.initialized().await })
        };
        tokio::task::yield_now().await;

        assert!(shared.set(isna(), CancelBehaviour::Never));
        let config = tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(config, isna());
    }

    #[tokio::test]
    async fn later_configs_honour_the_behaviour() {
        let shared = SharedConfig::new();
        shared.set(PrayerConfig::default(), CancelBehaviour::Always);
        let mut rx = shared.subscribe();
        rx.borrow_and_update();

        assert!(!shared.set(PrayerConfig::default(), CancelBehaviour::IfUnequal));
        assert!(!rx.has_changed().unwrap());

        // stored without waking anyone
        assert!(!shared.set(isna(), CancelBehaviour::Never));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(shared.get(), Some(isna()));

        let h12 = PrayerConfig { time_format: TimeFormat::H12, ..isna() };
        assert!(shared.set(h12, CancelBehaviour::IfUnequal));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(h12));

        assert!(shared.set(h12, CancelBehaviour::Always));
        assert!(rx.has_changed().unwrap());
    }
}
