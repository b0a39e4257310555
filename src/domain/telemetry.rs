//! Telemetry Store
//!
//! Latest physiological readings reported by the device. Only the most recent
//! value per field is kept, and values survive a disconnect so the last known
//! reading stays visible.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetrySample {
    /// Beats per minute
    pub heart_rate: Option<f64>,
    /// SpO2 percentage
    pub blood_oxygen: Option<f64>,
    /// Degrees Celsius
    pub temperature: Option<f64>,
}

/// Shared, observable holder of the latest [`TelemetrySample`].
///
/// Cloning is cheap and every clone sees the same slots.
#[derive(Clone)]
pub struct TelemetryStore {
    tx: Arc<watch::Sender<TelemetrySample>>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TelemetrySample::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn set_heart_rate(&self, value: f64) {
        self.tx.send_modify(|s| s.heart_rate = Some(value));
    }

    pub fn set_blood_oxygen(&self, value: f64) {
        self.tx.send_modify(|s| s.blood_oxygen = Some(value));
    }

    pub fn set_temperature(&self, value: f64) {
        self.tx.send_modify(|s| s.temperature = Some(value));
    }

    pub fn heart_rate(&self) -> Option<f64> {
        self.tx.borrow().heart_rate
    }

    pub fn blood_oxygen(&self) -> Option<f64> {
        self.tx.borrow().blood_oxygen
    }

    pub fn temperature(&self) -> Option<f64> {
        self.tx.borrow().temperature
    }

    pub fn latest(&self) -> TelemetrySample {
        *self.tx.borrow()
    }

    /// Receiver notified on every update.
    pub fn subscribe(&self) -> watch::Receiver<TelemetrySample> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_start_empty() {
        let store = TelemetryStore::new();
        assert_eq!(store.latest(), TelemetrySample::default());
        assert_eq!(store.heart_rate(), None);
    }

    #[test]
    fn test_setters_touch_only_their_slot() {
        let store = TelemetryStore::new();
        store.set_heart_rate(77.0);
        assert_eq!(
            store.latest(),
            TelemetrySample {
                heart_rate: Some(77.0),
                blood_oxygen: None,
                temperature: None,
            }
        );

        store.set_temperature(36.6);
        store.set_heart_rate(80.0);
        assert_eq!(store.heart_rate(), Some(80.0));
        assert_eq!(store.temperature(), Some(36.6));
        assert_eq!(store.blood_oxygen(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let store = TelemetryStore::new();
        let view = store.clone();
        store.set_blood_oxygen(97.0);
        assert_eq!(view.blood_oxygen(), Some(97.0));
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let store = TelemetryStore::new();
        let mut rx = store.subscribe();

        store.set_heart_rate(65.0);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().heart_rate, Some(65.0));
    }
}
