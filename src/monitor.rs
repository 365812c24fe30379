use std::{future::Future, time::Duration};

use tokio::time::MissedTickBehavior;

use crate::{
    classifier::Classifier,
    db::{LogRecord, RecordStore},
    display::{self, DisplayDriver},
    sensor::SensorSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The reading failed or was not usable; nothing was shown or stored.
    SensorFailed,
    Completed { displayed: bool, stored: bool },
}

/// Owns the hardware and storage for the lifetime of the sampling loop.
#[derive(Debug)]
pub struct Monitor<S, D, L> {
    sensor: S,
    display: D,
    store: L,
    classifier: Classifier,
    period: Duration,
}

impl<S, D, L> Monitor<S, D, L>
where
    S: SensorSource,
    D: DisplayDriver,
    L: RecordStore,
{
    pub fn new(sensor: S, display: D, store: L, classifier: Classifier, period: Duration) -> Self {
        Self {
            sensor,
            display,
            store,
            classifier,
            period,
        }
    }

    /// One read → classify → display → log pass.
    pub fn cycle(&mut self) -> Outcome {
        let reading = match self.sensor.read() {
            Ok(reading) if reading.is_finite() => reading,
            Ok(reading) => {
                log::warn!("Discarding non-finite reading: {reading:?}");
                return Outcome::SensorFailed;
            }
            Err(e) => {
                log::warn!("Failed to read sensors: {e:#}");
                return Outcome::SensorFailed;
            }
        };

        let classification = self.classifier.classify(&reading);

        let displayed = match self.display.show(&display::render(&classification)) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to update LED matrix: {e:#}");
                false
            }
        };

        let record = LogRecord {
            reading,
            classification,
        };
        let stored = match self.store.insert(&record) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to insert data into database: {e:#}");
                false
            }
        };

        log::info!("{reading:?} {classification:?}");

        Outcome::Completed { displayed, stored }
    }

    /// Samples every period until `shutdown` resolves, then blanks the display.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Self {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.cycle();
                }
            }
        }

        log::info!("Shutting down");
        if let Err(e) = self.display.clear() {
            log::error!("Failed to clear LED matrix: {e:#}");
        }

        self
    }
}
