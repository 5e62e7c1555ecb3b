//! Simulated mission peripherals and object scanner

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use super::SimWorld;
use crate::drivers::{MissionPeripherals, ObjectScanner};
use crate::error::Result;
use crate::mission::ScanStatus;

/// Peripheral gesture, in the order it was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralEvent {
    Hold,
    Release,
    ClassifyColor,
    ClassifyWeight,
    CompletionCue,
}

/// Peripherals that only record and log what they were asked to do
#[derive(Default)]
pub struct RecordingPeripherals {
    events: Mutex<Vec<PeripheralEvent>>,
}

impl RecordingPeripherals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PeripheralEvent> {
        self.events.lock().clone()
    }

    fn record(&self, event: PeripheralEvent) -> Result<()> {
        tracing::info!("Peripheral: {:?}", event);
        self.events.lock().push(event);
        Ok(())
    }
}

impl MissionPeripherals for RecordingPeripherals {
    fn hold_payload(&self) -> Result<()> {
        self.record(PeripheralEvent::Hold)
    }

    fn release_payload(&self) -> Result<()> {
        self.record(PeripheralEvent::Release)
    }

    fn classify_color(&self) -> Result<()> {
        self.record(PeripheralEvent::ClassifyColor)
    }

    fn classify_weight(&self) -> Result<()> {
        self.record(PeripheralEvent::ClassifyWeight)
    }

    fn completion_cue(&self) -> Result<()> {
        self.record(PeripheralEvent::CompletionCue)
    }
}

/// Object detector looking into the simulated world
pub struct SimScanner {
    world: Arc<SimWorld>,
    poll_interval: Duration,
}

impl SimScanner {
    pub fn new(world: Arc<SimWorld>) -> Self {
        Self {
            world,
            poll_interval: Duration::from_millis(5),
        }
    }
}

impl ObjectScanner for SimScanner {
    fn scan(&self, status: &ScanStatus) {
        while status.is_scanning() {
            if let Some((bearing, distance)) = self.world.detect_object() {
                tracing::debug!(
                    "Scanner: object at {:.1} deg, {:.1} cm",
                    bearing,
                    distance
                );
                status.report(bearing, distance);
                return;
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}
