//! Hand-off between the mission driver and a background object scanner.
//!
//! The driver calls [`ScanStatus::begin`], lets the scanner run for a fixed
//! wait, then calls [`ScanStatus::finish`]. A scanner that sees an object
//! calls [`ScanStatus::report`], which also clears the scanning flag. Only a
//! report made while scanning counts.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Atomic wrapper for f64 values.
/// Uses AtomicU64 with bit reinterpretation.
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(val: f64) -> Self {
        Self(AtomicU64::new(val.to_bits()))
    }

    pub fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.0.load(order))
    }

    pub fn store(&self, val: f64, order: Ordering) {
        self.0.store(val.to_bits(), order);
    }
}

/// Object seen by the scanner, relative to the robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Degrees from the robot heading, clockwise positive
    pub bearing: f64,
    /// Distance in cm
    pub distance: f64,
}

#[derive(Debug)]
pub struct ScanStatus {
    scanning: AtomicBool,
    found: AtomicBool,
    bearing: AtomicF64,
    distance: AtomicF64,
}

impl Default for ScanStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanStatus {
    pub fn new() -> Self {
        Self {
            scanning: AtomicBool::new(false),
            found: AtomicBool::new(false),
            bearing: AtomicF64::new(0.0),
            distance: AtomicF64::new(0.0),
        }
    }

    /// Arm a new scan and forget any earlier detection
    pub fn begin(&self) {
        self.found.store(false, Ordering::Release);
        self.scanning.store(true, Ordering::Release);
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Report an object. Ignored when no scan is in progress.
    pub fn report(&self, bearing: f64, distance: f64) -> bool {
        if self
            .scanning
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.bearing.store(bearing, Ordering::Relaxed);
        self.distance.store(distance, Ordering::Relaxed);
        self.found.store(true, Ordering::Release);
        true
    }

    /// Stop scanning and return what was found
    pub fn finish(&self) -> Option<Detection> {
        self.scanning.store(false, Ordering::Release);
        self.detection()
    }

    pub fn detection(&self) -> Option<Detection> {
        if !self.found.load(Ordering::Acquire) {
            return None;
        }
        Some(Detection {
            bearing: self.bearing.load(Ordering::Relaxed),
            distance: self.distance.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_during_scan() {
        let status = ScanStatus::new();
        status.begin();
        assert!(status.is_scanning());

        assert!(status.report(-12.0, 20.0));
        assert!(!status.is_scanning());
        assert_eq!(
            status.finish(),
            Some(Detection {
                bearing: -12.0,
                distance: 20.0
            })
        );
    }

    #[test]
    fn test_report_after_finish_is_ignored() {
        let status = ScanStatus::new();
        status.begin();
        assert_eq!(status.finish(), None);
        assert!(!status.report(5.0, 10.0));
        assert_eq!(status.detection(), None);
    }

    #[test]
    fn test_begin_clears_previous_detection() {
        let status = ScanStatus::new();
        status.begin();
        status.report(1.0, 2.0);
        status.begin();
        assert_eq!(status.detection(), None);
    }

    #[test]
    fn test_report_from_another_thread() {
        let status = ScanStatus::new();
        status.begin();
        std::thread::scope(|s| {
            s.spawn(|| status.report(3.0, 4.0));
        });
        assert!(status.finish().is_some());
    }
}
