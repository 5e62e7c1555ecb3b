//! Pose estimator: periodic dead reckoning from wheel rotation counts.
//!
//! One cycle reads both tacho counts, turns the per-wheel change into arc
//! lengths, and advances the shared pose:
//!
//! ```text
//! dL = π·r·ΔL / 180        dR = π·r·ΔR / 180
//! d  = (dL + dR) / 2       dθ = (dL − dR) / track
//! x += d·sin(θ)            y += d·cos(θ)           θ = norm(θ + dθ)
//! ```
//!
//! θ is the heading held in the shared pose at the start of the cycle, so a
//! heading corrected by another component is used from the next cycle on.
//! The whole read-modify-write of a cycle happens under the pose lock; readers
//! never observe a half-updated pose.

use parking_lot::{Condvar, Mutex};
use std::f64::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::RobotConfig;
use crate::core::{Pose, WheelSample};
use crate::drivers::DriveBase;
use crate::error::{KhojError, Result};
use crate::utils::normalize_heading;

/// Wheel radius and track, with the conversions built on them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelGeometry {
    pub wheel_radius: f64,
    pub track: f64,
}

impl WheelGeometry {
    pub fn new(wheel_radius: f64, track: f64) -> Self {
        Self {
            wheel_radius,
            track,
        }
    }

    pub fn from_config(config: &RobotConfig) -> Self {
        Self::new(config.wheel_radius, config.track)
    }

    /// Ground distance covered by `degrees` of wheel rotation
    #[inline]
    pub fn arc_length(&self, degrees: f64) -> f64 {
        PI * self.wheel_radius * degrees / 180.0
    }

    /// Wheel rotation (degrees) that covers `distance`
    #[inline]
    pub fn rotation_for_distance(&self, distance: f64) -> f64 {
        180.0 * distance / (PI * self.wheel_radius)
    }

    /// Wheel rotation (degrees) that spins the body in place by `angle` degrees
    #[inline]
    pub fn rotation_for_turn(&self, angle: f64) -> f64 {
        self.rotation_for_distance(PI * self.track * angle / 360.0)
    }
}

/// Pose increment of one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseDelta {
    pub dx: f64,
    pub dy: f64,
    /// Degrees, clockwise positive
    pub dheading: f64,
}

/// Dead-reckoning increment for wheel changes `left`/`right` (degrees) at `heading`
pub fn dead_reckon(geometry: &WheelGeometry, heading: f64, left: i32, right: i32) -> PoseDelta {
    let dist_left = geometry.arc_length(left as f64);
    let dist_right = geometry.arc_length(right as f64);

    let distance = 0.5 * (dist_left + dist_right);
    let dtheta = (dist_left - dist_right) / geometry.track;
    let theta = heading.to_radians();

    PoseDelta {
        dx: distance * theta.sin(),
        dy: distance * theta.cos(),
        dheading: dtheta.to_degrees(),
    }
}

/// Pose shared between the estimator and its readers/correctors.
#[derive(Debug, Default)]
pub struct SharedPose(Mutex<Pose>);

impl SharedPose {
    pub fn new(pose: Pose) -> Self {
        Self(Mutex::new(pose))
    }

    pub fn get(&self) -> Pose {
        *self.0.lock()
    }

    pub fn set(&self, pose: Pose) {
        *self.0.lock() = Pose::new(pose.x, pose.y, pose.heading);
    }

    pub fn set_heading(&self, heading: f64) {
        self.0.lock().heading = normalize_heading(heading);
    }

    pub fn set_position(&self, x: f64, y: f64) {
        let mut pose = self.0.lock();
        pose.x = x;
        pose.y = y;
    }

    /// Atomic read-modify-write
    pub fn update<F: FnOnce(&mut Pose)>(&self, f: F) -> Pose {
        let mut pose = self.0.lock();
        f(&mut pose);
        pose.heading = normalize_heading(pose.heading);
        *pose
    }
}

/// Counters published by the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EstimatorStats {
    pub cycles: u64,
    pub overruns: u64,
    pub read_errors: u64,
}

/// Periodic dead-reckoning estimator.
pub struct PoseEstimator {
    drive: DriveBase,
    geometry: WheelGeometry,
    period: Duration,
    pose: SharedPose,
    /// Previous counts, kept only to form the next delta
    last_sample: Mutex<WheelSample>,
    running: AtomicBool,
    completed: Mutex<u64>,
    cycle_done: Condvar,
    overruns: AtomicU64,
    read_errors: AtomicU64,
}

impl PoseEstimator {
    /// Estimator at the origin pose. Wheel counts are taken as zero until
    /// [`PoseEstimator::rebase`] records a baseline.
    pub fn new(drive: DriveBase, geometry: WheelGeometry, period: Duration) -> Self {
        Self {
            drive,
            geometry,
            period,
            pose: SharedPose::new(Pose::origin()),
            last_sample: Mutex::new(WheelSample::default()),
            running: AtomicBool::new(false),
            completed: Mutex::new(0),
            cycle_done: Condvar::new(),
            overruns: AtomicU64::new(0),
            read_errors: AtomicU64::new(0),
        }
    }

    pub fn geometry(&self) -> &WheelGeometry {
        &self.geometry
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Consistent snapshot of the current pose
    pub fn pose(&self) -> Pose {
        self.pose.get()
    }

    /// Overwrite the full pose
    pub fn set_pose(&self, pose: Pose) {
        self.pose.set(pose);
    }

    /// Overwrite the heading only
    pub fn set_heading(&self, heading: f64) {
        self.pose.set_heading(heading);
    }

    /// Overwrite the position only
    pub fn set_position(&self, x: f64, y: f64) {
        self.pose.set_position(x, y);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> EstimatorStats {
        EstimatorStats {
            cycles: *self.completed.lock(),
            overruns: self.overruns.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }

    /// Take the current wheel counts as the baseline for the next cycle
    pub fn rebase(&self) -> Result<()> {
        let sample = self.drive.sample()?;
        *self.last_sample.lock() = sample;
        Ok(())
    }

    /// Run one estimation cycle.
    pub fn update(&self) -> Result<Pose> {
        let sample = self.drive.sample()?;

        let mut last = self.last_sample.lock();
        let (left, right) = sample.delta(&last);
        *last = sample;

        let geometry = self.geometry;
        Ok(self.pose.update(|pose| {
            let delta = dead_reckon(&geometry, pose.heading, left, right);
            pose.x += delta.dx;
            pose.y += delta.dy;
            pose.heading += delta.dheading;
        }))
    }

    /// Bring the pose up to date with motion that has already happened.
    ///
    /// With the periodic task running, waits (at most ten periods) for a full
    /// cycle to complete after this call. Otherwise runs one cycle inline.
    pub fn sync(&self) -> Result<()> {
        if !self.is_running() {
            return self.update().map(|_| ());
        }
        let deadline = Instant::now() + self.period * 10;
        let mut completed = self.completed.lock();
        // The cycle in flight may have sampled before this call
        let target = *completed + 2;
        while *completed < target {
            if self
                .cycle_done
                .wait_until(&mut completed, deadline)
                .timed_out()
            {
                tracing::warn!("Pose estimator sync timed out");
                break;
            }
        }
        Ok(())
    }

    fn finish_cycle(&self) {
        let mut completed = self.completed.lock();
        *completed += 1;
        self.cycle_done.notify_all();
    }

    /// Periodic loop; returns when `shutdown` is set.
    fn run(&self, shutdown: &AtomicBool) {
        tracing::info!(
            "Pose estimator started (period {:?})",
            self.period
        );

        while !shutdown.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            if let Err(e) = self.update() {
                let errors = self.read_errors.fetch_add(1, Ordering::Relaxed) + 1;
                if errors == 1 || errors % 100 == 0 {
                    tracing::warn!("Pose estimator read failed ({} total): {}", errors, e);
                }
            }
            self.finish_cycle();

            // Overrun: start the next cycle immediately
            let elapsed = cycle_start.elapsed();
            if elapsed < self.period {
                thread::sleep(self.period - elapsed);
            } else {
                let overruns = self.overruns.fetch_add(1, Ordering::Relaxed) + 1;
                if overruns == 1 || overruns % 100 == 0 {
                    tracing::debug!(
                        "Pose estimator overran its period: {:?} ({} total)",
                        elapsed,
                        overruns
                    );
                }
            }
        }

        let stats = self.stats();
        tracing::info!(
            "Pose estimator stopped after {} cycles ({} overruns)",
            stats.cycles,
            stats.overruns
        );
    }

    /// Start the periodic task on its own thread.
    pub fn spawn(self: &Arc<Self>) -> Result<EstimatorHandle> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(KhojError::AlreadyInitialized);
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let estimator = Arc::clone(self);
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("pose-estimator".to_string())
            .spawn(move || {
                estimator.run(&thread_shutdown);
                estimator.running.store(false, Ordering::Release);
            });

        match handle {
            Ok(handle) => Ok(EstimatorHandle {
                shutdown,
                handle: Some(handle),
            }),
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }
}

/// Owner of the estimator thread. Dropping it stops the thread.
pub struct EstimatorHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EstimatorHandle {
    /// Signal the thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Pose estimator thread panicked");
            }
        }
    }
}

impl Drop for EstimatorHandle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
