//! Map driver: the mission state machine.

use crate::config::MissionConfig;
use crate::core::Waypoint;
use crate::drivers::{MissionPeripherals, ObjectScanner};
use crate::error::Result;
use crate::mission::route::{BridgePlan, Leg, object_position};
use crate::mission::scan::{Detection, ScanStatus};
use crate::mission::state::{MissionState, Stage};
use crate::navigation::Motion;

/// How a search round ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundOutcome {
    NoFind,
    Retrieved {
        leg: Leg,
        /// Tile the object was seen from
        tile: Waypoint,
        /// Estimated object position in tiles
        object: Waypoint,
    },
}

pub struct MapDriver<'a, M: Motion> {
    motion: &'a M,
    peripherals: &'a dyn MissionPeripherals,
    scanner: &'a dyn ObjectScanner,
    config: MissionConfig,
    tile_size: f64,
    bridge: BridgePlan,
    status: ScanStatus,
    state: MissionState,
}

impl<'a, M: Motion> MapDriver<'a, M> {
    pub fn new(
        motion: &'a M,
        peripherals: &'a dyn MissionPeripherals,
        scanner: &'a dyn ObjectScanner,
        config: MissionConfig,
        tile_size: f64,
    ) -> Self {
        let bridge = BridgePlan::for_transit(&config.transit);
        Self {
            motion,
            peripherals,
            scanner,
            config,
            tile_size,
            bridge,
            status: ScanStatus::new(),
            state: MissionState::new(),
        }
    }

    pub fn state(&self) -> &MissionState {
        &self.state
    }

    pub fn bridge(&self) -> &BridgePlan {
        &self.bridge
    }

    /// Run every configured round
    pub fn drive(&mut self) -> Result<Vec<RoundOutcome>> {
        let mut outcomes = Vec::with_capacity(self.config.rounds);
        for round in 0..self.config.rounds {
            let outcome = self.run_round(round)?;
            tracing::info!("Round {} finished: {:?}", round + 1, outcome);
            outcomes.push(outcome);
        }
        self.state.advance(Stage::Complete);
        Ok(outcomes)
    }

    /// One pass: bridge, zone entry, perimeter sweep, then retrieval or return.
    pub fn run_round(&mut self, round: usize) -> Result<RoundOutcome> {
        self.state.begin_round(round);
        self.move_to_bridge()?;
        self.cross_bridge()?;
        self.enter_search_zone()?;

        let outcome = self.sweep()?;
        if outcome == RoundOutcome::NoFind {
            self.return_across_bridge()?;
        }
        Ok(outcome)
    }

    fn travel(&self, to: Waypoint) -> Result<()> {
        self.motion.travel_to(to.x, to.y)
    }

    fn move_to_bridge(&mut self) -> Result<()> {
        self.state.advance(Stage::BridgeApproach);
        self.peripherals.hold_payload()?;
        self.travel(self.bridge.approach)?;
        self.travel(self.bridge.entrance)
    }

    fn cross_bridge(&mut self) -> Result<()> {
        self.state.advance(Stage::BridgeCrossing);
        self.travel(self.bridge.far_bank)?;
        self.peripherals.release_payload()
    }

    fn enter_search_zone(&mut self) -> Result<()> {
        self.state.advance(Stage::ZoneEntry);
        self.travel(self.config.search.lower_left.into())?;
        self.motion.turn_to(Leg::South.scan_heading())
    }

    /// Visit every perimeter tile leg by leg; stop at the first detection.
    fn sweep(&mut self) -> Result<RoundOutcome> {
        let zone = self.config.search;
        for leg in Leg::ALL {
            self.state.advance(Stage::Sweep(leg));
            for tile in leg.tiles(&zone) {
                self.travel(tile)?;
                self.motion.turn_to(leg.scan_heading())?;
                self.state.record_scan(leg);

                if let Some(detection) = self.scan() {
                    tracing::info!(
                        "Object seen from ({}, {}) on {:?} leg: {:.1} deg, {:.1} cm",
                        tile.x,
                        tile.y,
                        leg,
                        detection.bearing,
                        detection.distance
                    );
                    return self.retrieve(leg, tile, detection);
                }
            }
        }
        tracing::info!(
            "Perimeter swept ({} scans), nothing found",
            self.state.total_scans()
        );
        Ok(RoundOutcome::NoFind)
    }

    /// Run the scanner for the fixed wait, then stop it.
    fn scan(&self) -> Option<Detection> {
        let scanner = self.scanner;
        let status = &self.status;
        status.begin();
        std::thread::scope(|s| {
            s.spawn(move || scanner.scan(status));
            std::thread::sleep(self.config.scan_duration());
            status.finish();
        });
        status.detection()
    }

    fn retrieve(&mut self, leg: Leg, tile: Waypoint, detection: Detection) -> Result<RoundOutcome> {
        self.state.mark_detected();
        self.state.advance(Stage::Detour(leg));

        let origin = self.motion.pose().to_tiles(self.tile_size);
        let object = object_position(leg, origin, detection, self.tile_size);
        tracing::info!("Retrieving object at ({:.2}, {:.2})", object.x, object.y);

        self.travel(object)?;
        self.peripherals.classify_color()?;
        self.peripherals.classify_weight()?;
        self.travel(origin)?;

        self.state.advance(Stage::Return);
        for corner in leg.return_route(&self.config.search) {
            self.travel(corner)?;
        }
        self.travel(self.bridge.far_bank)?;
        self.travel(self.bridge.entrance)?;
        self.travel(self.config.home)?;
        self.peripherals.release_payload()?;
        self.peripherals.completion_cue()?;

        Ok(RoundOutcome::Retrieved { leg, tile, object })
    }

    /// After an empty sweep the robot is back at the lower-left corner; cross
    /// back so the next round starts from the home side.
    fn return_across_bridge(&mut self) -> Result<()> {
        self.state.advance(Stage::Return);
        self.travel(self.config.search.lower_left.into())?;
        self.travel(self.bridge.far_bank)?;
        self.travel(self.bridge.entrance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissionConfig;
    use crate::core::{GridPoint, Pose, Zone};
    use crate::devices::mock::{PeripheralEvent, RecordingPeripherals};
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Command {
        Travel(Waypoint),
        Turn(f64),
    }

    /// Motion that teleports and records every command
    struct RecordingMotion {
        tile_size: f64,
        pose: RefCell<Pose>,
        log: RefCell<Vec<Command>>,
    }

    impl RecordingMotion {
        fn new() -> Self {
            Self {
                tile_size: 30.48,
                pose: RefCell::new(Pose::origin()),
                log: RefCell::new(Vec::new()),
            }
        }

        fn travels(&self) -> Vec<Waypoint> {
            self.log
                .borrow()
                .iter()
                .filter_map(|c| match c {
                    Command::Travel(w) => Some(*w),
                    Command::Turn(_) => None,
                })
                .collect()
        }
    }

    impl Motion for RecordingMotion {
        fn pose(&self) -> Pose {
            *self.pose.borrow()
        }

        fn travel_to(&self, x: f64, y: f64) -> Result<()> {
            let heading = self.pose.borrow().heading;
            *self.pose.borrow_mut() = Pose::new(x * self.tile_size, y * self.tile_size, heading);
            self.log.borrow_mut().push(Command::Travel(Waypoint::new(x, y)));
            Ok(())
        }

        fn turn_to(&self, heading: f64) -> Result<()> {
            self.pose.borrow_mut().heading = heading;
            self.log.borrow_mut().push(Command::Turn(heading));
            Ok(())
        }
    }

    /// Finds an object on the n-th scan (counting from 0), if any
    struct ScriptedScanner {
        find_on: Option<usize>,
        detection: Detection,
        calls: AtomicUsize,
    }

    impl ScriptedScanner {
        fn new(find_on: Option<usize>, bearing: f64, distance: f64) -> Self {
            Self {
                find_on,
                detection: Detection { bearing, distance },
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ObjectScanner for ScriptedScanner {
        fn scan(&self, status: &ScanStatus) {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.find_on == Some(call) {
                status.report(self.detection.bearing, self.detection.distance);
                return;
            }
            while status.is_scanning() {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    fn mission(rounds: usize) -> MissionConfig {
        MissionConfig {
            rounds,
            scan_duration_ms: 20,
            home: Waypoint::new(0.5, 0.5),
            transit: Zone::new(GridPoint::new(1, 2), GridPoint::new(3, 3)).unwrap(),
            search: Zone::new(GridPoint::new(3, 2), GridPoint::new(6, 4)).unwrap(),
        }
    }

    fn scan_tiles(motion: &RecordingMotion) -> Vec<(Waypoint, f64)> {
        let log = motion.log.borrow();
        log.windows(2)
            .filter_map(|w| match (w[0], w[1]) {
                (Command::Travel(t), Command::Turn(h)) => Some((t, h)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_round_scans_every_perimeter_tile_once() {
        let motion = RecordingMotion::new();
        let peripherals = RecordingPeripherals::new();
        let scanner = ScriptedScanner::new(None, 0.0, 0.0);
        let mut driver = MapDriver::new(&motion, &peripherals, &scanner, mission(1), 30.48);

        let outcomes = driver.drive().unwrap();
        assert_eq!(outcomes, vec![RoundOutcome::NoFind]);

        let state = driver.state();
        assert_eq!(state.total_scans(), 10);
        assert_eq!(state.scans(Leg::South), 3);
        assert_eq!(state.scans(Leg::East), 2);
        assert_eq!(state.scans(Leg::North), 3);
        assert_eq!(state.scans(Leg::West), 2);
        assert!(!state.detected());
        assert_eq!(state.stage(), Stage::Complete);
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 10);

        // Zone entry turn plus one scan turn per tile
        let scans = scan_tiles(&motion);
        let expected: Vec<(Waypoint, f64)> = Leg::ALL
            .iter()
            .flat_map(|leg| {
                leg.tiles(&mission(1).search)
                    .into_iter()
                    .map(move |t| (t, leg.scan_heading()))
            })
            .collect();
        assert_eq!(&scans[1..], &expected[..]);

        assert_eq!(
            peripherals.events(),
            vec![PeripheralEvent::Hold, PeripheralEvent::Release]
        );
    }

    #[test]
    fn test_bridge_sequence_precedes_sweep() {
        let motion = RecordingMotion::new();
        let peripherals = RecordingPeripherals::new();
        let scanner = ScriptedScanner::new(None, 0.0, 0.0);
        let mut driver = MapDriver::new(&motion, &peripherals, &scanner, mission(1), 30.48);
        driver.run_round(0).unwrap();

        let travels = motion.travels();
        assert_eq!(
            &travels[..4],
            &[
                Waypoint::new(0.5, 2.5),
                Waypoint::new(1.0, 2.5),
                Waypoint::new(3.5, 2.5),
                Waypoint::new(3.0, 2.0),
            ]
        );
        // Back on the home side of the bridge
        assert_eq!(*travels.last().unwrap(), Waypoint::new(1.0, 2.5));
    }

    #[test]
    fn test_detection_retrieves_and_returns_home() {
        let motion = RecordingMotion::new();
        let peripherals = RecordingPeripherals::new();
        // Fifth scan is the second tile of the east leg, facing 0 degrees
        let scanner = ScriptedScanner::new(Some(4), 0.0, 30.48);
        let mut driver = MapDriver::new(&motion, &peripherals, &scanner, mission(1), 30.48);

        let outcomes = driver.drive().unwrap();
        let RoundOutcome::Retrieved { leg, tile, object } = outcomes[0] else {
            panic!("expected retrieval, got {:?}", outcomes[0]);
        };
        assert_eq!(leg, Leg::East);
        assert_eq!(tile, Waypoint::new(6.0, 3.0));
        approx::assert_relative_eq!(object.x, 6.0, epsilon = 1e-9);
        approx::assert_relative_eq!(object.y, 4.0, epsilon = 1e-9);

        let state = driver.state();
        assert_eq!(state.total_scans(), 5);
        assert!(state.detected());

        // Object, scan origin, east-leg corners, bridge, home
        let travels = motion.travels();
        let tail = &travels[travels.len() - 7..];
        approx::assert_relative_eq!(tail[0].y, 4.0, epsilon = 1e-9);
        approx::assert_relative_eq!(tail[1].x, 6.0, epsilon = 1e-9);
        approx::assert_relative_eq!(tail[1].y, 3.0, epsilon = 1e-9);
        assert_eq!(
            &tail[2..],
            &[
                Waypoint::new(6.0, 2.0),
                Waypoint::new(3.0, 2.0),
                Waypoint::new(3.5, 2.5),
                Waypoint::new(1.0, 2.5),
                Waypoint::new(0.5, 0.5),
            ]
        );

        assert_eq!(
            peripherals.events(),
            vec![
                PeripheralEvent::Hold,
                PeripheralEvent::Release,
                PeripheralEvent::ClassifyColor,
                PeripheralEvent::ClassifyWeight,
                PeripheralEvent::Release,
                PeripheralEvent::CompletionCue,
            ]
        );
    }

    #[test]
    fn test_runs_configured_rounds() {
        let motion = RecordingMotion::new();
        let peripherals = RecordingPeripherals::new();
        let scanner = ScriptedScanner::new(None, 0.0, 0.0);
        let mut driver = MapDriver::new(&motion, &peripherals, &scanner, mission(3), 30.48);

        let outcomes = driver.drive().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(scanner.calls.load(Ordering::SeqCst), 30);
        assert_eq!(driver.state().round(), 2);
    }
}
