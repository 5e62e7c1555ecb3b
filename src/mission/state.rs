//! Mission progress, owned and mutated only by the map driver.

use crate::mission::route::Leg;

/// Where the mission currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    BridgeApproach,
    BridgeCrossing,
    ZoneEntry,
    Sweep(Leg),
    Detour(Leg),
    Return,
    Complete,
}

#[derive(Debug, Clone, Default)]
pub struct MissionState {
    round: usize,
    stage: Stage,
    /// Scans performed per leg in the current round
    progress: [usize; 4],
    detected: bool,
}

impl MissionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-round progress
    pub fn begin_round(&mut self, round: usize) {
        self.round = round;
        self.progress = [0; 4];
        self.detected = false;
        self.advance(Stage::BridgeApproach);
    }

    pub fn advance(&mut self, stage: Stage) {
        tracing::debug!("Round {}: {:?} -> {:?}", self.round + 1, self.stage, stage);
        self.stage = stage;
    }

    pub fn record_scan(&mut self, leg: Leg) {
        self.progress[leg.index()] += 1;
    }

    pub fn mark_detected(&mut self) {
        self.detected = true;
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn scans(&self, leg: Leg) -> usize {
        self.progress[leg.index()]
    }

    pub fn total_scans(&self) -> usize {
        self.progress.iter().sum()
    }

    pub fn detected(&self) -> bool {
        self.detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_resets_progress() {
        let mut state = MissionState::new();
        state.begin_round(0);
        state.record_scan(Leg::South);
        state.record_scan(Leg::East);
        state.mark_detected();
        assert_eq!(state.total_scans(), 2);

        state.begin_round(1);
        assert_eq!(state.round(), 1);
        assert_eq!(state.total_scans(), 0);
        assert!(!state.detected());
        assert_eq!(state.stage(), Stage::BridgeApproach);
    }
}
