//! # Battery Policy
//!
//! Two-state command decision driven by the last battery reading.
//!
//! | State | Condition | Commands |
//! |-------|-----------|----------|
//! | Normal | `battery >= threshold` | `Move` in a uniformly random direction |
//! | LowBattery | `battery < threshold` | `Stop`, then `Charge` |
//!
//! There is no hysteresis: a reading hovering around the threshold switches
//! state on every cycle.

use rand::Rng;

use crate::client::{Direction, RoverCommand};

/// Default low-battery threshold (percent)
pub const DEFAULT_LOW_BATTERY_THRESHOLD: f64 = 10.0;

/// Power state derived from a battery reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Normal,
    LowBattery,
}

/// Chooses the commands for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryPolicy {
    threshold: f64,
}

impl Default for BatteryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_BATTERY_THRESHOLD)
    }
}

impl BatteryPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify a battery reading; a NaN reading counts as `Normal`
    pub fn power_state(&self, battery: f64) -> PowerState {
        if battery < self.threshold {
            PowerState::LowBattery
        } else {
            PowerState::Normal
        }
    }

    /// Commands to issue, in order, for the given battery reading
    pub fn decide<R: Rng + ?Sized>(&self, battery: f64, rng: &mut R) -> Vec<RoverCommand> {
        match self.power_state(battery) {
            PowerState::LowBattery => vec![RoverCommand::Stop, RoverCommand::Charge],
            PowerState::Normal => {
                let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
                vec![RoverCommand::Move(direction)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_low_battery_stops_then_charges() {
        let policy = BatteryPolicy::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.decide(5.0, &mut rng), vec![RoverCommand::Stop, RoverCommand::Charge]);
        assert_eq!(policy.decide(-20.0, &mut rng), vec![RoverCommand::Stop, RoverCommand::Charge]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let policy = BatteryPolicy::default();
        assert_eq!(policy.power_state(10.0), PowerState::Normal);
        assert_eq!(policy.power_state(9.999), PowerState::LowBattery);
    }

    #[test]
    fn test_normal_battery_moves() {
        let policy = BatteryPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for battery in [10.0, 55.0, 100.0, 180.0] {
            let commands = policy.decide(battery, &mut rng);
            assert_eq!(commands.len(), 1);
            assert!(matches!(commands[0], RoverCommand::Move(_)));
        }
    }

    #[test]
    fn test_nan_battery_is_normal() {
        assert_eq!(BatteryPolicy::default().power_state(f64::NAN), PowerState::Normal);
    }

    #[test]
    fn test_every_direction_is_reachable() {
        let policy = BatteryPolicy::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            if let [RoverCommand::Move(direction)] = policy.decide(50.0, &mut rng)[..] {
                seen.insert(direction);
            }
        }

        assert_eq!(seen.len(), Direction::ALL.len());
    }

    #[test]
    fn test_no_hysteresis() {
        let policy = BatteryPolicy::new(20.0);
        let states: Vec<PowerState> = [19.0, 21.0, 19.5, 20.0]
            .iter()
            .map(|&b| policy.power_state(b))
            .collect();
        assert_eq!(
            states,
            vec![PowerState::LowBattery, PowerState::Normal, PowerState::LowBattery, PowerState::Normal]
        );
    }
}
