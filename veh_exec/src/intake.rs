//! Intake roller demands

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use veh_if::{
    eqpt::{ActId, MechDems},
    mission::IntakeSpeed,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Set both intake rollers to the given speed.
///
/// The rollers face each other so the right one always runs opposite to the left.
pub fn set_intake(dems: &mut MechDems, speed: IntakeSpeed) {
    let left = speed.roller_speed();

    dems.set_speed(ActId::IntakeL, left);
    dems.set_speed(ActId::IntakeR, -left);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_intake() {
        let mut dems = MechDems::new();

        set_intake(&mut dems, IntakeSpeed::Full);
        assert_eq!(dems.speed[&ActId::IntakeL], 127.0);
        assert_eq!(dems.speed[&ActId::IntakeR], -127.0);

        set_intake(&mut dems, IntakeSpeed::ReverseHalf);
        assert!((dems.speed[&ActId::IntakeL] + 50.8).abs() < 1e-9);
        assert!((dems.speed[&ActId::IntakeR] - 50.8).abs() < 1e-9);

        set_intake(&mut dems, IntakeSpeed::TwoThirds);
        assert_eq!(dems.speed[&ActId::IntakeL], 84.0);
        assert_eq!(dems.speed[&ActId::IntakeR], -84.0);

        set_intake(&mut dems, IntakeSpeed::Off);
        assert_eq!(dems.speed[&ActId::IntakeL], 0.0);
        assert_eq!(dems.speed[&ActId::IntakeR], 0.0);
    }
}
