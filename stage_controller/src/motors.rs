use serde::{Deserialize, Serialize};

/// Physical characteristics of one stage motor model. How far a pulse moves
/// the stage is a property of the attached motor, not of the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageMotor {
    pub name: String,
    pub pulses_per_mm: f64,
    pub travel_range_mm: f64,
}

impl StageMotor {
    pub fn mm_to_pulses(&self, mm: f64) -> i32 {
        (mm * self.pulses_per_mm).round() as i32
    }

    pub fn pulses_to_mm(&self, pulses: i32) -> f64 {
        f64::from(pulses) / self.pulses_per_mm
    }

    /// Valid targets run from zero to twice the nominal travel range.
    pub fn in_range(&self, target_mm: f64) -> bool {
        let max = self.travel_range_mm * 2.0;
        (-1e-9..=max + 1e-9).contains(&target_mm)
    }
}

pub fn default_catalog() -> Vec<StageMotor> {
    vec![
        StageMotor {
            name: "Default".to_string(),
            pulses_per_mm: 4000.0,
            travel_range_mm: 3.0,
        },
        StageMotor {
            name: "KTM0650".to_string(),
            pulses_per_mm: 4000.0,
            travel_range_mm: 3.0,
        },
        StageMotor {
            name: "SAM-40".to_string(),
            pulses_per_mm: 2000.0,
            travel_range_mm: 3.0,
        },
    ]
}

pub fn find<'a>(catalog: &'a [StageMotor], name: &str) -> Option<&'a StageMotor> {
    catalog.iter().find(|motor| motor.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ktm() -> StageMotor {
        find(&default_catalog(), "KTM0650").unwrap().clone()
    }

    #[test]
    fn converts_between_units() {
        let motor = ktm();

        assert_eq!(motor.mm_to_pulses(1.5), 6000);
        assert_eq!(motor.mm_to_pulses(-0.25), -1000);
        assert!((motor.pulses_to_mm(6000) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn range_check_spans_twice_the_travel_range() {
        let motor = ktm();

        assert!(motor.in_range(0.0));
        assert!(motor.in_range(6.0));
        assert!(!motor.in_range(6.1));
        assert!(!motor.in_range(-0.1));
    }

    #[test]
    fn unknown_motor_is_absent_from_catalog() {
        assert!(find(&default_catalog(), "NoSuchMotor").is_none());
    }
}
