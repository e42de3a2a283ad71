use std::cmp::Ordering;

use crate::spatial::{BEARING_DIST_M, DEGREES_PER_BUCKET, NUM_BEARING_BUCKETS};

/// Weight for the total length of true fake edges.
const TRUE_FAKE_COEFF: f64 = 10.0;

/// Weight for the total length of fake edges lying on real features.
const PART_OF_REAL_FAKE_COEFF: f64 = 0.001;

/// Weight for passing too far from pivot points.
const INTERMEDIATE_ERROR_COEFF: f64 = 3.0;

/// Weight for excess over the expected stage distance.
const DISTANCE_ERROR_COEFF: f64 = 3.0;

/// Weight for deviation from the expected bearing.
const BEARING_ERROR_COEFF: f64 = 5.0;

/// Composite path cost: reduced travelled length plus accumulated
/// penalties, both in meters. Totally ordered by (total, distance,
/// penalty) so queue ties break deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    distance: f64,
    penalty: f64,
}

impl Score {
    pub fn add_distance(&mut self, meters: f64) {
        debug_assert!(meters >= 0.0);
        self.distance += meters;
    }

    pub fn add_fake_penalty(&mut self, meters: f64, part_of_real: bool) {
        debug_assert!(meters >= 0.0);
        let coeff = if part_of_real {
            PART_OF_REAL_FAKE_COEFF
        } else {
            TRUE_FAKE_COEFF
        };
        self.penalty += coeff * meters;
    }

    pub fn add_intermediate_error_penalty(&mut self, meters: f64) {
        debug_assert!(meters >= 0.0);
        self.penalty += INTERMEDIATE_ERROR_COEFF * meters;
    }

    pub fn add_distance_error_penalty(&mut self, meters: f64) {
        debug_assert!(meters >= 0.0);
        self.penalty += DISTANCE_ERROR_COEFF * meters;
    }

    /// Penalize the angular gap between two bearing buckets, scaled by
    /// the bearing measurement distance.
    pub fn add_bearing_penalty(&mut self, expected: u8, actual: u8) {
        let diff = (i32::from(expected) - i32::from(actual)).abs();
        let diff = diff.min(i32::from(NUM_BEARING_BUCKETS) - diff);
        let angle = (f64::from(diff) * DEGREES_PER_BUCKET).to_radians();
        self.penalty += BEARING_ERROR_COEFF * angle * BEARING_DIST_M;
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    pub fn total(&self) -> f64 {
        self.distance + self.penalty
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total()
            .total_cmp(&other.total())
            .then_with(|| self.distance.total_cmp(&other.distance))
            .then_with(|| self.penalty.total_cmp(&other.penalty))
    }
}
