//! Test utilities for building road networks programmatically.
//!
//! # Example
//!
//! ```rust
//! use openlr_matcher::test_utils::TestNetworkBuilder;
//! use openlr_matcher::Frc;
//!
//! let network = TestNetworkBuilder::new()
//!     .junction(1, 52.622875, 13.49214)
//!     .junction(2, 52.614812, 13.546033)
//!     .two_way_road(1, 1, 2, Frc::Frc0)
//!     .build();
//!
//! assert_eq!(network.junction_count(), 2);
//! assert_eq!(network.road_count(), 2);
//! ```

use std::collections::BTreeMap;

use geo::Point;

use crate::graph::{Frc, Junction, RoadNetwork};

/// A builder for constructing test road networks from junction ids.
///
/// Road lengths always derive from the junction geometry, keeping the
/// matcher's projection and coverage math consistent with the weights.
pub struct TestNetworkBuilder {
    junctions: BTreeMap<i64, Junction>,
    roads: Vec<PendingRoad>,
}

struct PendingRoad {
    feature_id: u64,
    from: i64,
    to: i64,
    frc: Frc,
    two_way: bool,
}

impl TestNetworkBuilder {
    pub fn new() -> Self {
        TestNetworkBuilder {
            junctions: BTreeMap::new(),
            roads: Vec::new(),
        }
    }

    /// Add a junction.
    ///
    /// # Panics
    /// Panics if a junction with the same id already exists.
    pub fn junction(mut self, id: i64, lat: f64, lon: f64) -> Self {
        let junction = Junction::new(Point::new(lon, lat), 0);
        if self.junctions.insert(id, junction).is_some() {
            panic!("junction with id {id} already exists");
        }
        self
    }

    /// Add a one-way road between two junctions.
    pub fn road(mut self, feature_id: u64, from: i64, to: i64, frc: Frc) -> Self {
        self.roads.push(PendingRoad {
            feature_id,
            from,
            to,
            frc,
            two_way: false,
        });
        self
    }

    /// Add a road drivable in both directions under one feature id.
    pub fn two_way_road(mut self, feature_id: u64, from: i64, to: i64, frc: Frc) -> Self {
        self.roads.push(PendingRoad {
            feature_id,
            from,
            to,
            frc,
            two_way: true,
        });
        self
    }

    /// Look up the junction registered under `id`.
    ///
    /// # Panics
    /// Panics if no such junction was added.
    pub fn junction_at(&self, id: i64) -> Junction {
        *self
            .junctions
            .get(&id)
            .unwrap_or_else(|| panic!("junction {id} does not exist"))
    }

    /// Build the road network with its spatial index.
    ///
    /// # Panics
    /// Panics if any road references a junction that was never added.
    pub fn build(self) -> RoadNetwork {
        let mut network = RoadNetwork::new();
        for road in &self.roads {
            let from = *self.junctions.get(&road.from).unwrap_or_else(|| {
                panic!(
                    "from junction {} does not exist for road {}",
                    road.from, road.feature_id
                )
            });
            let to = *self.junctions.get(&road.to).unwrap_or_else(|| {
                panic!(
                    "to junction {} does not exist for road {}",
                    road.to, road.feature_id
                )
            });
            if road.two_way {
                network.add_two_way_road(road.feature_id, road.frc, from, to);
            } else {
                network.add_road(road.feature_id, road.frc, from, to);
            }
        }
        network
    }
}

impl Default for TestNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
