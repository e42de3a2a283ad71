pub mod graph;
pub mod router;
pub mod score;
pub mod spatial;
pub mod test_utils;

mod reconstruct;

pub use graph::{FakeGraph, Frc, Junction, RoadEdge, RoadInfo, RoadNetwork};
pub use router::{DecodeError, Router, Waypoint};
pub use score::Score;
pub use spatial::{bearing_bucket, SpatialIndex};
