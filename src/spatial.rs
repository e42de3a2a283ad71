use geo::{GeodesicBearing, HaversineDistance, Point};
use petgraph::graph::EdgeIndex;
use rstar::{RTree, RTreeObject, AABB};

/// The compass is divided into 256 equal arcs of ~1.406 degrees.
pub const NUM_BEARING_BUCKETS: u16 = 256;

pub(crate) const DEGREES_PER_BUCKET: f64 = 360.0 / NUM_BEARING_BUCKETS as f64;

/// Distance over which a bearing is measured, in meters.
pub(crate) const BEARING_DIST_M: f64 = 25.0;

/// Envelope wrapper for an edge's bounding box in the R-tree.
///
/// Stores only the bounding box; the canonical segment endpoints live in
/// the road graph and are looked up by `edge_index` when a precise
/// distance is needed.
#[derive(Debug, Clone)]
pub struct EdgeEnvelope {
    pub edge_index: EdgeIndex,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl EdgeEnvelope {
    pub fn from_segment(edge_index: EdgeIndex, a: Point<f64>, b: Point<f64>) -> Self {
        EdgeEnvelope {
            edge_index,
            min_x: a.x().min(b.x()),
            min_y: a.y().min(b.y()),
            max_x: a.x().max(b.x()),
            max_y: a.y().max(b.y()),
        }
    }
}

impl RTreeObject for EdgeEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

/// Spatial index for fast edge lookup.
#[derive(Default)]
pub struct SpatialIndex {
    rtree: RTree<EdgeEnvelope>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        SpatialIndex { rtree: RTree::new() }
    }

    pub fn insert(&mut self, envelope: EdgeEnvelope) {
        self.rtree.insert(envelope);
    }

    /// Find all edges whose bounding box intersects a box expanded from
    /// `center` by `radius_m` meters.
    pub fn find_nearby(&self, center: Point<f64>, radius_m: f64) -> Vec<&EdgeEnvelope> {
        // Approximate degrees from meters (~111km per degree), adjusted
        // for latitude.
        let lat_rad = center.y().to_radians();
        let meters_per_deg_lat = 111_132.0;
        let meters_per_deg_lon = 111_132.0 * lat_rad.cos();

        let delta_lat = radius_m / meters_per_deg_lat;
        let delta_lon = radius_m / meters_per_deg_lon;

        let min_corner = [center.x() - delta_lon, center.y() - delta_lat];
        let max_corner = [center.x() + delta_lon, center.y() + delta_lat];
        let search_box = AABB::from_corners(min_corner, max_corner);

        self.rtree
            .locate_in_envelope_intersecting(&search_box)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }
}

/// Heading a -> b quantized into one of 256 buckets, 0 = north, clockwise.
pub fn bearing_bucket(a: Point<f64>, b: Point<f64>) -> u8 {
    let degrees = normalize_degrees(a.geodesic_bearing(b));
    let bucket = (degrees / DEGREES_PER_BUCKET).floor();
    bucket.clamp(0.0, 255.0) as u8
}

/// Normalize a heading in degrees to [0, 360).
pub(crate) fn normalize_degrees(b: f64) -> f64 {
    ((b % 360.0) + 360.0) % 360.0
}

/// Point `distance_m` meters from `a` along the segment a -> b.
pub(crate) fn point_at_segment(a: Point<f64>, b: Point<f64>, distance_m: f64) -> Point<f64> {
    let len = a.haversine_distance(&b);
    if len == 0.0 {
        return a;
    }
    let t = (distance_m / len).clamp(0.0, 1.0);
    Point::new(a.x() + t * (b.x() - a.x()), a.y() + t * (b.y() - a.y()))
}

/// Project `point` onto the segment a -> b; returns the closest point and
/// the parameter along the segment in [0, 1]. Planar math on degree
/// coordinates, adequate at vicinity scales.
pub(crate) fn project_point_to_segment(
    point: Point<f64>,
    a: Point<f64>,
    b: Point<f64>,
) -> (Point<f64>, f64) {
    let dx = b.x() - a.x();
    let dy = b.y() - a.y();

    if dx == 0.0 && dy == 0.0 {
        return (a, 0.0);
    }

    let t = ((point.x() - a.x()) * dx + (point.y() - a.y()) * dy) / (dx * dx + dy * dy);
    let t = t.clamp(0.0, 1.0);

    (Point::new(a.x() + t * dx, a.y() + t * dy), t)
}

/// Whether `p` lies on the segment a -> b within `eps` (degree units).
pub(crate) fn is_point_on_segment(p: Point<f64>, a: Point<f64>, b: Point<f64>, eps: f64) -> bool {
    let ab = (b.x() - a.x(), b.y() - a.y());
    let ap = (p.x() - a.x(), p.y() - a.y());
    let sqlen = ab.0 * ab.0 + ab.1 * ab.1;

    if sqlen < eps * eps {
        return ap.0.hypot(ap.1) <= eps;
    }

    let cross = ab.0 * ap.1 - ab.1 * ap.0;
    if cross.abs() > eps * sqlen.sqrt() {
        return false;
    }

    let t = (ab.0 * ap.0 + ab.1 * ap.1) / sqlen;
    (-eps..=1.0 + eps).contains(&t)
}
