//! Best-first search over the product of the road graph and the
//! reference progress, plus the reconstruction of the matched path.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use geo::{HaversineDistance, Point};
use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{FakeGraph, Frc, Junction, RoadEdge, RoadNetwork};
use crate::reconstruct::{
    coverage, fake_prefix_end, fake_suffix_start, matching_score, prefix_length_to_consume,
};
use crate::score::Score;
use crate::spatial::{bearing_bucket, point_at_segment, BEARING_DIST_M};

const MAX_ROAD_CANDIDATES: usize = 10;
const DISTANCE_ACCURACY_M: f64 = 1000.0;
const EPS: f64 = 1e-9;

/// Candidate edges may be up to this many classes less important than a
/// waypoint's lowest acceptable functional road class.
const FRC_TOLERANCE: i32 = 3;

/// Minimum matching score for a real edge to replace a fake prefix or
/// suffix of the matched chain.
const FAKE_COVERAGE_THRESHOLD: f64 = 0.5;

/// Minimum fraction of a candidate edge the fake chain must cover for
/// the single-edge fallback.
const SINGLE_EDGE_FRACTION_THRESHOLD: f64 = 0.8;

/// Minimum weighted coverage, as a share of the chain length, for the
/// single-edge fallback to accept its best candidate.
const SINGLE_EDGE_COVERAGE_THRESHOLD: f64 = 0.5;

/// One point of a line location reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: Point<f64>,
    /// Expected bearing bucket towards the next waypoint, 0 = north.
    pub bearing: u8,
    /// Expected travel distance to the next waypoint; 0 for the last one.
    pub distance_to_next_m: f64,
    /// Lowest acceptable functional road class towards the next waypoint.
    pub lfrcnp: Frc,
}

impl Waypoint {
    pub fn new(point: Point<f64>, bearing: u8, distance_to_next_m: f64, lfrcnp: Frc) -> Self {
        Waypoint {
            point,
            bearing,
            distance_to_next_m,
            lfrcnp,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("a line location needs at least two waypoints, got {0}")]
    NotEnoughWaypoints(usize),

    #[error("waypoint {index} has no roads in its vicinity")]
    NoVicinity { index: usize },

    #[error("search exhausted without reaching the last waypoint")]
    NoPath,

    #[error("reconstruction produced an empty path")]
    EmptyPath,
}

/// Search state: a junction combined with the progress through the
/// reference. `stage` is the index of the reference segment being
/// traversed; `stage_start` and `stage_start_distance` pin the frame in
/// which bearings and stage distances are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Vertex {
    pub(crate) junction: Junction,
    pub(crate) stage_start: Junction,
    pub(crate) stage_start_distance: OrderedFloat<f64>,
    pub(crate) stage: usize,
    pub(crate) bearing_checked: bool,
}

/// An edge of the product graph: either a real road edge wrapped between
/// two states, or a special zero-length marker for bearing-check and
/// stage-advance transitions. Special edges never reach the output path.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProductEdge {
    pub(crate) u: Vertex,
    pub(crate) v: Vertex,
    pub(crate) raw: RoadEdge,
    pub(crate) is_special: bool,
}

impl ProductEdge {
    pub(crate) fn normal(u: Vertex, v: Vertex, raw: RoadEdge) -> Self {
        ProductEdge {
            u,
            v,
            raw,
            is_special: false,
        }
    }

    pub(crate) fn special(u: Vertex, v: Vertex) -> Self {
        let raw = RoadEdge::make_fake(u.junction, v.junction, false);
        ProductEdge {
            u,
            v,
            raw,
            is_special: true,
        }
    }

    pub(crate) fn to_pair(&self) -> (Point<f64>, Point<f64>) {
        (
            self.raw.start_junction().point(),
            self.raw.end_junction().point(),
        )
    }

    pub(crate) fn to_pair_rev(&self) -> (Point<f64>, Point<f64>) {
        (
            self.raw.end_junction().point(),
            self.raw.start_junction().point(),
        )
    }
}

pub(crate) type Links = HashMap<Vertex, (Vertex, ProductEdge)>;

#[derive(Clone, PartialEq)]
struct QueueEntry {
    score: Score,
    vertex: Vertex,
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the binary heap pops the smallest entry; the vertex
        // participates to keep ties deterministic.
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

fn relax(
    queue: &mut BinaryHeap<QueueEntry>,
    scores: &mut HashMap<Vertex, Score>,
    links: &mut Links,
    u: &Vertex,
    v: Vertex,
    sv: Score,
    edge: ProductEdge,
) {
    let improves = match scores.get(&v) {
        None => true,
        Some(current) => current.total() > sv.total() + EPS,
    };
    if improves && *u != v {
        scores.insert(v, sv.clone());
        links.insert(v, (*u, edge));
        queue.push(QueueEntry { score: sv, vertex: v });
    }
}

/// Matches a line location reference onto the road network.
///
/// All state is per-decode: pivots, offsets, endpoint junctions, edge
/// caches and the fake-edge registry are reset by every [`Router::go`].
/// Concurrent decodes need separate routers; the network itself is never
/// mutated.
pub struct Router<'a> {
    network: &'a RoadNetwork,
    points: Vec<Waypoint>,
    positive_offset_m: f64,
    negative_offset_m: f64,
    /// One pivot set per stage; geographic attractors guiding the search
    /// and gating stage advancement.
    pivots: Vec<Vec<Point<f64>>>,
    source: Junction,
    target: Junction,
    fakes: FakeGraph,
    outgoing_cache: HashMap<Junction, Vec<RoadEdge>>,
    ingoing_cache: HashMap<Junction, Vec<RoadEdge>>,
}

impl<'a> Router<'a> {
    pub fn new(network: &'a RoadNetwork) -> Self {
        Router {
            network,
            points: Vec::new(),
            positive_offset_m: 0.0,
            negative_offset_m: 0.0,
            pivots: Vec::new(),
            source: Junction::default(),
            target: Junction::default(),
            fakes: FakeGraph::default(),
            outgoing_cache: HashMap::new(),
            ingoing_cache: HashMap::new(),
        }
    }

    /// Decode a reference: find the chain of road edges that best
    /// reproduces `points`, then trim it by the offsets.
    pub fn go(
        &mut self,
        points: &[Waypoint],
        positive_offset_m: f64,
        negative_offset_m: f64,
    ) -> Result<Vec<RoadEdge>, DecodeError> {
        self.init(points, positive_offset_m, negative_offset_m)?;
        let path = self.find_path()?;
        debug!("matched {} waypoints onto {} edges", points.len(), path.len());
        Ok(path)
    }

    fn init(
        &mut self,
        points: &[Waypoint],
        positive_offset_m: f64,
        negative_offset_m: f64,
    ) -> Result<(), DecodeError> {
        if points.len() < 2 {
            return Err(DecodeError::NotEnoughWaypoints(points.len()));
        }

        self.points = points.to_vec();
        self.positive_offset_m = positive_offset_m;
        self.negative_offset_m = negative_offset_m;

        self.fakes.clear();
        self.outgoing_cache.clear();
        self.ingoing_cache.clear();
        self.pivots.clear();

        for (i, waypoint) in points.iter().enumerate().take(points.len() - 1).skip(1) {
            let vicinity = self
                .network
                .find_closest_edges(waypoint.point, MAX_ROAD_CANDIDATES);
            let mut stage_pivots = Vec::with_capacity(2 * vicinity.len());
            for (edge, _) in &vicinity {
                stage_pivots.push(edge.start_junction().point());
                stage_pivots.push(edge.end_junction().point());
            }
            if stage_pivots.is_empty() {
                return Err(DecodeError::NoVicinity { index: i });
            }
            self.pivots.push(stage_pivots);
        }
        self.pivots.push(vec![points[points.len() - 1].point]);
        debug_assert_eq!(self.pivots.len() + 1, self.points.len());

        self.source = Junction::new(points[0].point, 0);
        let source_vicinity = self
            .network
            .find_closest_edges(self.source.point(), MAX_ROAD_CANDIDATES);
        self.fakes.add_connectors(&self.source, &source_vicinity);

        self.target = Junction::new(points[points.len() - 1].point, 0);
        let target_vicinity = self
            .network
            .find_closest_edges(self.target.point(), MAX_ROAD_CANDIDATES);
        self.fakes.add_connectors(&self.target, &target_vicinity);

        debug!(
            "init: {} stages, {} source and {} target vicinity edges",
            self.pivots.len(),
            source_vicinity.len(),
            target_vicinity.len()
        );
        Ok(())
    }

    fn find_path(&mut self) -> Result<Vec<RoadEdge>, DecodeError> {
        let mut queue: BinaryHeap<QueueEntry> = BinaryHeap::new();
        let mut scores: HashMap<Vertex, Score> = HashMap::new();
        let mut links: Links = HashMap::new();

        let source = Vertex {
            junction: self.source,
            stage_start: self.source,
            stage_start_distance: OrderedFloat(0.0),
            stage: 0,
            bearing_checked: false,
        };
        debug_assert!(!self.need_bearing_check(&source, 0.0));

        scores.insert(source, Score::default());
        queue.push(QueueEntry {
            score: Score::default(),
            vertex: source,
        });

        let pi_source = self.potential(&source);
        let mut popped = 0usize;

        while let Some(QueueEntry { score: su, vertex: u }) = queue.pop() {
            if scores.get(&u) != Some(&su) {
                continue; // stale entry
            }
            popped += 1;

            if self.is_final(&u) {
                debug!("reached final vertex after {popped} expansions");
                let mut edges = Vec::new();
                let mut current = u;
                while current != source {
                    let (prev, edge) = links
                        .get(&current)
                        .expect("expanded vertex without a link")
                        .clone();
                    edges.push(edge);
                    current = prev;
                }
                edges.reverse();
                return self.reconstruct_path(edges);
            }

            let stage = u.stage;
            let expected_m = self.points[stage].distance_to_next_m;
            let pi_u = self.potential(&u);
            let ud = su.distance() + pi_source - pi_u; // real distance to u

            debug_assert!(stage < self.pivots.len());

            // Throw out paths running far past the expected stage length.
            if ud > u.stage_start_distance.0 + expected_m + DISTANCE_ACCURACY_M.max(expected_m) {
                continue;
            }

            if self.near_next_stage(&u, pi_u) && !u.bearing_checked {
                let mut v = u;
                v.bearing_checked = true;

                let mut sv = su.clone();
                if u.junction != u.stage_start {
                    let actual = bearing_bucket(u.stage_start.point(), u.junction.point());
                    sv.add_bearing_penalty(self.points[stage].bearing, actual);
                }

                let edge = ProductEdge::special(u, v);
                relax(&mut queue, &mut scores, &mut links, &u, v, sv, edge);
            }

            if self.may_move_to_next_stage(&u, pi_u) {
                let v = Vertex {
                    junction: u.junction,
                    stage_start: u.junction,
                    stage_start_distance: OrderedFloat(ud),
                    stage: stage + 1,
                    bearing_checked: false,
                };
                let pi_v = self.potential(&v);

                let mut sv = su.clone();
                sv.add_distance((pi_v - pi_u).max(0.0));
                sv.add_intermediate_error_penalty(
                    v.junction
                        .point()
                        .haversine_distance(&self.points[v.stage].point),
                );

                if self.is_final(&v) {
                    let expected = self.points[self.points.len() - 1].bearing;
                    let actual = self.reverse_bearing(&u, &links);
                    sv.add_bearing_penalty(expected, actual);
                }

                let edge = ProductEdge::special(u, v);
                relax(&mut queue, &mut scores, &mut links, &u, v, sv, edge);
            }

            for edge in self.edges_at(&u.junction, true) {
                if !self.passes_restriction(&edge, self.points[stage].lfrcnp) {
                    continue;
                }

                let mut v = u;
                v.junction = *edge.end_junction();
                let pi_v = self.potential(&v);

                let mut sv = su.clone();
                let w = edge.length_m();
                sv.add_distance((w + pi_v - pi_u).max(0.0));

                let vd = ud + w; // real distance to v
                if self.need_bearing_check(&v, vd) {
                    debug_assert!(!self.need_bearing_check(&u, ud));

                    let delta = vd - v.stage_start_distance.0 - BEARING_DIST_M;
                    let sampled = point_at_segment(
                        edge.start_junction().point(),
                        edge.end_junction().point(),
                        delta,
                    );
                    if v.stage_start.point() != sampled {
                        let actual = bearing_bucket(v.stage_start.point(), sampled);
                        sv.add_bearing_penalty(self.points[stage].bearing, actual);
                    }
                    v.bearing_checked = true;
                }

                if vd > v.stage_start_distance.0 + expected_m {
                    sv.add_distance_error_penalty(
                        (vd - v.stage_start_distance.0 - expected_m).min(w),
                    );
                }

                if edge.is_fake() {
                    sv.add_fake_penalty(w, edge.is_part_of_real());
                }

                let product = ProductEdge::normal(u, v, edge);
                relax(&mut queue, &mut scores, &mut links, &u, v, sv, product);
            }
        }

        debug!("queue drained after {popped} expansions");
        Err(DecodeError::NoPath)
    }

    fn is_final(&self, u: &Vertex) -> bool {
        u.stage + 1 == self.points.len()
    }

    fn near_next_stage(&self, u: &Vertex, pi: f64) -> bool {
        u.stage < self.pivots.len() && pi < EPS
    }

    fn may_move_to_next_stage(&self, u: &Vertex, pi: f64) -> bool {
        self.near_next_stage(u, pi) && u.bearing_checked
    }

    fn need_bearing_check(&self, u: &Vertex, distance_m: f64) -> bool {
        if self.is_final(u) || u.bearing_checked {
            return false;
        }
        distance_m >= u.stage_start_distance.0 + BEARING_DIST_M
    }

    /// Admissible lower bound on the remaining distance: the search must
    /// touch one of the stage's pivots before it can advance.
    fn potential(&self, u: &Vertex) -> f64 {
        if self.is_final(u) {
            return 0.0;
        }

        let pivots = &self.pivots[u.stage];
        debug_assert!(!pivots.is_empty(), "empty pivot set");

        let point = u.junction.point();
        pivots
            .iter()
            .map(|pivot| pivot.haversine_distance(&point))
            .fold(f64::MAX, f64::min)
    }

    fn passes_restriction(&self, edge: &RoadEdge, restriction: Frc) -> bool {
        if edge.is_fake() {
            return true;
        }
        match edge.feature_id().and_then(|id| self.network.road_info(id)) {
            Some(info) => (info.frc as i32) <= (restriction as i32) + FRC_TOLERANCE,
            None => false,
        }
    }

    /// Bearing at `u` looking back along the matched path: walk the links
    /// within the stage until 25 m have accumulated and sample the point
    /// on the straddling edge; fall back to the earliest visited junction
    /// on shorter trails.
    fn reverse_bearing(&self, u: &Vertex, links: &Links) -> u8 {
        let from = u.junction.point();
        let mut current = *u;
        let mut passed = 0.0;
        let mut sampled: Option<Point<f64>> = None;

        while let Some((prev, edge)) = links.get(&current) {
            if prev.stage != current.stage {
                break;
            }
            let weight = edge.raw.length_m();
            if passed + weight >= BEARING_DIST_M {
                let delta = BEARING_DIST_M - passed;
                sampled = Some(point_at_segment(
                    edge.raw.end_junction().point(),
                    edge.raw.start_junction().point(),
                    delta,
                ));
                break;
            }
            passed += weight;
            current = *prev;
        }

        let to = sampled.unwrap_or_else(|| current.junction.point());
        bearing_bucket(from, to)
    }

    /// Memoized regular edges at a junction, with the current fake edges
    /// always appended fresh; the fake set changes between decodes and
    /// must never be served stale.
    fn edges_at(&mut self, junction: &Junction, outgoing: bool) -> Vec<RoadEdge> {
        let network = self.network;
        let cache = if outgoing {
            &mut self.outgoing_cache
        } else {
            &mut self.ingoing_cache
        };

        let mut edges = match cache.get(junction) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = if outgoing {
                    network.regular_outgoing_edges(junction)
                } else {
                    network.regular_ingoing_edges(junction)
                };
                cache.insert(*junction, fetched.clone());
                fetched
            }
        };

        if outgoing {
            self.fakes.outgoing_edges(junction, &mut edges);
        } else {
            self.fakes.ingoing_edges(junction, &mut edges);
        }
        edges
    }

    fn reconstruct_path(&mut self, mut edges: Vec<ProductEdge>) -> Result<Vec<RoadEdge>, DecodeError> {
        debug_assert!(self.points.len() >= 2);

        edges.retain(|e| !e.is_special);

        let n = prefix_length_to_consume(
            edges.iter().map(ProductEdge::to_pair),
            self.positive_offset_m,
        );
        debug_assert!(n <= edges.len());
        edges.drain(..n);

        let n = prefix_length_to_consume(
            edges.iter().rev().map(ProductEdge::to_pair_rev),
            self.negative_offset_m,
        );
        debug_assert!(n <= edges.len());
        edges.truncate(edges.len() - n);

        // The best real edge whose geometry carries the fake prefix of
        // the first stage, and its counterpart for the last stage.
        let mut front_score = -1.0;
        let mut front_edge: Option<RoadEdge> = None;
        if let Some(i) = fake_prefix_end(&edges, 0) {
            let anchor = edges[i].u.junction;
            let restriction = self.points[0].lfrcnp;
            for candidate in self.edges_at(&anchor, false) {
                if candidate.is_fake() || !self.passes_restriction(&candidate, restriction) {
                    continue;
                }
                let score = matching_score(
                    candidate.end_junction().point(),
                    candidate.start_junction().point(),
                    edges[..i].iter().rev().map(ProductEdge::to_pair_rev),
                );
                if score > front_score {
                    front_score = score;
                    front_edge = Some(candidate.reversed());
                }
            }
        }

        let mut back_score = -1.0;
        let mut back_edge: Option<RoadEdge> = None;
        let last_stage = self.points.len() - 2;
        if let Some(i) = fake_suffix_start(&edges, last_stage) {
            let anchor = edges[i].v.junction;
            let restriction = self.points[last_stage].lfrcnp;
            for candidate in self.edges_at(&anchor, true) {
                if candidate.is_fake() || !self.passes_restriction(&candidate, restriction) {
                    continue;
                }
                let score = matching_score(
                    candidate.start_junction().point(),
                    candidate.end_junction().point(),
                    edges[i + 1..].iter().map(ProductEdge::to_pair),
                );
                if score > back_score {
                    back_score = score;
                    back_edge = Some(candidate);
                }
            }
        }

        let mut path: Vec<RoadEdge> = edges
            .iter()
            .filter(|e| !e.raw.is_fake())
            .map(|e| e.raw.clone())
            .collect();

        if let Some(front) = front_edge {
            if front_score >= FAKE_COVERAGE_THRESHOLD && !path.is_empty() && path[0] != front {
                path.insert(0, front);
            }
        }
        if let Some(back) = back_edge {
            if back_score >= FAKE_COVERAGE_THRESHOLD
                && !path.is_empty()
                && path[path.len() - 1] != back
            {
                path.push(back);
            }
        }

        if path.is_empty() {
            // The matched chain consisted of fake edges only.
            self.find_single_edge_approximation(&edges, &mut path);
        }

        if path.is_empty() {
            Err(DecodeError::EmptyPath)
        } else {
            Ok(path)
        }
    }

    /// Replace an all-fake chain by the single real edge its geometry
    /// covers best, if that edge is covered well enough.
    fn find_single_edge_approximation(&self, edges: &[ProductEdge], path: &mut Vec<RoadEdge>) {
        debug_assert!(edges.iter().all(|e| e.raw.is_fake()));

        let expected_length: f64 = edges.iter().map(|e| e.raw.length_m()).sum();
        if expected_length < EPS {
            return;
        }

        let mut best_coverage = -1.0;
        let mut best_edge: Option<RoadEdge> = None;

        for edge in edges {
            debug_assert_eq!(edge.u.stage, edge.v.stage);
            let restriction = self.points[edge.u.stage].lfrcnp;

            for junction in [&edge.u.junction, &edge.v.junction] {
                for (candidate, _) in self
                    .network
                    .find_closest_edges(junction.point(), MAX_ROAD_CANDIDATES)
                {
                    if candidate.is_fake() || !self.passes_restriction(&candidate, restriction) {
                        continue;
                    }
                    let fraction = coverage(
                        candidate.start_junction().point(),
                        candidate.end_junction().point(),
                        edges,
                    );
                    let weighted = candidate.length_m() * fraction;
                    if fraction >= SINGLE_EDGE_FRACTION_THRESHOLD && weighted >= best_coverage {
                        best_coverage = weighted;
                        best_edge = Some(candidate);
                    }
                }
            }
        }

        if let Some(best) = best_edge {
            if best_coverage >= expected_length * SINGLE_EDGE_COVERAGE_THRESHOLD {
                *path = vec![best];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestNetworkBuilder;

    fn waypoint(x: f64, y: f64, bearing: u8, distance_m: f64) -> Waypoint {
        Waypoint::new(Point::new(x, y), bearing, distance_m, Frc::Frc7)
    }

    #[test]
    fn rejects_references_with_too_few_waypoints() {
        let network = TestNetworkBuilder::new()
            .junction(1, 52.0, 13.0)
            .junction(2, 52.0, 13.001)
            .two_way_road(1, 1, 2, Frc::Frc3)
            .build();
        let mut router = Router::new(&network);

        assert_eq!(
            router.go(&[], 0.0, 0.0),
            Err(DecodeError::NotEnoughWaypoints(0))
        );
        assert_eq!(
            router.go(&[waypoint(13.0, 52.0, 0, 0.0)], 0.0, 0.0),
            Err(DecodeError::NotEnoughWaypoints(1))
        );
    }

    #[test]
    fn intermediate_waypoint_without_vicinity_fails_init() {
        let network = TestNetworkBuilder::new()
            .junction(1, 52.0, 13.0)
            .junction(2, 52.0, 13.001)
            .two_way_road(1, 1, 2, Frc::Frc3)
            .build();
        let mut router = Router::new(&network);

        // The middle waypoint is kilometers away from any road.
        let points = [
            waypoint(13.0, 52.0, 64, 100.0),
            waypoint(13.5, 52.5, 64, 100.0),
            waypoint(13.001, 52.0, 64, 0.0),
        ];
        assert_eq!(
            router.go(&points, 0.0, 0.0),
            Err(DecodeError::NoVicinity { index: 1 })
        );
    }

    #[test]
    fn restriction_allows_three_classes_of_tolerance() {
        let network = TestNetworkBuilder::new()
            .junction(1, 52.0, 13.0)
            .junction(2, 52.0, 13.001)
            .road(1, 1, 2, Frc::Frc3)
            .road(2, 1, 2, Frc::Frc4)
            .build();
        let router = Router::new(&network);

        let a = Junction::new(Point::new(13.0, 52.0), 0);
        let edges = network.regular_outgoing_edges(&a);
        let frc3 = edges.iter().find(|e| e.feature_id() == Some(1)).unwrap();
        let frc4 = edges.iter().find(|e| e.feature_id() == Some(2)).unwrap();

        assert!(router.passes_restriction(frc3, Frc::Frc0));
        assert!(!router.passes_restriction(frc4, Frc::Frc0));
        assert!(router.passes_restriction(frc4, Frc::Frc1));

        let b = Junction::new(Point::new(13.001, 52.0), 0);
        let fake = RoadEdge::make_fake(a, b, false);
        assert!(router.passes_restriction(&fake, Frc::Frc0));
    }

    #[test]
    fn search_without_a_connection_reports_no_path() {
        // Two disconnected one-way roads.
        let network = TestNetworkBuilder::new()
            .junction(1, 52.0, 13.0)
            .junction(2, 52.0, 13.001)
            .junction(3, 52.2, 13.0)
            .junction(4, 52.2, 13.001)
            .road(1, 1, 2, Frc::Frc3)
            .road(2, 3, 4, Frc::Frc3)
            .build();
        let mut router = Router::new(&network);

        let points = [
            waypoint(13.0, 52.0, 64, 100.0),
            waypoint(13.001, 52.2, 64, 0.0),
        ];
        assert_eq!(router.go(&points, 0.0, 0.0), Err(DecodeError::NoPath));
    }

    #[test]
    fn queue_entries_pop_smallest_first() {
        let mut small = Score::default();
        small.add_distance(1.0);
        let mut large = Score::default();
        large.add_distance(2.0);

        let junction = Junction::new(Point::new(13.0, 52.0), 0);
        let vertex = Vertex {
            junction,
            stage_start: junction,
            stage_start_distance: OrderedFloat(0.0),
            stage: 0,
            bearing_checked: false,
        };

        let mut queue = BinaryHeap::new();
        queue.push(QueueEntry {
            score: large.clone(),
            vertex,
        });
        queue.push(QueueEntry {
            score: small.clone(),
            vertex,
        });

        assert_eq!(queue.pop().unwrap().score, small);
        assert_eq!(queue.pop().unwrap().score, large);
    }

    #[test]
    fn relax_skips_worse_scores_and_self_loops() {
        let mut queue = BinaryHeap::new();
        let mut scores = HashMap::new();
        let mut links: Links = HashMap::new();

        let junction = Junction::new(Point::new(13.0, 52.0), 0);
        let u = Vertex {
            junction,
            stage_start: junction,
            stage_start_distance: OrderedFloat(0.0),
            stage: 0,
            bearing_checked: false,
        };
        let mut v = u;
        v.bearing_checked = true;

        let mut good = Score::default();
        good.add_distance(5.0);
        let mut worse = Score::default();
        worse.add_distance(7.0);

        relax(
            &mut queue,
            &mut scores,
            &mut links,
            &u,
            v,
            good.clone(),
            ProductEdge::special(u, v),
        );
        assert_eq!(scores.get(&v), Some(&good));

        relax(
            &mut queue,
            &mut scores,
            &mut links,
            &u,
            v,
            worse,
            ProductEdge::special(u, v),
        );
        assert_eq!(scores.get(&v), Some(&good), "worse scores never overwrite");

        // The degenerate self-loop is rejected outright.
        let before = scores.len();
        relax(
            &mut queue,
            &mut scores,
            &mut links,
            &u,
            u,
            Score::default(),
            ProductEdge::special(u, u),
        );
        assert_eq!(scores.len(), before);
    }
}
