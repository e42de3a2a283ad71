use std::collections::HashMap;

use geo::{HaversineDistance, Point};
use ordered_float::OrderedFloat;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::spatial::{project_point_to_segment, EdgeEnvelope, SpatialIndex};

/// Radius used when collecting the vicinity of a query point.
const CLOSEST_EDGES_RADIUS_M: f64 = 100.0;

/// Functional Road Class. FRC0 = most important (motorway),
/// FRC7 = least important (service roads and the like).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Frc {
    Frc0 = 0,
    Frc1 = 1,
    Frc2 = 2,
    Frc3 = 3,
    Frc4 = 4,
    Frc5 = 5,
    Frc6 = 6,
    Frc7 = 7,
}

impl Frc {
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => Frc::Frc0,
            1 => Frc::Frc1,
            2 => Frc::Frc2,
            3 => Frc::Frc3,
            4 => Frc::Frc4,
            5 => Frc::Frc5,
            6 => Frc::Frc6,
            _ => Frc::Frc7,
        }
    }
}

/// Per-feature road attributes, looked up by feature id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadInfo {
    pub frc: Frc,
}

/// A node of the road graph: a geographic point plus an altitude.
///
/// Coordinates are wrapped in `OrderedFloat` so junctions are totally
/// ordered and hashable; they key the edge caches and the search maps.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Junction {
    x: OrderedFloat<f64>,
    y: OrderedFloat<f64>,
    altitude: i32,
}

impl Junction {
    pub fn new(point: Point<f64>, altitude: i32) -> Self {
        Junction {
            x: OrderedFloat(point.x()),
            y: OrderedFloat(point.y()),
            altitude,
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.x.0, self.y.0)
    }

    pub fn altitude(&self) -> i32 {
        self.altitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Backed by a real road feature.
    Regular { feature_id: u64 },
    /// Synthesized connector; `part_of_real` when it lies on a real feature.
    Fake { part_of_real: bool },
}

/// A directed edge of the road graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadEdge {
    start: Junction,
    end: Junction,
    length_m: f64,
    kind: EdgeKind,
}

impl RoadEdge {
    pub fn new_regular(feature_id: u64, start: Junction, end: Junction, length_m: f64) -> Self {
        RoadEdge {
            start,
            end,
            length_m,
            kind: EdgeKind::Regular { feature_id },
        }
    }

    pub fn make_fake(start: Junction, end: Junction, part_of_real: bool) -> Self {
        let length_m = start.point().haversine_distance(&end.point());
        RoadEdge {
            start,
            end,
            length_m,
            kind: EdgeKind::Fake { part_of_real },
        }
    }

    pub fn start_junction(&self) -> &Junction {
        &self.start
    }

    pub fn end_junction(&self) -> &Junction {
        &self.end
    }

    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    pub fn is_fake(&self) -> bool {
        matches!(self.kind, EdgeKind::Fake { .. })
    }

    pub fn is_part_of_real(&self) -> bool {
        matches!(self.kind, EdgeKind::Fake { part_of_real: true })
    }

    pub fn feature_id(&self) -> Option<u64> {
        match self.kind {
            EdgeKind::Regular { feature_id } => Some(feature_id),
            EdgeKind::Fake { .. } => None,
        }
    }

    /// The same edge traversed in the opposite direction.
    pub fn reversed(&self) -> RoadEdge {
        RoadEdge {
            start: self.end,
            end: self.start,
            length_m: self.length_m,
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone)]
struct RoadSegment {
    feature_id: u64,
    length_m: f64,
}

/// The road network: a directed graph of junctions, a spatial index over
/// its segments and per-feature road attributes. Immutable during a
/// decode; fake connectors live in a decoder-owned [`FakeGraph`].
#[derive(Default)]
pub struct RoadNetwork {
    graph: DiGraph<Junction, RoadSegment>,
    junction_index: HashMap<Junction, NodeIndex>,
    info: HashMap<u64, RoadInfo>,
    spatial: SpatialIndex,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_add_junction(&mut self, junction: Junction) -> NodeIndex {
        if let Some(&idx) = self.junction_index.get(&junction) {
            return idx;
        }
        let idx = self.graph.add_node(junction);
        self.junction_index.insert(junction, idx);
        idx
    }

    /// Add a one-way road segment. Junctions are created on demand.
    pub fn add_road(&mut self, feature_id: u64, frc: Frc, from: Junction, to: Junction) {
        let length_m = from.point().haversine_distance(&to.point());
        let from_idx = self.get_or_add_junction(from);
        let to_idx = self.get_or_add_junction(to);
        let edge_idx = self.graph.add_edge(
            from_idx,
            to_idx,
            RoadSegment {
                feature_id,
                length_m,
            },
        );
        self.spatial
            .insert(EdgeEnvelope::from_segment(edge_idx, from.point(), to.point()));
        self.info.insert(feature_id, RoadInfo { frc });
    }

    /// Add a road segment drivable in both directions under one feature id.
    pub fn add_two_way_road(&mut self, feature_id: u64, frc: Frc, a: Junction, b: Junction) {
        self.add_road(feature_id, frc, a, b);
        self.add_road(feature_id, frc, b, a);
    }

    pub fn road_info(&self, feature_id: u64) -> Option<&RoadInfo> {
        self.info.get(&feature_id)
    }

    pub fn junction_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn road_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn edge_at(&self, idx: EdgeIndex) -> Option<RoadEdge> {
        let (source, target) = self.graph.edge_endpoints(idx)?;
        let segment = self.graph.edge_weight(idx)?;
        Some(RoadEdge::new_regular(
            segment.feature_id,
            self.graph[source],
            self.graph[target],
            segment.length_m,
        ))
    }

    fn directed_edges(&self, junction: &Junction, direction: Direction) -> Vec<RoadEdge> {
        let Some(&idx) = self.junction_index.get(junction) else {
            return Vec::new();
        };
        let mut edges: Vec<RoadEdge> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| {
                RoadEdge::new_regular(
                    e.weight().feature_id,
                    self.graph[e.source()],
                    self.graph[e.target()],
                    e.weight().length_m,
                )
            })
            .collect();
        // petgraph enumerates in insertion-dependent order; sort so that
        // identical networks always expand identically.
        edges.sort_by(|a, b| {
            a.feature_id()
                .cmp(&b.feature_id())
                .then_with(|| a.start.cmp(&b.start))
                .then_with(|| a.end.cmp(&b.end))
        });
        edges
    }

    /// Regular edges leaving `junction`, deterministically ordered.
    pub fn regular_outgoing_edges(&self, junction: &Junction) -> Vec<RoadEdge> {
        self.directed_edges(junction, Direction::Outgoing)
    }

    /// Regular edges arriving at `junction`, deterministically ordered.
    pub fn regular_ingoing_edges(&self, junction: &Junction) -> Vec<RoadEdge> {
        self.directed_edges(junction, Direction::Incoming)
    }

    /// Up to `limit` real edges closest to `point`, each with the
    /// projection of the point onto the edge as a `Junction`.
    pub fn find_closest_edges(
        &self,
        point: Point<f64>,
        limit: usize,
    ) -> Vec<(RoadEdge, Junction)> {
        let mut candidates: Vec<(RoadEdge, Junction, f64)> = self
            .spatial
            .find_nearby(point, CLOSEST_EDGES_RADIUS_M)
            .into_iter()
            .filter_map(|env| {
                let edge = self.edge_at(env.edge_index)?;
                let (proj, _) =
                    project_point_to_segment(point, edge.start.point(), edge.end.point());
                let distance = point.haversine_distance(&proj);
                if distance > CLOSEST_EDGES_RADIUS_M {
                    return None;
                }
                Some((edge, Junction::new(proj, 0), distance))
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.2.total_cmp(&b.2)
                .then_with(|| a.0.feature_id().cmp(&b.0.feature_id()))
                .then_with(|| a.0.start.cmp(&b.0.start))
        });
        candidates.truncate(limit);
        candidates.into_iter().map(|(e, j, _)| (e, j)).collect()
    }
}

/// Registry of synthetic connectors bridging off-road points into the
/// graph. Owned by the decoder and cleared at the start of every decode,
/// so the underlying [`RoadNetwork`] stays immutable and shareable.
#[derive(Debug, Default)]
pub struct FakeGraph {
    outgoing: HashMap<Junction, Vec<RoadEdge>>,
    ingoing: HashMap<Junction, Vec<RoadEdge>>,
}

impl FakeGraph {
    pub fn clear(&mut self) {
        self.outgoing.clear();
        self.ingoing.clear();
    }

    /// Register connectors between `junction` and its vicinity: a true
    /// fake pair junction <-> projection plus part-of-real pairs between
    /// the projection and both endpoints of the vicinity edge.
    pub fn add_connectors(&mut self, junction: &Junction, vicinity: &[(RoadEdge, Junction)]) {
        for (edge, projection) in vicinity {
            self.add_pair(*junction, *projection, false);
            self.add_pair(*projection, *edge.start_junction(), true);
            self.add_pair(*projection, *edge.end_junction(), true);
        }
    }

    fn add_pair(&mut self, a: Junction, b: Junction, part_of_real: bool) {
        if a == b {
            return;
        }
        self.add_edge(RoadEdge::make_fake(a, b, part_of_real));
        self.add_edge(RoadEdge::make_fake(b, a, part_of_real));
    }

    fn add_edge(&mut self, edge: RoadEdge) {
        let outgoing = self.outgoing.entry(*edge.start_junction()).or_default();
        if outgoing.contains(&edge) {
            return;
        }
        outgoing.push(edge.clone());
        self.ingoing
            .entry(*edge.end_junction())
            .or_default()
            .push(edge);
    }

    /// Append the current fake edges leaving `junction` to `edges`.
    pub fn outgoing_edges(&self, junction: &Junction, edges: &mut Vec<RoadEdge>) {
        if let Some(es) = self.outgoing.get(junction) {
            edges.extend(es.iter().cloned());
        }
    }

    /// Append the current fake edges arriving at `junction` to `edges`.
    pub fn ingoing_edges(&self, junction: &Junction, edges: &mut Vec<RoadEdge>) {
        if let Some(es) = self.ingoing.get(junction) {
            edges.extend(es.iter().cloned());
        }
    }
}
