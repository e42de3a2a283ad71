//! Geometry helpers for turning a chain of product edges into a road
//! path: offset consumption, chain-to-segment matching and coverage.

use geo::{HaversineDistance, Point};

use crate::router::ProductEdge;
use crate::spatial::is_point_on_segment;

const ON_SEGMENT_EPS: f64 = 1e-5;
const MIN_SEGMENT_LENGTH_M: f64 = 1.0;

/// How many leading point pairs an offset consumes. A pair is consumed
/// while twice the remaining offset still covers its length, so an edge
/// is dropped only when the offset eats at least half of it.
pub(crate) fn prefix_length_to_consume<I>(pairs: I, mut length_m: f64) -> usize
where
    I: Iterator<Item = (Point<f64>, Point<f64>)>,
{
    let mut n = 0;
    for (u, v) in pairs {
        if length_m <= 0.0 {
            break;
        }
        let len = u.haversine_distance(&v);
        if 2.0 * length_m < len {
            break;
        }
        length_m -= len;
        n += 1;
    }
    n
}

/// Fraction of the segment u -> v covered by a chain of point pairs that
/// follow it. Stops at the first pair leaving the segment or running
/// against its direction; clamped to [0, 1].
pub(crate) fn matching_score<I>(u: Point<f64>, v: Point<f64>, pairs: I) -> f64
where
    I: Iterator<Item = (Point<f64>, Point<f64>)>,
{
    let len = u.haversine_distance(&v);
    let uv = (v.x() - u.x(), v.y() - u.y());

    let mut covered = 0.0;
    for (s, t) in pairs {
        if !is_point_on_segment(s, u, v, ON_SEGMENT_EPS)
            || !is_point_on_segment(t, u, v, ON_SEGMENT_EPS)
        {
            break;
        }
        let st = (t.x() - s.x(), t.y() - s.y());
        if uv.0 * st.0 + uv.1 * st.1 < -ON_SEGMENT_EPS {
            break;
        }
        covered += s.haversine_distance(&t);
    }

    if len == 0.0 {
        0.0
    } else {
        (covered / len).clamp(0.0, 1.0)
    }
}

/// Measure of the segment u -> v covered by the union of the projections
/// of `edges` onto it. Unlike [`matching_score`] this considers every
/// edge, not just a contiguous prefix.
pub(crate) fn coverage(u: Point<f64>, v: Point<f64>, edges: &[ProductEdge]) -> f64 {
    if u.haversine_distance(&v) < MIN_SEGMENT_LENGTH_M {
        return 0.0;
    }

    let uv = (v.x() - u.x(), v.y() - u.y());
    let sqlen = uv.0 * uv.0 + uv.1 * uv.1;

    let mut intervals: Vec<(f64, f64)> = Vec::new();
    for edge in edges {
        let (s, t) = edge.to_pair();
        if !is_point_on_segment(s, u, v, ON_SEGMENT_EPS)
            || !is_point_on_segment(t, u, v, ON_SEGMENT_EPS)
        {
            continue;
        }
        let st = (t.x() - s.x(), t.y() - s.y());
        if uv.0 * st.0 + uv.1 * st.1 < -ON_SEGMENT_EPS {
            continue;
        }

        let sp = (uv.0 * (s.x() - u.x()) + uv.1 * (s.y() - u.y())) / sqlen;
        let tp = (uv.0 * (t.x() - u.x()) + uv.1 * (t.y() - u.y())) / sqlen;
        let start = sp.min(tp).clamp(0.0, 1.0);
        let finish = sp.max(tp).clamp(0.0, 1.0);
        intervals.push((start, finish));
    }

    intervals.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut covered = 0.0;
    let mut i = 0;
    while i != intervals.len() {
        let mut j = i;
        let first = intervals[i].0;
        let mut last = intervals[i].1;
        while j != intervals.len() && intervals[j].0 <= last {
            last = last.max(intervals[j].1);
            j += 1;
        }
        covered += last - first;
        i = j;
    }

    debug_assert!(covered <= 1.0 + ON_SEGMENT_EPS);
    covered
}

/// Index of the first non-fake edge after the run of fake edges opening
/// `stage`, if the run ends inside the chain.
pub(crate) fn fake_prefix_end(edges: &[ProductEdge], stage: usize) -> Option<usize> {
    let mut i = 0;
    while i < edges.len()
        && edges[i].raw.is_fake()
        && edges[i].u.stage == stage
        && edges[i].v.stage == stage
    {
        i += 1;
    }
    (i < edges.len() && !edges[i].raw.is_fake()).then_some(i)
}

/// Index of the last non-fake edge before the run of fake edges closing
/// `stage`, if the run starts inside the chain.
pub(crate) fn fake_suffix_start(edges: &[ProductEdge], stage: usize) -> Option<usize> {
    let mut i = edges.len();
    while i > 0 {
        let e = &edges[i - 1];
        if !(e.raw.is_fake() && e.u.stage == stage && e.v.stage == stage) {
            break;
        }
        i -= 1;
    }
    (i > 0 && !edges[i - 1].raw.is_fake()).then(|| i - 1)
}
