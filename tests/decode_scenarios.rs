//! End-to-end decode scenarios over hand-built networks: exact matches,
//! parallel roads under FRC restriction, off-graph endpoints, offset
//! trimming, bearing-reversal penalties and the all-fake fallback.

use geo::{HaversineDistance, Point};
use openlr_matcher::test_utils::TestNetworkBuilder;
use openlr_matcher::{bearing_bucket, DecodeError, Frc, RoadEdge, Router, Waypoint};

const EAST: u8 = 64;
const WEST: u8 = 192;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn feature_ids(path: &[RoadEdge]) -> Vec<u64> {
    path.iter()
        .map(|e| e.feature_id().expect("decoded paths contain real edges only"))
        .collect()
}

fn assert_all_real(path: &[RoadEdge]) {
    assert!(path.iter().all(|e| !e.is_fake()));
}

#[test]
fn single_edge_reference_reproduces_that_edge() {
    init_logging();

    let n1 = Point::new(13.0, 52.0);
    let n2 = Point::new(13.003, 52.0);
    let network = TestNetworkBuilder::new()
        .junction(1, 52.0, 13.0)
        .junction(2, 52.0, 13.003)
        .two_way_road(1, 1, 2, Frc::Frc3)
        .build();

    let points = [
        Waypoint::new(n1, bearing_bucket(n1, n2), n1.haversine_distance(&n2), Frc::Frc3),
        Waypoint::new(n2, bearing_bucket(n2, n1), 0.0, Frc::Frc3),
    ];

    let mut router = Router::new(&network);
    let path = router.go(&points, 0.0, 0.0).expect("exact reference must decode");

    assert_eq!(feature_ids(&path), vec![1]);
    assert_all_real(&path);
    assert_eq!(path[0].start_junction().point(), n1);
    assert_eq!(path[0].end_junction().point(), n2);
}

#[test]
fn on_graph_reference_reproduces_the_listed_edges() {
    init_logging();

    let n1 = Point::new(13.0, 52.0);
    let n3 = Point::new(13.004, 52.0);
    let n4 = Point::new(13.006, 52.0);
    let network = TestNetworkBuilder::new()
        .junction(1, 52.0, 13.0)
        .junction(2, 52.0, 13.002)
        .junction(3, 52.0, 13.004)
        .junction(4, 52.0, 13.006)
        .two_way_road(1, 1, 2, Frc::Frc3)
        .two_way_road(2, 2, 3, Frc::Frc3)
        .two_way_road(3, 3, 4, Frc::Frc3)
        .build();

    let points = [
        Waypoint::new(n1, EAST, n1.haversine_distance(&n3), Frc::Frc3),
        Waypoint::new(n3, EAST, n3.haversine_distance(&n4), Frc::Frc3),
        Waypoint::new(n4, WEST, 0.0, Frc::Frc3),
    ];

    let mut router = Router::new(&network);
    let path = router.go(&points, 0.0, 0.0).expect("on-graph reference must decode");

    // Offsets of zero never remove a real edge from a purely real chain.
    assert_eq!(feature_ids(&path), vec![1, 2, 3]);
    assert_all_real(&path);
}

#[test]
fn frc_restriction_picks_the_acceptable_parallel_road() {
    init_logging();

    let n1 = Point::new(13.0, 52.0);
    let n2 = Point::new(13.003, 52.0);
    let n3 = Point::new(13.006, 52.0);
    // Two parallel roads between junctions 1 and 2: a major one and a
    // service road the reference's class restriction must filter out.
    let network = TestNetworkBuilder::new()
        .junction(1, 52.0, 13.0)
        .junction(2, 52.0, 13.003)
        .junction(3, 52.0, 13.006)
        .two_way_road(10, 1, 2, Frc::Frc0)
        .two_way_road(11, 1, 2, Frc::Frc7)
        .two_way_road(20, 2, 3, Frc::Frc0)
        .build();

    let points = [
        Waypoint::new(n1, EAST, n1.haversine_distance(&n2), Frc::Frc0),
        Waypoint::new(n2, EAST, n2.haversine_distance(&n3), Frc::Frc0),
        Waypoint::new(n3, WEST, 0.0, Frc::Frc0),
    ];

    let mut router = Router::new(&network);
    let path = router.go(&points, 0.0, 0.0).expect("restricted reference must decode");

    assert_eq!(feature_ids(&path), vec![10, 20]);
}

/// Network for the off-graph scenarios: a straight three-edge road with
/// both reference endpoints 10 m south of its ends.
fn off_graph_setup() -> (TestNetworkBuilder, [Point<f64>; 6]) {
    let n1 = Point::new(13.0, 52.0);
    let n2 = Point::new(13.002, 52.0);
    let n3 = Point::new(13.004, 52.0);
    let n4 = Point::new(13.006, 52.0);
    let source = Point::new(13.0, 51.99991);
    let target = Point::new(13.006, 51.99991);

    let builder = TestNetworkBuilder::new()
        .junction(1, 52.0, 13.0)
        .junction(2, 52.0, 13.002)
        .junction(3, 52.0, 13.004)
        .junction(4, 52.0, 13.006)
        .two_way_road(1, 1, 2, Frc::Frc3)
        .two_way_road(2, 2, 3, Frc::Frc3)
        .two_way_road(3, 3, 4, Frc::Frc3);

    (builder, [n1, n2, n3, n4, source, target])
}

#[test]
fn off_graph_endpoints_use_fakes_only_internally() {
    init_logging();

    let (builder, [n1, _, _, n4, source, target]) = off_graph_setup();
    let network = builder.build();

    let expected_m =
        source.haversine_distance(&n1) + n1.haversine_distance(&n4) + n4.haversine_distance(&target);
    let points = [
        Waypoint::new(source, EAST, expected_m, Frc::Frc3),
        Waypoint::new(target, WEST, 0.0, Frc::Frc3),
    ];

    let mut router = Router::new(&network);
    let path = router.go(&points, 0.0, 0.0).expect("off-graph reference must decode");

    // The fake connectors got the search on and off the road, but the
    // output is the real edges between the nearest junctions.
    assert_eq!(feature_ids(&path), vec![1, 2, 3]);
    assert_all_real(&path);
}

#[test]
fn positive_offset_drops_the_first_real_edge() {
    init_logging();

    let (builder, [n1, n2, n3, n4, source, target]) = off_graph_setup();
    let network = builder.build();

    let expected_m =
        source.haversine_distance(&n1) + n1.haversine_distance(&n4) + n4.haversine_distance(&target);
    let points = [
        Waypoint::new(source, EAST, expected_m, Frc::Frc3),
        Waypoint::new(target, WEST, 0.0, Frc::Frc3),
    ];

    // Enough to consume the leading fake connector and more than half of
    // the first real edge.
    let positive = source.haversine_distance(&n1) + 0.6 * n1.haversine_distance(&n2);
    let mut router = Router::new(&network);
    let path = router.go(&points, positive, 0.0).expect("offset reference must decode");
    assert_eq!(feature_ids(&path), vec![2, 3]);

    // The negative offset trims symmetrically from the back.
    let negative = target.haversine_distance(&n4) + 0.6 * n3.haversine_distance(&n4);
    let path = router.go(&points, positive, negative).expect("offset reference must decode");
    assert_eq!(feature_ids(&path), vec![2]);
}

#[test]
fn offset_consuming_the_whole_path_fails_the_decode() {
    init_logging();

    let n1 = Point::new(13.0, 52.0);
    let n2 = Point::new(13.003, 52.0);
    let network = TestNetworkBuilder::new()
        .junction(1, 52.0, 13.0)
        .junction(2, 52.0, 13.003)
        .two_way_road(1, 1, 2, Frc::Frc3)
        .build();

    let length = n1.haversine_distance(&n2);
    let points = [
        Waypoint::new(n1, bearing_bucket(n1, n2), length, Frc::Frc3),
        Waypoint::new(n2, bearing_bucket(n2, n1), 0.0, Frc::Frc3),
    ];

    let mut router = Router::new(&network);
    assert_eq!(
        router.go(&points, 3.0 * length, 0.0),
        Err(DecodeError::EmptyPath)
    );
}

#[test]
fn reversed_bearing_expectation_diverts_to_the_agreeing_route() {
    init_logging();

    // A detour west to C before heading east to B. The direct road runs
    // the wrong way for the expected bearing; its half-circle penalty of
    // 5 * pi * 25 m buys the detour's extra distance.
    let a = Point::new(13.0, 52.0);
    let b = Point::new(13.0044, 52.0);
    let c = Point::new(12.9985, 52.0002);
    let network = TestNetworkBuilder::new()
        .junction(1, 52.0, 13.0)
        .junction(2, 52.0, 13.0044)
        .junction(3, 52.0002, 12.9985)
        .two_way_road(1, 1, 2, Frc::Frc3)
        .two_way_road(2, 1, 3, Frc::Frc3)
        .two_way_road(3, 3, 2, Frc::Frc3)
        .build();

    let points = [
        Waypoint::new(a, bearing_bucket(a, c), 500.0, Frc::Frc3),
        Waypoint::new(b, WEST, 0.0, Frc::Frc3),
    ];

    let mut router = Router::new(&network);
    let path = router.go(&points, 0.0, 0.0).expect("detour reference must decode");
    assert_eq!(feature_ids(&path), vec![2, 3]);

    // With the expectation matching the direct road, the shorter route
    // wins outright.
    let points = [
        Waypoint::new(a, bearing_bucket(a, b), 500.0, Frc::Frc3),
        Waypoint::new(b, WEST, 0.0, Frc::Frc3),
    ];
    let path = router.go(&points, 0.0, 0.0).expect("direct reference must decode");
    assert_eq!(feature_ids(&path), vec![1]);
}

#[test]
fn all_fake_chain_falls_back_to_the_covered_single_edge() {
    init_logging();

    // A single one-way road; both reference points sit just off its
    // interior, so the best chain never touches a real edge.
    let x = Point::new(13.0, 52.0);
    let y = Point::new(13.003, 52.0);
    let network = TestNetworkBuilder::new()
        .junction(1, 52.0, 13.0)
        .junction(2, 52.0, 13.003)
        .road(1, 1, 2, Frc::Frc3)
        .build();

    let source = Point::new(13.0003, 51.99991);
    let target = Point::new(13.0027, 51.99991);
    let points = [
        Waypoint::new(source, EAST, source.haversine_distance(&target), Frc::Frc3),
        Waypoint::new(target, WEST, 0.0, Frc::Frc3),
    ];

    let mut router = Router::new(&network);
    let path = router.go(&points, 0.0, 0.0).expect("covered chain must decode");

    assert_eq!(feature_ids(&path), vec![1]);
    assert_eq!(path[0].start_junction().point(), x);
    assert_eq!(path[0].end_junction().point(), y);
}

#[test]
fn poorly_covered_all_fake_chain_fails_the_decode() {
    init_logging();

    // Like the fallback scenario, but the projections span only a fifth
    // of the road: the coverage threshold rejects the candidate.
    let network = TestNetworkBuilder::new()
        .junction(1, 52.0, 13.0)
        .junction(2, 52.0, 13.003)
        .road(1, 1, 2, Frc::Frc3)
        .build();

    let source = Point::new(13.0012, 51.99991);
    let target = Point::new(13.0018, 51.99991);
    let points = [
        Waypoint::new(source, EAST, source.haversine_distance(&target), Frc::Frc3),
        Waypoint::new(target, WEST, 0.0, Frc::Frc3),
    ];

    let mut router = Router::new(&network);
    assert_eq!(router.go(&points, 0.0, 0.0), Err(DecodeError::EmptyPath));
}

#[test]
fn router_instance_is_reusable_across_decodes() {
    init_logging();

    let n1 = Point::new(13.0, 52.0);
    let n2 = Point::new(13.003, 52.0);
    let network = TestNetworkBuilder::new()
        .junction(1, 52.0, 13.0)
        .junction(2, 52.0, 13.003)
        .two_way_road(1, 1, 2, Frc::Frc3)
        .build();

    let forward = [
        Waypoint::new(n1, bearing_bucket(n1, n2), n1.haversine_distance(&n2), Frc::Frc3),
        Waypoint::new(n2, bearing_bucket(n2, n1), 0.0, Frc::Frc3),
    ];
    let backward = [
        Waypoint::new(n2, bearing_bucket(n2, n1), n1.haversine_distance(&n2), Frc::Frc3),
        Waypoint::new(n1, bearing_bucket(n1, n2), 0.0, Frc::Frc3),
    ];

    let mut router = Router::new(&network);
    let first = router.go(&forward, 0.0, 0.0).expect("forward decode");
    let second = router.go(&backward, 0.0, 0.0).expect("backward decode");
    let third = router.go(&forward, 0.0, 0.0).expect("forward again");

    assert_eq!(feature_ids(&first), vec![1]);
    assert_eq!(feature_ids(&second), vec![1]);
    assert_eq!(first[0].start_junction(), second[0].end_junction());
    assert_eq!(first, third, "identical inputs decode identically");
}
