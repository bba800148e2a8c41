//! Partition, duplication and round-trip properties of static and dynamic trees

use std::collections::HashSet;

use crate::config::TreeConfig;
use crate::foundation::math::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::spatial::{
    classify_bounds, sub_area, AxisAlignedBounds, DynamicManipulator, Icosep, IndexEntry, MidpointSplit,
    PartitionKind, ShagamTree, StaticBuilder, Voxel, Zone,
};

fn aabb(l: [f64; 3], u: [f64; 3]) -> AxisAlignedBounds {
    AxisAlignedBounds::new(Point3::from(l), Point3::from(u)).unwrap()
}

fn universe() -> AxisAlignedBounds {
    aabb([0.0, 0.0, 0.0], [200.0, 200.0, 200.0])
}

/// A deterministic mix of small boxes and plane-straddling boxes
fn mixed_population() -> Vec<IndexEntry<u32>> {
    let mut entries = Vec::new();
    for k in 0..60u32 {
        let x = f64::from((k * 37) % 190);
        let y = f64::from((k * 53) % 190);
        let z = f64::from((k * 71) % 190);
        let size = if k % 7 == 0 { 30.0 } else { 2.0 };
        let upper = |v: f64| (v + size).min(200.0);
        entries.push(IndexEntry::new(k, aabb([x, y, z], [upper(x), upper(y), upper(z)])));
    }
    entries
}

fn sorted(mut keys: Vec<u32>) -> Vec<u32> {
    keys.sort_unstable();
    keys
}

fn brute_force(entries: &[IndexEntry<u32>], region: &AxisAlignedBounds) -> Vec<u32> {
    sorted(entries.iter().filter(|e| e.bounds.intersects(region)).map(|e| e.key).collect())
}

fn sample_regions() -> Vec<AxisAlignedBounds> {
    vec![
        universe(),
        aabb([0.0, 0.0, 0.0], [50.0, 50.0, 50.0]),
        aabb([90.0, 90.0, 90.0], [110.0, 110.0, 110.0]),
        aabb([100.0, 0.0, 0.0], [100.0, 200.0, 200.0]),
        aabb([150.0, 20.0, 170.0], [199.0, 80.0, 199.0]),
        aabb([-10.0, -10.0, -10.0], [-1.0, -1.0, -1.0]),
    ]
}

#[test]
fn test_reference_classification_table() {
    let cut = Point3::new(100.0, 100.0, 100.0);
    let cases = [
        ([10.0, 10.0, 10.0], [20.0, 20.0, 20.0], Zone::Voxel(Voxel::SouthWestFront)),
        ([110.0, 110.0, 110.0], [120.0, 120.0, 120.0], Zone::Voxel(Voxel::NorthEastBack)),
        ([90.0, 10.0, 10.0], [110.0, 20.0, 20.0], Zone::Icosep(Icosep::Yz)),
        ([10.0, 90.0, 10.0], [20.0, 110.0, 20.0], Zone::Icosep(Icosep::Xz)),
        ([10.0, 10.0, 90.0], [20.0, 20.0, 110.0], Zone::Icosep(Icosep::Xy)),
        ([90.0, 90.0, 90.0], [110.0, 110.0, 110.0], Zone::Icosep(Icosep::Spanning)),
    ];
    for (lower, upper, expected) in cases {
        assert_eq!(classify_bounds(&cut, &aabb(lower, upper)), expected, "{lower:?}..{upper:?}");
    }
}

#[test]
fn test_zone_sub_area_contains_the_box() {
    let mut rng = StdRng::seed_from_u64(17);
    let parent = universe();
    for _ in 0..2_000 {
        // Snap to a coarse grid so boxes regularly touch or lie on the cut planes
        let mut coord = || f64::from(rng.gen_range(0..=20u32)) * 10.0;
        let cut = Point3::new(coord(), coord(), coord());
        let (a, b) = ([coord(), coord(), coord()], [coord(), coord(), coord()]);
        let lower = [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])];
        let upper = [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])];
        let sample = aabb(lower, upper);

        let zone = classify_bounds(&cut, &sample);
        assert_ne!(zone, Zone::Indeterminate);
        assert!(
            sub_area(&parent, zone, &cut).contains(&sample),
            "{sample} escapes {zone:?} around {cut}"
        );
    }
}

#[test]
fn test_every_entity_in_exactly_one_node() {
    let entries = mixed_population();
    let tree = StaticBuilder::new(TreeConfig::with_threshold(3))
        .unwrap()
        .build(&entries, universe())
        .unwrap();
    let mut seen = HashSet::new();
    for (_, entry) in tree.entries() {
        assert!(seen.insert(entry.key), "{} stored twice", entry.key);
    }
    assert_eq!(seen.len(), entries.len());
    assert!(tree.check_integrity().is_clean());
}

#[test]
fn test_query_matches_brute_force() {
    let entries = mixed_population();
    for threshold in [1, 3, 8] {
        let tree = StaticBuilder::new(TreeConfig::with_threshold(threshold))
            .unwrap()
            .build(&entries, universe())
            .unwrap();
        for region in sample_regions() {
            assert_eq!(sorted(tree.query_keys(&region)), brute_force(&entries, &region));
        }
    }
}

#[test]
fn test_residents_fit_their_node() {
    let entries = mixed_population();
    let tree: ShagamTree<u32> = StaticBuilder::new(TreeConfig::with_threshold(2))
        .unwrap()
        .with_policy(MidpointSplit)
        .build(&entries, universe())
        .unwrap();
    for (id, entry) in tree.entries() {
        let area = tree.node_bounds(id).unwrap();
        assert!(area.contains(&entry.bounds), "{} outside its node", entry.key);
    }
}

#[test]
fn test_static_and_dynamic_hold_same_entities() {
    let entries = mixed_population();
    let config = TreeConfig::with_threshold(4);
    let tree = StaticBuilder::new(config.clone()).unwrap().build(&entries, universe()).unwrap();

    let mut dynamic = DynamicManipulator::new(universe(), config).unwrap();
    for entry in &entries {
        dynamic.insert(entry).unwrap();
    }
    assert!(dynamic.tree().check_integrity().is_clean());

    for region in sample_regions() {
        assert_eq!(sorted(tree.query_keys(&region)), sorted(dynamic.tree().query_keys(&region)));
    }

    // Removing everything brings the dynamic tree back to its root
    for entry in &entries {
        dynamic.remove(&entry.key).unwrap();
    }
    assert!(dynamic.is_empty());
    assert_eq!(dynamic.tree().node_count(), 1);
}

#[test]
fn test_relocation_equals_remove_then_insert() {
    let entries = mixed_population();
    let config = TreeConfig::with_threshold(3);
    let mut relocated = DynamicManipulator::from_entities(universe(), config.clone(), &entries).unwrap();
    let mut reinserted = DynamicManipulator::from_entities(universe(), config, &entries).unwrap();

    let target = aabb([120.0, 30.0, 60.0], [123.0, 33.0, 63.0]);
    for key in [0, 5, 14, 33] {
        relocated.relocate(&key, target).unwrap();
        reinserted.remove(&key).unwrap();
        reinserted.insert_entry(IndexEntry::new(key, target)).unwrap();
    }

    for region in sample_regions().into_iter().chain([target]) {
        assert_eq!(
            sorted(relocated.tree().query_keys(&region)),
            sorted(reinserted.tree().query_keys(&region))
        );
    }
    assert!(relocated.tree().check_integrity().is_clean());
}

#[test]
fn test_second_remove_reports_not_found() {
    let entries = mixed_population();
    let mut dynamic = DynamicManipulator::from_entities(universe(), TreeConfig::default(), &entries).unwrap();
    dynamic.remove(&10).unwrap();
    let err = dynamic.remove(&10).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(dynamic.len(), entries.len() - 1);
}

/// Walkers on a flat floor: every box shares the same height band
fn ground_band() -> Vec<IndexEntry<u32>> {
    (0..200u32)
        .map(|k| {
            let x = f64::from((k * 389) % 996);
            let y = f64::from((k * 613) % 996);
            IndexEntry::new(k, aabb([x, y, 0.0], [x + 4.0, y + 4.0, 2.0]))
        })
        .collect()
}

fn floor_universe() -> AxisAlignedBounds {
    aabb([0.0, 0.0, 0.0], [1000.0, 1000.0, 100.0])
}

#[test]
fn test_ground_band_leaves_the_root() {
    let entries = ground_band();
    let tree = StaticBuilder::new(TreeConfig::default())
        .unwrap()
        .build(&entries, floor_universe())
        .unwrap();
    let root_residents = tree.node(tree.root()).unwrap().entities().len();
    assert!(tree.node_count() > 1);
    assert!(root_residents < 20, "{root_residents} entities stuck at the root");
    assert!(tree.stats().max_depth > 0);

    let mut dynamic = DynamicManipulator::new(floor_universe(), TreeConfig::default()).unwrap();
    for entry in &entries {
        dynamic.insert(entry).unwrap();
    }
    let root_residents = dynamic.tree().node(dynamic.tree().root()).unwrap().entities().len();
    assert!(dynamic.tree().node_count() > 1);
    assert!(root_residents < 20, "{root_residents} entities stuck at the root");
    assert!(dynamic.tree().check_integrity().is_clean());

    let region = aabb([100.0, 100.0, 0.0], [400.0, 300.0, 1.0]);
    assert_eq!(sorted(tree.query_keys(&region)), brute_force(&entries, &region));
    assert_eq!(sorted(dynamic.tree().query_keys(&region)), brute_force(&entries, &region));
}

#[test]
fn test_separable_population_splits_under_every_policy() {
    // A 4x4x4 grid of cubes that no median or midpoint plane crosses
    let coords = [10.0, 50.0, 90.0, 130.0];
    let mut entries = Vec::new();
    for x in coords {
        for y in coords {
            for z in coords {
                let key = u32::try_from(entries.len()).unwrap();
                entries.push(IndexEntry::new(key, aabb([x, y, z], [x + 2.0, y + 2.0, z + 2.0])));
            }
        }
    }

    for partition in [PartitionKind::Median, PartitionKind::Midpoint] {
        let config = TreeConfig { partition, ..TreeConfig::default() };
        let tree = StaticBuilder::new(config.clone()).unwrap().build(&entries, universe()).unwrap();
        let stats = tree.stats();
        assert_eq!(stats.interior_residents, 0, "{partition:?}: {stats:?}");
        assert!(stats.max_depth > 0, "{partition:?}: {stats:?}");
        for (_, node) in tree.nodes() {
            assert!(node.entities().len() <= config.splitting_threshold, "{partition:?}: {stats:?}");
        }

        let threshold = config.splitting_threshold;
        let mut dynamic = DynamicManipulator::new(universe(), config).unwrap();
        for entry in &entries {
            dynamic.insert(entry).unwrap();
        }
        let stats = dynamic.tree().stats();
        let root_residents = dynamic.tree().node(dynamic.tree().root()).unwrap().entities().len();
        assert!(stats.max_depth > 0, "{partition:?}: {stats:?}");
        assert!(root_residents < entries.len(), "{partition:?}: {root_residents} at the root");
        if partition == PartitionKind::Midpoint {
            // Nothing crosses the center planes, so only pending voxel residents remain
            assert!(root_residents <= threshold, "{root_residents} at the root");
        }
    }
}
