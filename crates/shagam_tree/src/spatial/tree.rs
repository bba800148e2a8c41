//! Arena-backed Shagam tree
//!
//! Nodes live in a slot map and refer to each other by [`NodeId`]. The tree
//! itself only exposes read access; static trees come out of the
//! [`StaticBuilder`](super::StaticBuilder) and dynamic trees are mutated
//! through a [`DynamicManipulator`](super::DynamicManipulator).

use std::collections::HashSet;

use slotmap::SlotMap;

use crate::foundation::math::Point3;
use super::bounds::AxisAlignedBounds;
use super::entity::{EntityKey, IndexEntry};
use super::geometry::{OctantGeometry, PartitionGeometry};
use super::node::{NodeId, TreeNode};
use super::zone::{Voxel, Zone};

/// Spatial partition tree over entity keys
#[derive(Debug, Clone)]
pub struct ShagamTree<K, G = OctantGeometry> {
    nodes: SlotMap<NodeId, TreeNode<K>>,
    root: NodeId,
    universe: AxisAlignedBounds,
    geometry: G,
    len: usize,
}

impl<K: EntityKey> ShagamTree<K, OctantGeometry> {
    /// Create an empty tree covering `universe`
    pub fn new(universe: AxisAlignedBounds) -> Self {
        Self::with_geometry(universe, OctantGeometry)
    }
}

impl<K: EntityKey, G: PartitionGeometry> ShagamTree<K, G> {
    /// Create an empty tree with a custom geometry policy
    pub fn with_geometry(universe: AxisAlignedBounds, geometry: G) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(TreeNode::new(None, 0));
        Self { nodes, root, universe, geometry, len: 0 }
    }

    /// Bounds covered by the root node
    pub fn universe(&self) -> &AxisAlignedBounds {
        &self.universe
    }

    /// Geometry policy in use
    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Root node handle
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&TreeNode<K>> {
        self.nodes.get(id)
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no entity is indexed
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over every node
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TreeNode<K>)> {
        self.nodes.iter()
    }

    /// Iterate over every indexed entity with the node holding it
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, &IndexEntry<K>)> {
        self.nodes
            .iter()
            .flat_map(|(id, node)| node.entities.iter().map(move |entry| (id, entry)))
    }

    /// Zone of `bounds` at a node.
    ///
    /// A node without a cut, or a root-level box leaving the universe, has no
    /// valid zone: the box must stay at that node.
    pub fn classify_at(&self, id: NodeId, bounds: &AxisAlignedBounds) -> Zone {
        let Some(cut) = self.nodes.get(id).and_then(|node| node.cut.as_ref()) else {
            return Zone::Indeterminate;
        };
        self.classify_around(id, cut, bounds)
    }

    /// Zone of `bounds` if node `id` were cut at `cut`
    pub(crate) fn classify_around(&self, id: NodeId, cut: &Point3, bounds: &AxisAlignedBounds) -> Zone {
        if id == self.root && !self.universe.contains(bounds) {
            return Zone::Indeterminate;
        }
        self.geometry.classify(cut, bounds)
    }

    /// Cut points and voxels from the root down to `id`
    pub fn zone_history(&self, id: NodeId) -> Option<Vec<(Point3, Voxel)>> {
        let mut history = Vec::new();
        let mut current = self.nodes.get(id)?;
        while let Some((parent_id, voxel)) = current.parent {
            let parent = self.nodes.get(parent_id)?;
            history.push((parent.cut?, voxel));
            current = parent;
        }
        history.reverse();
        Some(history)
    }

    /// Spatial extent of a node, carved from the universe along its ancestor chain
    pub fn node_bounds(&self, id: NodeId) -> Option<AxisAlignedBounds> {
        let history = self.zone_history(id)?;
        Some(history.iter().fold(self.universe, |area, (cut, voxel)| {
            self.geometry.sub_area(&area, Zone::Voxel(*voxel), cut)
        }))
    }

    /// Deepest existing node an insertion of `bounds` would stop at
    pub fn locate(&self, bounds: &AxisAlignedBounds) -> NodeId {
        let mut current = self.root;
        loop {
            let Some(voxel) = self.classify_at(current, bounds).voxel() else {
                return current;
            };
            match self.nodes[current].children[voxel.index()] {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Node currently holding `key`, found by a full scan.
    ///
    /// Dynamic trees answer this in O(1) through their manipulator.
    pub fn find(&self, key: &K) -> Option<NodeId> {
        self.entries()
            .find(|(_, entry)| entry.key == *key)
            .map(|(id, _)| id)
    }

    /// All entities whose bounds intersect `region`
    pub fn query(&self, region: &AxisAlignedBounds) -> QueryIter<'_, K, G> {
        QueryIter {
            tree: self,
            region: *region,
            stack: vec![(self.root, self.universe)],
            current: None,
        }
    }

    /// Keys of all entities whose bounds intersect `region`
    pub fn query_keys(&self, region: &AxisAlignedBounds) -> Vec<K> {
        self.query(region).map(|entry| entry.key).collect()
    }

    /// Structural statistics
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            entities: self.len,
            nodes: self.nodes.len(),
            ..TreeStats::default()
        };
        for node in self.nodes.values() {
            if node.is_leaf() {
                stats.leaf_nodes += 1;
            } else {
                stats.interior_nodes += 1;
                stats.interior_residents += node.entities.len();
            }
            stats.max_depth = stats.max_depth.max(node.depth);
        }
        stats
    }

    /// Verify the structural invariants of the tree
    pub fn check_integrity(&self) -> IntegrityReport {
        let mut report = IntegrityReport::default();
        let mut seen = HashSet::new();

        if !self.nodes.contains_key(self.root) {
            report.issues.push("root handle does not resolve".to_string());
            return report;
        }
        if self.nodes[self.root].parent.is_some() {
            report.issues.push("root has a parent link".to_string());
        }

        for (id, node) in &self.nodes {
            report.nodes_checked += 1;

            if id != self.root {
                match node.parent {
                    None => report.issues.push(format!("{id:?}: non-root node without parent")),
                    Some((parent_id, voxel)) => match self.nodes.get(parent_id) {
                        None => report.issues.push(format!("{id:?}: parent {parent_id:?} missing")),
                        Some(parent) => {
                            if parent.children[voxel.index()] != Some(id) {
                                report.issues.push(format!(
                                    "{id:?}: parent {parent_id:?} does not list it under {voxel:?}"
                                ));
                            }
                            if node.depth != parent.depth + 1 {
                                report.issues.push(format!("{id:?}: depth {} inconsistent", node.depth));
                            }
                        }
                    },
                }
            }

            if node.has_children() && node.cut.is_none() {
                report.issues.push(format!("{id:?}: children without a cut point"));
            }
            for (voxel, child) in node.children() {
                match self.nodes.get(child) {
                    Some(c) if c.parent == Some((id, voxel)) => {}
                    Some(_) => report.issues.push(format!("{id:?}: child {child:?} links elsewhere")),
                    None => report.issues.push(format!("{id:?}: child {child:?} missing")),
                }
            }

            let mut voxel_residents = 0;
            for entry in &node.entities {
                report.entities_checked += 1;
                if !seen.insert(entry.key) {
                    report.issues.push(format!("{:?}: indexed more than once", entry.key));
                }
                if !self.path_admits(id, &entry.bounds) {
                    report.issues.push(format!("{:?}: stored below a node it does not classify into", entry.key));
                }
                let zone = self.classify_at(id, &entry.bounds);
                if let Some(voxel) = zone.voxel() {
                    voxel_residents += 1;
                    if node.children[voxel.index()].is_some() {
                        report.issues.push(format!("{:?}: resident at {id:?} but child {voxel:?} exists", entry.key));
                    }
                }
            }
            if node.cut.is_some() && voxel_residents != node.voxel_residents {
                report.issues.push(format!(
                    "{id:?}: voxel resident count {} but {} found",
                    node.voxel_residents, voxel_residents
                ));
            }
        }

        if report.entities_checked != self.len {
            report.issues.push(format!(
                "tree length {} but {} entities stored",
                self.len, report.entities_checked
            ));
        }
        report
    }

    /// Whether every ancestor of `id` classifies `bounds` into the voxel leading to `id`
    fn path_admits(&self, id: NodeId, bounds: &AxisAlignedBounds) -> bool {
        let mut current = id;
        while let Some((parent_id, voxel)) = self.nodes.get(current).and_then(|n| n.parent) {
            if self.classify_at(parent_id, bounds) != Zone::Voxel(voxel) {
                return false;
            }
            current = parent_id;
        }
        true
    }

    // Mutation primitives shared by the builder and the manipulator

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode<K> {
        &mut self.nodes[id]
    }

    /// Create the child for `voxel` under `parent`, or return the existing one
    pub(crate) fn ensure_child(&mut self, parent: NodeId, voxel: Voxel) -> NodeId {
        if let Some(child) = self.nodes[parent].children[voxel.index()] {
            return child;
        }
        let depth = self.nodes[parent].depth + 1;
        let child = self.nodes.insert(TreeNode::new(Some((parent, voxel)), depth));
        self.nodes[parent].children[voxel.index()] = Some(child);
        child
    }

    /// Assign the cut point of a leaf, turning it into an interior node
    pub(crate) fn set_cut(&mut self, id: NodeId, cut: Point3) {
        debug_assert!(self.nodes[id].cut.is_none(), "a node is split at most once");
        self.nodes[id].cut = Some(cut);
        let count = self.nodes[id]
            .entities
            .iter()
            .filter(|entry| self.classify_at(id, &entry.bounds).is_voxel())
            .count();
        self.nodes[id].voxel_residents = count;
    }

    /// Append an entry to a node; returns its slot
    pub(crate) fn attach(&mut self, id: NodeId, entry: IndexEntry<K>) -> usize {
        let is_voxel = self.classify_at(id, &entry.bounds).is_voxel();
        let node = &mut self.nodes[id];
        if is_voxel {
            node.voxel_residents += 1;
        }
        node.entities.push(entry);
        self.len += 1;
        node.entities.len() - 1
    }

    /// Remove the entry at `slot`; returns it and the key moved into `slot`, if any
    pub(crate) fn detach(&mut self, id: NodeId, slot: usize) -> (IndexEntry<K>, Option<K>) {
        let entry = self.nodes[id].entities.swap_remove(slot);
        let is_voxel = self.classify_at(id, &entry.bounds).is_voxel();
        let node = &mut self.nodes[id];
        if is_voxel {
            node.voxel_residents -= 1;
        }
        self.len -= 1;
        let moved = node.entities.get(slot).map(|e| e.key);
        (entry, moved)
    }

    /// Take every resident out of a node
    pub(crate) fn take_residents(&mut self, id: NodeId) -> Vec<IndexEntry<K>> {
        let node = &mut self.nodes[id];
        let taken = std::mem::take(&mut node.entities);
        node.voxel_residents = 0;
        self.len -= taken.len();
        taken
    }

    /// Replace the bounds of a resident without moving it
    pub(crate) fn update_bounds(&mut self, id: NodeId, slot: usize, bounds: AxisAlignedBounds) {
        let old = self.nodes[id].entities[slot].bounds;
        let was_voxel = self.classify_at(id, &old).is_voxel();
        let is_voxel = self.classify_at(id, &bounds).is_voxel();
        let node = &mut self.nodes[id];
        node.entities[slot].bounds = bounds;
        match (was_voxel, is_voxel) {
            (false, true) => node.voxel_residents += 1,
            (true, false) => node.voxel_residents -= 1,
            _ => {}
        }
    }

    /// Destroy vacant nodes from `id` upwards; the root is never destroyed.
    ///
    /// Returns how many nodes were removed.
    pub(crate) fn prune_from(&mut self, id: NodeId) -> usize {
        let mut removed = 0;
        let mut current = id;
        while current != self.root {
            let Some(node) = self.nodes.get(current) else {
                break;
            };
            if !node.is_vacant() {
                break;
            }
            let Some((parent, voxel)) = node.parent else {
                break;
            };
            self.nodes.remove(current);
            self.nodes[parent].children[voxel.index()] = None;
            removed += 1;
            current = parent;
        }
        if removed > 0 {
            log::debug!("Pruned {} vacant node(s)", removed);
        }
        removed
    }
}

/// Lazy range query over a tree.
///
/// Visits only nodes whose region intersects the query region, and checks the
/// residents of every visited node, so icosep entities held by interior
/// nodes are reported too.
pub struct QueryIter<'a, K, G> {
    tree: &'a ShagamTree<K, G>,
    region: AxisAlignedBounds,
    stack: Vec<(NodeId, AxisAlignedBounds)>,
    current: Option<std::slice::Iter<'a, IndexEntry<K>>>,
}

impl<'a, K: EntityKey, G: PartitionGeometry> Iterator for QueryIter<'a, K, G> {
    type Item = &'a IndexEntry<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            if let Some(residents) = self.current.as_mut() {
                let region = &self.region;
                if let Some(found) = residents.find(|entry| tree.geometry.intersects(&entry.bounds, region)) {
                    return Some(found);
                }
            }

            let (id, area) = self.stack.pop()?;
            let Some(node) = tree.nodes.get(id) else {
                continue;
            };
            self.current = Some(node.entities.iter());

            if let Some(cut) = node.cut.as_ref() {
                for (voxel, child) in node.children() {
                    let child_area = tree.geometry.sub_area(&area, Zone::Voxel(voxel), cut);
                    if tree.geometry.intersects(&child_area, &self.region) {
                        self.stack.push((child, child_area));
                    }
                }
            }
        }
    }
}

/// Structural statistics of a tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Indexed entities
    pub entities: usize,
    /// Live nodes
    pub nodes: usize,
    /// Nodes without a cut point
    pub leaf_nodes: usize,
    /// Nodes with a cut point
    pub interior_nodes: usize,
    /// Entities held by interior nodes (straddlers and pending voxel residents)
    pub interior_residents: usize,
    /// Deepest node depth
    pub max_depth: u32,
}

/// Result of [`ShagamTree::check_integrity`]
#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    /// Nodes visited
    pub nodes_checked: usize,
    /// Entities visited
    pub entities_checked: usize,
    /// Human readable invariant violations
    pub issues: Vec<String>,
}

impl IntegrityReport {
    /// Whether no invariant violation was found
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(l: [f64; 3], u: [f64; 3]) -> AxisAlignedBounds {
        AxisAlignedBounds::new(Point3::from(l), Point3::from(u)).unwrap()
    }

    fn universe() -> AxisAlignedBounds {
        aabb([0.0, 0.0, 0.0], [200.0, 200.0, 200.0])
    }

    #[test]
    fn test_empty_tree_queries_nothing() {
        let tree: ShagamTree<u32> = ShagamTree::new(universe());
        assert!(tree.is_empty());
        assert_eq!(tree.query(&universe()).count(), 0);
        assert!(tree.check_integrity().is_clean());
        assert_eq!(tree.locate(&aabb([1.0, 1.0, 1.0], [2.0, 2.0, 2.0])), tree.root());
    }

    #[test]
    fn test_manual_split_and_query() {
        let mut tree: ShagamTree<u32> = ShagamTree::new(universe());
        let root = tree.root();
        tree.set_cut(root, Point3::new(100.0, 100.0, 100.0));
        let child = tree.ensure_child(root, Voxel::NorthEastBack);
        assert_eq!(tree.ensure_child(root, Voxel::NorthEastBack), child);

        let inside = aabb([150.0, 150.0, 150.0], [160.0, 160.0, 160.0]);
        let straddler = aabb([90.0, 10.0, 10.0], [110.0, 20.0, 20.0]);
        assert_eq!(tree.locate(&inside), child);
        assert_eq!(tree.locate(&straddler), root);

        tree.attach(child, IndexEntry::new(1, inside));
        tree.attach(root, IndexEntry::new(2, straddler));
        assert!(tree.check_integrity().is_clean());

        assert_eq!(tree.node_bounds(child), Some(aabb([100.0, 100.0, 100.0], [200.0, 200.0, 200.0])));
        assert_eq!(tree.query_keys(&aabb([155.0, 155.0, 155.0], [156.0, 156.0, 156.0])), vec![1]);
        assert_eq!(tree.query_keys(&aabb([95.0, 15.0, 15.0], [96.0, 16.0, 16.0])), vec![2]);
        assert!(tree.query_keys(&aabb([10.0, 150.0, 10.0], [20.0, 160.0, 20.0])).is_empty());
        assert_eq!(tree.find(&1), Some(child));
    }

    #[test]
    fn test_out_of_universe_stays_at_root() {
        let mut tree: ShagamTree<u32> = ShagamTree::new(universe());
        let root = tree.root();
        tree.set_cut(root, Point3::new(100.0, 100.0, 100.0));
        tree.ensure_child(root, Voxel::SouthWestFront);

        let outside = aabb([-50.0, -50.0, -50.0], [-40.0, -40.0, -40.0]);
        assert_eq!(tree.classify_at(root, &outside), Zone::Indeterminate);
        assert_eq!(tree.locate(&outside), root);

        tree.attach(root, IndexEntry::new(7, outside));
        assert_eq!(tree.query_keys(&aabb([-45.0, -45.0, -45.0], [-44.0, -44.0, -44.0])), vec![7]);
    }

    #[test]
    fn test_detach_reports_moved_key() {
        let mut tree: ShagamTree<u32> = ShagamTree::new(universe());
        let root = tree.root();
        let b = aabb([1.0, 1.0, 1.0], [2.0, 2.0, 2.0]);
        for key in 0..3 {
            tree.attach(root, IndexEntry::new(key, b));
        }
        let (entry, moved) = tree.detach(root, 0);
        assert_eq!(entry.key, 0);
        assert_eq!(moved, Some(2));
        let (_, moved) = tree.detach(root, 1);
        assert_eq!(moved, None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_prune_stops_at_occupied_ancestor() {
        let mut tree: ShagamTree<u32> = ShagamTree::new(universe());
        let root = tree.root();
        tree.set_cut(root, Point3::new(100.0, 100.0, 100.0));
        let child = tree.ensure_child(root, Voxel::SouthWestFront);
        tree.set_cut(child, Point3::new(50.0, 50.0, 50.0));
        let grandchild = tree.ensure_child(child, Voxel::SouthWestFront);
        tree.attach(root, IndexEntry::new(1, aabb([90.0, 0.0, 0.0], [110.0, 1.0, 1.0])));

        assert_eq!(tree.prune_from(grandchild), 2);
        assert!(tree.node(grandchild).is_none());
        assert!(tree.node(child).is_none());
        assert!(tree.node(root).unwrap().cut().is_some());
        assert!(tree.check_integrity().is_clean());
    }

    #[test]
    fn test_stats_count_nodes() {
        let mut tree: ShagamTree<u32> = ShagamTree::new(universe());
        let root = tree.root();
        tree.set_cut(root, Point3::new(100.0, 100.0, 100.0));
        tree.ensure_child(root, Voxel::SouthWestFront);
        tree.ensure_child(root, Voxel::NorthEastBack);
        let stats = tree.stats();
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.interior_nodes, 1);
        assert_eq!(stats.leaf_nodes, 2);
        assert_eq!(stats.max_depth, 1);
    }
}
