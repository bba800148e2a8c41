//! Bulk construction of static trees
//!
//! The recursive [`Grower`] is also what the dynamic manipulator runs when a
//! node overflows, so both lifecycles split nodes the same way.

use std::collections::HashSet;

use crate::config::TreeConfig;
use super::bounds::AxisAlignedBounds;
use super::entity::{EntityKey, IndexEntry, SpatialEntity};
use super::error::{TreeError, TreeResult};
use super::geometry::{OctantGeometry, PartitionGeometry};
use super::node::NodeId;
use super::policy::{check_cut, CutCheck, PartitionPolicy};
use super::tree::ShagamTree;
use super::zone::{Voxel, Zone, ZONE_BUCKETS};
use crate::foundation::math::Point3;

/// Builds a [`ShagamTree`] from a known set of entities
#[derive(Debug)]
pub struct StaticBuilder {
    config: TreeConfig,
    policy: Box<dyn PartitionPolicy>,
}

impl StaticBuilder {
    /// Create a builder using the policy named by `config`
    pub fn new(config: TreeConfig) -> TreeResult<Self> {
        config.validate()?;
        let policy = config.partition.policy();
        Ok(Self { config, policy })
    }

    /// Replace the partition policy
    pub fn with_policy(mut self, policy: impl PartitionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Index `entities` over `universe` with the standard octant geometry
    pub fn build<E: SpatialEntity>(
        &self,
        entities: &[E],
        universe: AxisAlignedBounds,
    ) -> TreeResult<ShagamTree<E::Key>> {
        self.build_with_geometry(entities, universe, OctantGeometry)
    }

    /// Index `entities` over `universe` with a custom geometry
    pub fn build_with_geometry<E: SpatialEntity, G: PartitionGeometry>(
        &self,
        entities: &[E],
        universe: AxisAlignedBounds,
        geometry: G,
    ) -> TreeResult<ShagamTree<E::Key, G>> {
        let mut seen = HashSet::with_capacity(entities.len());
        let mut pool = Vec::with_capacity(entities.len());
        for entity in entities {
            let entry = IndexEntry::of(entity);
            if !seen.insert(entry.key) {
                return Err(TreeError::duplicate(&entry.key));
            }
            pool.push(entry);
        }

        let mut tree = ShagamTree::with_geometry(universe, geometry);
        let root = tree.root();
        let indexes = (0..pool.len()).collect();
        let mut grower = Grower::new(&mut tree, self.policy.as_ref(), &self.config, pool);
        grower.grow(root, universe, indexes);

        let stats = tree.stats();
        log::debug!(
            "Built static tree: {} entities in {} nodes, max depth {}",
            stats.entities, stats.nodes, stats.max_depth
        );
        Ok(tree)
    }
}

/// Recursive node splitter shared by the builder and the manipulator.
///
/// Works on indexes into a pool of entries. Residents already present at a
/// visited node are drained into the pool and distributed with the batch.
pub(crate) struct Grower<'a, K, G> {
    tree: &'a mut ShagamTree<K, G>,
    policy: &'a dyn PartitionPolicy,
    config: &'a TreeConfig,
    pool: Vec<IndexEntry<K>>,
    touched: Vec<NodeId>,
}

impl<'a, K: EntityKey, G: PartitionGeometry> Grower<'a, K, G> {
    pub(crate) fn new(
        tree: &'a mut ShagamTree<K, G>,
        policy: &'a dyn PartitionPolicy,
        config: &'a TreeConfig,
        pool: Vec<IndexEntry<K>>,
    ) -> Self {
        Self { tree, policy, config, pool, touched: Vec::new() }
    }

    /// Nodes whose resident lists were rewritten
    pub(crate) fn into_touched(self) -> Vec<NodeId> {
        self.touched
    }

    /// Place the pooled entries `indexes` at or below `node`, whose extent is `region`
    pub(crate) fn grow(&mut self, node: NodeId, region: AxisAlignedBounds, mut indexes: Vec<usize>) {
        for entry in self.tree.take_residents(node) {
            indexes.push(self.pool.len());
            self.pool.push(entry);
        }
        self.touched.push(node);

        let (cut, fresh) = match self.tree.node_mut(node).cut {
            Some(cut) => (cut, false),
            None => match self.try_cut(node, &region, &indexes) {
                Some(cut) => (cut, true),
                None => {
                    self.attach_all(node, &indexes);
                    return;
                }
            },
        };

        let mut buckets: [Vec<usize>; ZONE_BUCKETS] = Default::default();
        for index in indexes {
            let zone = self.tree.classify_at(node, &self.pool[index].bounds);
            buckets[zone.bucket()].push(index);
        }
        let residents = std::mem::take(&mut buckets[ZONE_BUCKETS - 1]);
        self.attach_all(node, &residents);
        let voxel_count: usize = buckets.iter().map(Vec::len).sum();

        // An existing interior node only grows new children once it overflows
        let descend_all = fresh || voxel_count > self.config.splitting_threshold;
        for voxel in Voxel::ALL {
            let bucket = std::mem::take(&mut buckets[voxel.index()]);
            if bucket.is_empty() {
                continue;
            }
            let existing = self.tree.node_mut(node).children[voxel.index()];
            if existing.is_none() && !descend_all {
                self.attach_all(node, &bucket);
                continue;
            }
            let child = self.tree.ensure_child(node, voxel);
            let child_region = self.tree.geometry().sub_area(&region, Zone::Voxel(voxel), &cut);
            self.grow(child, child_region, bucket);
        }
    }

    /// Ask the policy for a cut and assign it if usable
    fn try_cut(&mut self, node: NodeId, region: &AxisAlignedBounds, indexes: &[usize]) -> Option<Point3> {
        let count = indexes.len();
        let (depth, retry_at, parent) = {
            let n = self.tree.node_mut(node);
            (n.depth, n.split_retry_at, n.parent)
        };
        if count <= self.config.splitting_threshold || depth >= self.config.max_depth || count < retry_at {
            return None;
        }

        let members: Vec<&AxisAlignedBounds> = indexes.iter().map(|&i| &self.pool[i].bounds).collect();
        let proposal = self.policy.cut_point(region, &members);
        let parent_cut = parent.and_then(|(parent_id, _)| self.tree.node(parent_id).and_then(|p| p.cut));

        let mut check = check_cut(region, proposal.as_ref(), parent_cut.as_ref());
        if let (CutCheck::Valid, Some(cut)) = (check, proposal.as_ref()) {
            // An interior node must push at least one entity down
            let separates = members
                .iter()
                .any(|bounds| self.tree.classify_around(node, cut, bounds).is_voxel());
            if !separates {
                check = CutCheck::Unseparated;
            }
        }

        match check {
            CutCheck::Valid => {
                let cut = proposal?;
                self.tree.set_cut(node, cut);
                log::debug!(
                    "Split {:?} at depth {} over {} entities, cut {}",
                    node, depth, count, cut
                );
                Some(cut)
            }
            refusal => {
                self.tree.node_mut(node).split_retry_at = count.saturating_mul(2);
                log::debug!(
                    "Refused cut for {:?} ({:?}); {} entities stay in a leaf",
                    node, refusal, count
                );
                None
            }
        }
    }

    fn attach_all(&mut self, node: NodeId, indexes: &[usize]) {
        for &index in indexes {
            self.tree.attach(node, self.pool[index]);
        }
    }
}
