//! Incremental maintenance of a dynamic tree
//!
//! The manipulator owns the tree and a locator per entity key, so removal and
//! relocation find their entity without searching.

use std::collections::HashMap;

use crate::config::TreeConfig;
use super::bounds::AxisAlignedBounds;
use super::builder::{Grower, StaticBuilder};
use super::entity::{EntityKey, IndexEntry, SpatialEntity};
use super::error::{TreeError, TreeResult};
use super::geometry::{OctantGeometry, PartitionGeometry};
use super::node::NodeId;
use super::policy::PartitionPolicy;
use super::tree::{QueryIter, ShagamTree};
use super::zone::Zone;

/// Position of an entity inside the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    /// Node holding the entity
    pub node: NodeId,
    /// Index in the node's resident list
    pub slot: usize,
}

/// Owner of a dynamic [`ShagamTree`]
#[derive(Debug)]
pub struct DynamicManipulator<K, G = OctantGeometry> {
    tree: ShagamTree<K, G>,
    owners: HashMap<K, Locator>,
    config: TreeConfig,
    policy: Box<dyn PartitionPolicy>,
}

impl<K: EntityKey> DynamicManipulator<K, OctantGeometry> {
    /// Create an empty dynamic tree over `universe`
    pub fn new(universe: AxisAlignedBounds, config: TreeConfig) -> TreeResult<Self> {
        Self::with_geometry(universe, config, OctantGeometry)
    }

    /// Bulk-load `entities` through the static builder, then track them
    pub fn from_entities<E: SpatialEntity<Key = K>>(
        universe: AxisAlignedBounds,
        config: TreeConfig,
        entities: &[E],
    ) -> TreeResult<Self> {
        let builder = StaticBuilder::new(config.clone())?;
        let tree = builder.build(entities, universe)?;
        let mut manipulator = Self {
            tree,
            owners: HashMap::with_capacity(entities.len()),
            policy: config.partition.policy(),
            config,
        };
        let all: Vec<NodeId> = manipulator.tree.nodes().map(|(id, _)| id).collect();
        manipulator.reindex(&all);
        Ok(manipulator)
    }
}

impl<K: EntityKey, G: PartitionGeometry> DynamicManipulator<K, G> {
    /// Create an empty dynamic tree with a custom geometry
    pub fn with_geometry(universe: AxisAlignedBounds, config: TreeConfig, geometry: G) -> TreeResult<Self> {
        config.validate()?;
        Ok(Self {
            tree: ShagamTree::with_geometry(universe, geometry),
            owners: HashMap::new(),
            policy: config.partition.policy(),
            config,
        })
    }

    /// Replace the partition policy used for future splits
    pub fn with_policy(mut self, policy: impl PartitionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Read access to the managed tree
    pub fn tree(&self) -> &ShagamTree<K, G> {
        &self.tree
    }

    /// Stop tracking and hand out the tree
    pub fn into_tree(self) -> ShagamTree<K, G> {
        self.tree
    }

    /// Number of tracked entities
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Whether `key` is tracked
    pub fn contains(&self, key: &K) -> bool {
        self.owners.contains_key(key)
    }

    /// Locator of a tracked entity
    pub fn owner_of(&self, key: &K) -> Option<Locator> {
        self.owners.get(key).copied()
    }

    /// Bounds the entity was last placed with
    pub fn bounds_of(&self, key: &K) -> Option<AxisAlignedBounds> {
        let locator = self.owners.get(key)?;
        self.tree
            .node(locator.node)
            .and_then(|node| node.entities().get(locator.slot))
            .map(|entry| entry.bounds)
    }

    /// Zone of `bounds` at `node`
    pub fn classify(&self, node: NodeId, bounds: &AxisAlignedBounds) -> Zone {
        self.tree.classify_at(node, bounds)
    }

    /// All tracked entities intersecting `region`
    pub fn query(&self, region: &AxisAlignedBounds) -> QueryIter<'_, K, G> {
        self.tree.query(region)
    }

    /// Start tracking an entity
    pub fn insert<E: SpatialEntity<Key = K>>(&mut self, entity: &E) -> TreeResult<NodeId> {
        self.insert_entry(IndexEntry::of(entity))
    }

    /// Start tracking a key with the given bounds
    pub fn insert_entry(&mut self, entry: IndexEntry<K>) -> TreeResult<NodeId> {
        if self.owners.contains_key(&entry.key) {
            return Err(TreeError::duplicate(&entry.key));
        }
        let node = self.tree.locate(&entry.bounds);
        let slot = self.tree.attach(node, entry);
        self.owners.insert(entry.key, Locator { node, slot });
        log::trace!("Inserted {:?} at {:?}", entry.key, node);
        self.maybe_split(node);
        Ok(self.owners.get(&entry.key).map_or(node, |locator| locator.node))
    }

    /// Stop tracking `key`; returns its last bounds
    pub fn remove(&mut self, key: &K) -> TreeResult<AxisAlignedBounds> {
        let Some(locator) = self.owners.remove(key) else {
            log::debug!("Remove of untracked {:?}", key);
            return Err(TreeError::not_found(key));
        };
        let entry = self.detach(locator);
        log::trace!("Removed {:?} from {:?}", key, locator.node);
        if self.config.prune_empty_nodes {
            self.tree.prune_from(locator.node);
        }
        Ok(entry.bounds)
    }

    /// Move a tracked entity to `bounds`; returns its previous bounds.
    ///
    /// Callers pass only the new bounds. The old bounds come from the
    /// entity's locator, so a stale or mismatched old box cannot be supplied.
    pub fn relocate(&mut self, key: &K, bounds: AxisAlignedBounds) -> TreeResult<AxisAlignedBounds> {
        let Some(locator) = self.owners.get(key).copied() else {
            log::debug!("Relocate of untracked {:?}", key);
            return Err(TreeError::not_found(key));
        };
        let target = self.tree.locate(&bounds);

        if target == locator.node {
            let old = self.bounds_of(key);
            self.tree.update_bounds(locator.node, locator.slot, bounds);
            self.maybe_split(target);
            return old.ok_or_else(|| TreeError::not_found(key));
        }

        let old = self.detach(locator);
        let slot = self.tree.attach(target, IndexEntry::new(*key, bounds));
        self.owners.insert(*key, Locator { node: target, slot });
        log::trace!("Moved {:?} from {:?} to {:?}", key, locator.node, target);

        // The target is occupied now, so pruning the old branch cannot reach it
        if self.config.prune_empty_nodes {
            self.tree.prune_from(locator.node);
        }
        self.maybe_split(target);
        Ok(old.bounds)
    }

    /// Detach the entity at `locator`, patching the locator of the entity moved into its slot
    fn detach(&mut self, locator: Locator) -> IndexEntry<K> {
        let (entry, moved) = self.tree.detach(locator.node, locator.slot);
        if let Some(moved) = moved {
            if let Some(owner) = self.owners.get_mut(&moved) {
                owner.slot = locator.slot;
            }
        }
        // A shrinking node gets another chance at splitting
        self.tree.node_mut(locator.node).split_retry_at = 0;
        entry
    }

    /// Split `node` if it holds more splittable residents than the threshold allows
    fn maybe_split(&mut self, node: NodeId) {
        let Some(n) = self.tree.node(node) else {
            return;
        };
        let count = n.splittable_count();
        if count <= self.config.splitting_threshold
            || n.depth() >= self.config.max_depth
            || count < n.split_retry_at
        {
            return;
        }
        let Some(region) = self.tree.node_bounds(node) else {
            return;
        };

        let touched = {
            let mut grower = Grower::new(&mut self.tree, self.policy.as_ref(), &self.config, Vec::new());
            grower.grow(node, region, Vec::new());
            grower.into_touched()
        };
        self.reindex(&touched);
    }

    /// Rewrite the locators of every resident of `nodes`
    fn reindex(&mut self, nodes: &[NodeId]) {
        for &id in nodes {
            let Some(node) = self.tree.node(id) else {
                continue;
            };
            for (slot, entry) in node.entities().iter().enumerate() {
                self.owners.insert(entry.key, Locator { node: id, slot });
            }
        }
    }
}
