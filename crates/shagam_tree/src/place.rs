//! Per-place indexing for a simulation tick
//!
//! A place keeps its static obstacles in a tree built once and its mobile
//! agents in a dynamic tree. Each tick first applies agent movement (the
//! write phase) and then answers perception queries (the read phase), so no
//! query ever observes a half-applied movement.

use crate::config::PlaceConfig;
use crate::foundation::math::Vec3;
use crate::spatial::{
    AxisAlignedBounds, DynamicManipulator, EntityKey, RegionQuery, ShagamTree, SpatialEntity,
    StaticBuilder, TreeResult, TreeStats,
};

/// What an observer sees inside a region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Perception<K> {
    /// Obstacles intersecting the region
    pub obstacles: Vec<K>,
    /// Agents intersecting the region
    pub agents: Vec<K>,
}

impl<K> Perception<K> {
    /// Whether nothing was perceived
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty() && self.agents.is_empty()
    }
}

/// Outcome of a movement phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicsReport<K> {
    /// Agents relocated
    pub moved: Vec<K>,
    /// Keys that were not spawned in this place
    pub missing: Vec<K>,
}

impl<K> Default for DynamicsReport<K> {
    fn default() -> Self {
        Self { moved: Vec::new(), missing: Vec::new() }
    }
}

/// Everything one tick produced
#[derive(Debug, Clone)]
pub struct TickReport<K> {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Movement phase outcome
    pub dynamics: DynamicsReport<K>,
    /// Perception of every observer that is a live agent
    pub perceptions: Vec<(K, Perception<K>)>,
}

/// Obstacle and agent indexes of one place
#[derive(Debug)]
pub struct PlaceIndex<K> {
    config: PlaceConfig,
    obstacles: ShagamTree<K>,
    agents: DynamicManipulator<K>,
    ticks: u64,
}

impl<K: EntityKey> PlaceIndex<K> {
    /// Build the obstacle tree and an empty agent tree
    pub fn new<E: SpatialEntity<Key = K>>(config: PlaceConfig, obstacles: &[E]) -> TreeResult<Self> {
        let builder = StaticBuilder::new(config.obstacles.clone())?;
        let obstacles = builder.build(obstacles, config.universe)?;
        let agents = DynamicManipulator::new(config.universe, config.agents.clone())?;
        log::info!(
            "Place ready: {} obstacles over {}",
            obstacles.len(), config.universe
        );
        Ok(Self { config, obstacles, agents, ticks: 0 })
    }

    /// Place configuration
    pub fn config(&self) -> &PlaceConfig {
        &self.config
    }

    /// Static obstacle tree
    pub fn obstacles(&self) -> &ShagamTree<K> {
        &self.obstacles
    }

    /// Dynamic agent index
    pub fn agents(&self) -> &DynamicManipulator<K> {
        &self.agents
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Add a mobile agent
    pub fn spawn_agent<E: SpatialEntity<Key = K>>(&mut self, agent: &E) -> TreeResult<()> {
        self.agents.insert(agent).map(|_| ())
    }

    /// Remove a mobile agent; returns its last bounds
    pub fn despawn_agent(&mut self, key: &K) -> TreeResult<AxisAlignedBounds> {
        self.agents.remove(key)
    }

    /// Write phase: relocate agents.
    ///
    /// Keys that are not live agents are reported as missing rather than
    /// failing the whole phase.
    pub fn apply_dynamics<I>(&mut self, moves: I) -> TreeResult<DynamicsReport<K>>
    where
        I: IntoIterator<Item = (K, AxisAlignedBounds)>,
    {
        let mut report = DynamicsReport::default();
        for (key, bounds) in moves {
            match self.agents.relocate(&key, bounds) {
                Ok(_) => report.moved.push(key),
                Err(e) if e.is_not_found() => report.missing.push(key),
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Read phase: what lies inside `region`
    pub fn perceive(&self, region: &AxisAlignedBounds) -> Perception<K> {
        Perception {
            obstacles: self.obstacles.query_region(region),
            agents: self.agents.query_region(region),
        }
    }

    /// Run one tick: apply `moves`, then let every observer perceive around
    /// itself within `reach`. Observers never perceive themselves.
    pub fn tick<I>(&mut self, moves: I, observers: &[K], reach: f64) -> TreeResult<TickReport<K>>
    where
        I: IntoIterator<Item = (K, AxisAlignedBounds)>,
    {
        self.ticks += 1;
        let dynamics = self.apply_dynamics(moves)?;

        let mut perceptions = Vec::with_capacity(observers.len());
        for observer in observers {
            let Some(bounds) = self.agents.bounds_of(observer) else {
                continue;
            };
            let region = AxisAlignedBounds::from_center_extents(
                bounds.center(),
                bounds.extents() + Vec3::repeat(reach),
            )?;
            let mut perception = self.perceive(&region);
            perception.agents.retain(|key| key != observer);
            perceptions.push((*observer, perception));
        }

        log::debug!(
            "Tick {}: {} moved, {} missing, {} observers",
            self.ticks,
            dynamics.moved.len(),
            dynamics.missing.len(),
            perceptions.len()
        );
        Ok(TickReport { tick: self.ticks, dynamics, perceptions })
    }

    /// Statistics of the obstacle and agent trees
    pub fn stats(&self) -> (TreeStats, TreeStats) {
        (self.obstacles.stats(), self.agents.tree().stats())
    }
}

impl<K: EntityKey> RegionQuery<K> for PlaceIndex<K> {
    /// Obstacle keys followed by agent keys
    fn query_region(&self, region: &AxisAlignedBounds) -> Vec<K> {
        let Perception { mut obstacles, agents } = self.perceive(region);
        obstacles.extend(agents);
        obstacles
    }

    fn entity_count(&self) -> usize {
        self.obstacles.len() + self.agents.len()
    }
}
