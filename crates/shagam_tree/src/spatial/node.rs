//! Tree nodes stored in the arena

use crate::foundation::math::Point3;
use super::entity::IndexEntry;
use super::zone::Voxel;

slotmap::new_key_type! {
    /// Generational handle of a node in a tree's arena.
    ///
    /// Handles of destroyed nodes never resolve again, even after the slot is reused.
    pub struct NodeId;
}

/// A single node of the partition tree.
///
/// A node without a cut point is a leaf. Once a cut is assigned the node is
/// interior for the rest of its life: voxel residents move into children and
/// icosep residents stay here.
#[derive(Debug, Clone)]
pub struct TreeNode<K> {
    pub(crate) cut: Option<Point3>,
    pub(crate) parent: Option<(NodeId, Voxel)>,
    pub(crate) depth: u32,
    pub(crate) children: [Option<NodeId>; 8],
    pub(crate) entities: Vec<IndexEntry<K>>,
    /// Residents classifying to a voxel under `cut` (only meaningful with a cut)
    pub(crate) voxel_residents: usize,
    /// Split attempts are skipped until the splittable count reaches this value
    pub(crate) split_retry_at: usize,
}

impl<K> TreeNode<K> {
    pub(crate) fn new(parent: Option<(NodeId, Voxel)>, depth: u32) -> Self {
        Self {
            cut: None,
            parent,
            depth,
            children: [None; 8],
            entities: Vec::new(),
            voxel_residents: 0,
            split_retry_at: 0,
        }
    }

    /// Cut point, if the node has been split
    pub fn cut(&self) -> Option<&Point3> {
        self.cut.as_ref()
    }

    /// Parent node and the voxel this node occupies inside it
    pub fn parent(&self) -> Option<(NodeId, Voxel)> {
        self.parent
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Child occupying a voxel, if created
    pub fn child(&self, voxel: Voxel) -> Option<NodeId> {
        self.children[voxel.index()]
    }

    /// Existing children with their voxels
    pub fn children(&self) -> impl Iterator<Item = (Voxel, NodeId)> + '_ {
        Voxel::ALL
            .into_iter()
            .filter_map(|voxel| self.children[voxel.index()].map(|id| (voxel, id)))
    }

    /// Whether any child exists
    pub fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    /// Entities resident at this node
    pub fn entities(&self) -> &[IndexEntry<K>] {
        &self.entities
    }

    /// Whether the node has no cut point yet
    pub fn is_leaf(&self) -> bool {
        self.cut.is_none()
    }

    /// Residents that a split could push into children
    pub(crate) fn splittable_count(&self) -> usize {
        if self.cut.is_some() {
            self.voxel_residents
        } else {
            self.entities.len()
        }
    }

    pub(crate) fn is_vacant(&self) -> bool {
        self.entities.is_empty() && !self.has_children()
    }
}
