// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Arena-backed Barnes-Hut octree
//!
//! # Node lifecycle
//!
//! A node starts empty. The first body inserted makes it a leaf. When a
//! second body arrives the node becomes internal exactly once: the resident
//! body and the newcomer are both pushed down into child octants, which are
//! allocated lazily (at most 8, one per occupied octant). Further bodies go
//! straight to the matching child.
//!
//! Subdivision is by volume, so bodies that share a position would recurse
//! forever. Below [`MAX_DEPTH`] a leaf that receives another body turns
//! into a bucket that simply lists its members.
//!
//! # Aggregation and queries
//!
//! [`Octree::aggregate`] runs a post-order pass that fills in each node's
//! total mass and center of mass. Queries treat an internal node as a
//! single point mass when `width / distance < theta`, and otherwise recurse
//! into its children. `theta = 0` never accepts an aggregate and reproduces
//! direct summation.

use crate::body::{Body, GravityLaw};
use crate::math::Vector3;
use super::Bounds;

/// Depth at which colocated bodies stop subdividing and share a bucket
pub const MAX_DEPTH: usize = 64;

/// Index of a node inside the octree arena
///
/// Uses `u32` to keep the 8-child array of internal nodes compact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for an unallocated child slot
    pub const NONE: NodeId = NodeId(u32::MAX);

    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "NodeId overflow");
        NodeId(index as u32)
    }

    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the unallocated sentinel
    pub fn is_none(self) -> bool {
        self == NodeId::NONE
    }
}

/// What a node currently holds
///
/// Leaves and buckets store body indices; the tree borrows body data from
/// the slice passed to each call and never owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// No body
    Empty,
    /// Exactly one body
    Leaf(usize),
    /// Subdivided; unallocated children are [`NodeId::NONE`]
    Internal([NodeId; 8]),
    /// Several bodies that could not be separated within [`MAX_DEPTH`]
    Bucket(Vec<usize>),
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Bounds,
    depth: usize,
    occupancy: usize,
    kind: NodeKind,
    mass: f64,
    center_of_mass: Vector3,
}

impl Node {
    fn new(bounds: Bounds, depth: usize) -> Self {
        Node {
            bounds,
            depth,
            occupancy: 0,
            kind: NodeKind::Empty,
            mass: 0.0,
            center_of_mass: Vector3::zero(),
        }
    }
}

/// Barnes-Hut octree over a borrowed body slice
///
/// # Example
///
/// ```
/// use nbody_engine::body::{Body, GravityLaw};
/// use nbody_engine::math::Vector3;
/// use nbody_engine::tree::Octree;
///
/// let bodies = vec![
///     Body::at_rest(1.0e24, Vector3::new(0.0, 0.0, 0.0)),
///     Body::at_rest(2.0e24, Vector3::new(1.0e9, 0.0, 0.0)),
///     Body::at_rest(3.0e24, Vector3::new(0.0, 1.0e9, 0.0)),
/// ];
///
/// let mut tree = Octree::new();
/// tree.build(&bodies);
/// assert_eq!(tree.total_mass(), 6.0e24);
///
/// let acc = tree.acceleration(0, &bodies, 0.5, &GravityLaw::default());
/// assert!(acc.x > 0.0 && acc.y > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Octree {
    nodes: Vec<Node>,
    aggregated: bool,
}

impl Octree {
    /// Create an empty tree
    pub fn new() -> Self {
        Octree {
            nodes: Vec::new(),
            aggregated: false,
        }
    }

    /// Create an empty tree with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Octree {
            nodes: Vec::with_capacity(capacity),
            aggregated: false,
        }
    }

    /// Discard all nodes and start over with an empty root covering `bounds`
    ///
    /// The arena keeps its allocation.
    pub fn reset(&mut self, bounds: Bounds) {
        self.nodes.clear();
        self.nodes.push(Node::new(bounds, 0));
        self.aggregated = false;
    }

    /// Rebuild the tree from the complete body set and aggregate it
    pub fn build(&mut self, bodies: &[Body]) {
        match Bounds::enclosing(bodies) {
            Some(bounds) => self.reset(bounds),
            None => {
                self.nodes.clear();
                self.aggregated = true;
                return;
            }
        }
        for index in 0..bodies.len() {
            self.insert(index, bodies);
        }
        self.aggregate(bodies);
    }

    /// Insert `bodies[index]` below the root
    ///
    /// Invalidates any previous aggregation.
    ///
    /// # Panics
    ///
    /// Panics if the tree has no root (call [`Octree::reset`] first).
    pub fn insert(&mut self, index: usize, bodies: &[Body]) {
        assert!(!self.nodes.is_empty(), "Octree must be reset before insertion");
        self.aggregated = false;
        self.insert_at(NodeId::new(0), index, bodies);
    }

    fn insert_at(&mut self, id: NodeId, index: usize, bodies: &[Body]) {
        let node = &mut self.nodes[id.index()];
        node.occupancy += 1;
        let depth = node.depth;

        match std::mem::replace(&mut node.kind, NodeKind::Empty) {
            NodeKind::Empty => node.kind = NodeKind::Leaf(index),
            NodeKind::Bucket(mut members) => {
                members.push(index);
                node.kind = NodeKind::Bucket(members);
            }
            NodeKind::Internal(children) => {
                node.kind = NodeKind::Internal(children);
                self.insert_into_child(id, index, bodies);
            }
            NodeKind::Leaf(resident) if depth >= MAX_DEPTH => {
                node.kind = NodeKind::Bucket(vec![resident, index]);
            }
            NodeKind::Leaf(resident) => {
                node.kind = NodeKind::Internal([NodeId::NONE; 8]);
                self.insert_into_child(id, resident, bodies);
                self.insert_into_child(id, index, bodies);
            }
        }
    }

    fn insert_into_child(&mut self, parent: NodeId, index: usize, bodies: &[Body]) {
        let (octant, child, child_bounds, child_depth) = {
            let node = &self.nodes[parent.index()];
            let NodeKind::Internal(children) = &node.kind else {
                return;
            };
            let octant = node.bounds.octant(&bodies[index].position);
            (octant, children[octant], node.bounds.subdivide(octant), node.depth + 1)
        };

        let child = if child.is_none() {
            let id = NodeId::new(self.nodes.len());
            self.nodes.push(Node::new(child_bounds, child_depth));
            if let NodeKind::Internal(children) = &mut self.nodes[parent.index()].kind {
                children[octant] = id;
            }
            id
        } else {
            child
        };

        self.insert_at(child, index, bodies);
    }

    /// Compute total mass and center of mass for every node
    ///
    /// Must run after the last insertion and before any query.
    pub fn aggregate(&mut self, bodies: &[Body]) {
        if !self.nodes.is_empty() {
            self.aggregate_node(NodeId::new(0), bodies);
        }
        self.aggregated = true;
    }

    fn aggregate_node(&mut self, id: NodeId, bodies: &[Body]) -> (f64, Vector3) {
        let (mass, center_of_mass) = match &self.nodes[id.index()].kind {
            NodeKind::Empty => (0.0, Vector3::zero()),
            NodeKind::Leaf(index) => (bodies[*index].mass, bodies[*index].position),
            NodeKind::Bucket(members) => {
                let (mass, weighted) = members.iter().fold((0.0, Vector3::zero()), |(m, w), &i| {
                    (m + bodies[i].mass, w + bodies[i].position * bodies[i].mass)
                });
                (mass, self.weighted_center(id, mass, weighted))
            }
            NodeKind::Internal(children) => {
                let children = *children;
                let mut mass = 0.0;
                let mut weighted = Vector3::zero();
                for child in children.into_iter().filter(|c| !c.is_none()) {
                    let (m, com) = self.aggregate_node(child, bodies);
                    mass += m;
                    weighted += com * m;
                }
                (mass, self.weighted_center(id, mass, weighted))
            }
        };

        let node = &mut self.nodes[id.index()];
        node.mass = mass;
        node.center_of_mass = center_of_mass;
        (mass, center_of_mass)
    }

    fn weighted_center(&self, id: NodeId, mass: f64, weighted: Vector3) -> Vector3 {
        if mass > 0.0 {
            weighted / mass
        } else {
            self.nodes[id.index()].bounds.center()
        }
    }

    /// Acceleration on `bodies[index]` from every other body in the tree
    pub fn acceleration(&self, index: usize, bodies: &[Body], theta: f64, law: &GravityLaw) -> Vector3 {
        self.acceleration_at(bodies[index].position, Some(index), bodies, theta, law)
    }

    /// Acceleration at an arbitrary point, optionally skipping one body
    pub fn acceleration_at(
        &self,
        position: Vector3,
        exclude: Option<usize>,
        bodies: &[Body],
        theta: f64,
        law: &GravityLaw,
    ) -> Vector3 {
        debug_assert!(self.aggregated, "Octree queried before aggregation");
        if self.nodes.is_empty() {
            return Vector3::zero();
        }
        self.accumulate(NodeId::new(0), position, exclude, bodies, theta, law)
    }

    fn accumulate(
        &self,
        id: NodeId,
        position: Vector3,
        exclude: Option<usize>,
        bodies: &[Body],
        theta: f64,
        law: &GravityLaw,
    ) -> Vector3 {
        let node = &self.nodes[id.index()];
        match &node.kind {
            NodeKind::Empty => Vector3::zero(),
            NodeKind::Leaf(index) => {
                if exclude == Some(*index) {
                    Vector3::zero()
                } else {
                    let source = &bodies[*index];
                    law.acceleration_towards(position, source.position, source.mass)
                }
            }
            NodeKind::Bucket(members) => members
                .iter()
                .filter(|&&i| exclude != Some(i))
                .map(|&i| law.acceleration_towards(position, bodies[i].position, bodies[i].mass))
                .sum(),
            NodeKind::Internal(children) => {
                let distance = (position - node.center_of_mass).norm();
                if node.bounds.width() / distance < theta {
                    law.acceleration_towards(position, node.center_of_mass, node.mass)
                } else {
                    children
                        .iter()
                        .filter(|c| !c.is_none())
                        .map(|c| self.accumulate(*c, position, exclude, bodies, theta, law))
                        .sum()
                }
            }
        }
    }

    /// Root handle, if the tree has been reset or built
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId::new(0))
        }
    }

    /// Contents of a node
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// Number of bodies inserted below a node
    pub fn occupancy(&self, id: NodeId) -> usize {
        self.nodes[id.index()].occupancy
    }

    /// Aggregated mass of a node (zero before aggregation)
    pub fn node_mass(&self, id: NodeId) -> f64 {
        self.nodes[id.index()].mass
    }

    /// Region covered by a node
    pub fn node_bounds(&self, id: NodeId) -> Bounds {
        self.nodes[id.index()].bounds
    }

    /// Total aggregated mass
    pub fn total_mass(&self) -> f64 {
        self.nodes.first().map_or(0.0, |root| root.mass)
    }

    /// Aggregated center of mass of the whole tree
    pub fn center_of_mass(&self) -> Vector3 {
        self.nodes.first().map_or(Vector3::zero(), |root| root.center_of_mass)
    }

    /// Number of allocated nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node level (root is 0)
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Whether aggregates reflect the current contents
    pub fn is_aggregated(&self) -> bool {
        self.aggregated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn law() -> GravityLaw {
        GravityLaw::new(1.0, 1e-9)
    }

    fn three_bodies() -> Vec<Body> {
        vec![
            Body::at_rest(1.0, Vector3::new(-1.0, -1.0, -1.0)),
            Body::at_rest(2.0, Vector3::new(1.0, 1.0, 1.0)),
            Body::at_rest(3.0, Vector3::new(0.9, 0.8, 0.7)),
        ]
    }

    fn direct(index: usize, bodies: &[Body], law: &GravityLaw) -> Vector3 {
        bodies
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(_, b)| law.acceleration(&bodies[index], b))
            .sum()
    }

    #[test]
    fn test_leaf_becomes_internal_on_second_insert() {
        let bodies = three_bodies();
        let mut tree = Octree::new();
        tree.reset(Bounds::enclosing(&bodies).unwrap());

        tree.insert(0, &bodies);
        let root = tree.root().unwrap();
        assert_eq!(tree.kind(root), &NodeKind::Leaf(0));

        tree.insert(1, &bodies);
        assert!(matches!(tree.kind(root), NodeKind::Internal(_)));
        assert_eq!(tree.occupancy(root), 2);
        // root plus one child per occupied octant
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_aggregate_mass_and_center() {
        let bodies = three_bodies();
        let mut tree = Octree::new();
        tree.build(&bodies);

        assert!(tree.is_aggregated());
        assert_eq!(tree.total_mass(), 6.0);
        assert_eq!(tree.node_mass(tree.root().unwrap()), 6.0);
        let expected = bodies
            .iter()
            .map(|b| b.position * b.mass)
            .sum::<Vector3>()
            / 6.0;
        assert!((tree.center_of_mass() - expected).norm() < 1e-12);
    }

    #[test]
    fn test_colocated_bodies_share_a_bucket() {
        let p = Vector3::new(0.25, 0.25, 0.25);
        let bodies = vec![
            Body::at_rest(1.0, Vector3::zero()),
            Body::at_rest(2.0, p),
            Body::at_rest(3.0, p),
            Body::at_rest(4.0, p),
        ];
        let mut tree = Octree::new();
        tree.build(&bodies);

        assert_eq!(tree.total_mass(), 10.0);
        assert_eq!(tree.occupancy(tree.root().unwrap()), 4);
        assert!(tree.depth() <= MAX_DEPTH);

        // descend to the bucket holding the trio
        let mut id = tree.root().unwrap();
        while let NodeKind::Internal(children) = tree.kind(id) {
            id = children[tree.node_bounds(id).octant(&p)];
        }
        assert!(tree.node_bounds(id).contains(p));
        assert!(matches!(tree.kind(id), NodeKind::Bucket(members) if members.len() == 3));
        assert_eq!(tree.node_mass(id), 9.0);

        // a second aggregation leaves the bucket untouched
        tree.aggregate(&bodies);
        assert!(matches!(tree.kind(id), NodeKind::Bucket(members) if members.len() == 3));
        assert_eq!(tree.node_mass(id), 9.0);
        assert_eq!(tree.total_mass(), 10.0);

        // the colocated trio only pulls on the body at the origin
        let acc = tree.acceleration(0, &bodies, 0.0, &law());
        assert!((acc - direct(0, &bodies, &law())).norm() < 1e-12 * acc.norm());
    }

    #[test]
    fn test_theta_zero_matches_direct_summation() {
        let bodies = three_bodies();
        let mut tree = Octree::new();
        tree.build(&bodies);
        for i in 0..bodies.len() {
            let tree_acc = tree.acceleration(i, &bodies, 0.0, &law());
            let direct_acc = direct(i, &bodies, &law());
            assert!((tree_acc - direct_acc).norm() <= 1e-12 * direct_acc.norm());
        }
    }

    #[test]
    fn test_huge_theta_uses_root_aggregate() {
        let bodies = three_bodies();
        let mut tree = Octree::new();
        tree.build(&bodies);

        let acc = tree.acceleration(0, &bodies, 1e300, &law());
        let expected =
            law().acceleration_towards(bodies[0].position, tree.center_of_mass(), tree.total_mass());
        assert_eq!(acc, expected);
        assert_ne!(acc, direct(0, &bodies, &law()));
    }

    #[test]
    fn test_single_body_feels_nothing() {
        let bodies = vec![Body::at_rest(5.0, Vector3::new(3.0, 2.0, 1.0))];
        let mut tree = Octree::new();
        tree.build(&bodies);
        assert_eq!(tree.acceleration(0, &bodies, 0.5, &law()), Vector3::zero());
    }

    #[test]
    fn test_rebuild_reuses_arena() {
        let bodies = three_bodies();
        let mut tree = Octree::with_capacity(16);
        tree.build(&bodies);
        let first = tree.node_count();
        tree.build(&bodies);
        assert_eq!(tree.node_count(), first);
        assert_eq!(tree.total_mass(), 6.0);
    }

    #[test]
    fn test_empty_build() {
        let mut tree = Octree::new();
        tree.build(&[]);
        assert!(tree.root().is_none());
        assert_eq!(tree.total_mass(), 0.0);
    }
}
