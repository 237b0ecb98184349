//! # Barnes–Hut octree
//!
//! Approximates the all-pairs gravity sum in `O(N log N)` by replacing a
//! distant group of bodies with a single pseudo-body at the group's center
//! of mass.
//!
//! - Space is recursively split into 8 octants.
//! - Each node stores the total mass and center of mass of its subtree,
//!   plus its cubic bounding box.
//! - A leaf holds the bodies that landed in it: normally one, several only
//!   when subdivision hit [`MAX_DEPTH`] (coincident or nearly coincident
//!   bodies).
//!
//! Only active bodies (not destroyed, not being created) are inserted.

use crate::simulation::params::{MIN_SEPARATION, UNIT_SCALE};
use crate::simulation::states::{Body, NVec3};

/// Subdivision stops here; deeper bodies share a leaf
pub const MAX_DEPTH: usize = 32;

/// One cubic cell of the octree
pub struct OctreeNode {
    pub mass: f64,
    pub com: NVec3,
    pub bbox_min: NVec3,
    pub bbox_max: NVec3,
    pub children: [Option<usize>; 8], // indices into Octree::nodes
    pub bodies: Vec<usize>,            // indices into the body slice, leaves only
}

impl OctreeNode {
    fn empty(bbox_min: NVec3, bbox_max: NVec3) -> Self {
        Self {
            mass: 0.0,
            com: NVec3::zeros(),
            bbox_min,
            bbox_max,
            children: [None; 8],
            bodies: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }
}

/// Octree over the active bodies of one tick
pub struct Octree {
    pub nodes: Vec<OctreeNode>,
    pub root: usize,
}

impl Octree {
    /// Build the tree, or `None` when no body is active
    pub fn build(bodies: &[Body]) -> Option<Self> {
        let (bbox_min, bbox_max) = compute_global_bbox(bodies)?;

        let mut tree = Octree {
            nodes: vec![OctreeNode::empty(bbox_min, bbox_max)],
            root: 0,
        };

        for (i, b) in bodies.iter().enumerate() {
            if b.is_active() {
                tree.insert_body(tree.root, i, bodies, 0);
            }
        }

        tree.compute_mass_and_com(bodies, tree.root);
        Some(tree)
    }

    /// Approximate acceleration on `bodies[i]` from every other active body
    pub fn acceleration_on(&self, i: usize, bodies: &[Body], g: f64, theta: f64) -> NVec3 {
        let pos_i = bodies[i].position;
        let mut acc = NVec3::zeros();
        self.traverse_node(self.root, i, pos_i, bodies, g, theta, &mut acc);
        acc
    }

    // helpers ==============================================================================

    /// Walk down from `node_idx` and store `body_idx` in the right leaf.
    ///
    /// An empty leaf takes the body. An occupied leaf above `MAX_DEPTH` is
    /// split and its occupant pushed one level down before the new body
    /// follows. Internal nodes forward to the child octant containing the
    /// body, creating it on demand.
    fn insert_body(&mut self, node_idx: usize, body_idx: usize, bodies: &[Body], depth: usize) {
        let bbox_min = self.nodes[node_idx].bbox_min;
        let bbox_max = self.nodes[node_idx].bbox_max;

        if self.nodes[node_idx].is_leaf() {
            if self.nodes[node_idx].bodies.is_empty() || depth >= MAX_DEPTH {
                self.nodes[node_idx].bodies.push(body_idx);
                return;
            }

            // occupied leaf: turn it into an internal node
            let existing = std::mem::take(&mut self.nodes[node_idx].bodies);
            for existing_idx in existing {
                self.insert_into_child(node_idx, existing_idx, bodies, depth, bbox_min, bbox_max);
            }
        }

        self.insert_into_child(node_idx, body_idx, bodies, depth, bbox_min, bbox_max);
    }

    fn insert_into_child(&mut self, node_idx: usize, body_idx: usize, bodies: &[Body], depth: usize, bbox_min: NVec3, bbox_max: NVec3) {
        let pos = bodies[body_idx].position;
        let octant = child_index_for_point(&pos, &bbox_min, &bbox_max);

        let child_idx = match self.nodes[node_idx].children[octant] {
            Some(idx) => idx,
            None => {
                let (cmin, cmax) = child_bbox(&bbox_min, &bbox_max, octant);
                let new_idx = self.nodes.len();
                self.nodes.push(OctreeNode::empty(cmin, cmax));
                self.nodes[node_idx].children[octant] = Some(new_idx);
                new_idx
            }
        };

        self.insert_body(child_idx, body_idx, bodies, depth + 1);
    }

    /// Post-order pass filling `mass` and `com` for every node
    fn compute_mass_and_com(&mut self, bodies: &[Body], node_idx: usize) {
        let mut mass = 0.0;
        let mut com = NVec3::zeros();

        let children = self.nodes[node_idx].children;

        for &bidx in &self.nodes[node_idx].bodies {
            let b = &bodies[bidx];
            mass += b.mass();
            com += b.position * b.mass();
        }

        for child_idx in children.iter().flatten().copied() {
            self.compute_mass_and_com(bodies, child_idx);
            let cn = &self.nodes[child_idx];
            if cn.mass > 0.0 {
                mass += cn.mass;
                com += cn.com * cn.mass;
            }
        }

        if mass > 0.0 {
            com /= mass;
        }

        let node = &mut self.nodes[node_idx];
        node.mass = mass;
        node.com = com;
    }

    /// Accumulate the pull of the subtree at `node_idx` on the body at `pos_i`.
    ///
    /// Leaves are evaluated body by body (skipping the target itself).
    /// Internal nodes are collapsed to their center of mass when
    /// `size / distance < theta`, otherwise their children are visited.
    #[allow(clippy::too_many_arguments)]
    fn traverse_node(&self, node_idx: usize, body_idx: usize, pos_i: NVec3, bodies: &[Body], g: f64, theta: f64, acc: &mut NVec3) {
        let node = &self.nodes[node_idx];

        if node.mass == 0.0 {
            return;
        }

        if node.is_leaf() {
            for &bidx in &node.bodies {
                if bidx == body_idx {
                    continue;
                }
                let b = &bodies[bidx];
                *acc += point_mass_acceleration(b.position - pos_i, b.mass(), g);
            }
            return;
        }

        let size_vec = node.bbox_max - node.bbox_min;
        let size = size_vec.x.max(size_vec.y).max(size_vec.z);

        let r = node.com - pos_i;
        let dist = r.norm();

        if dist > 0.0 && size / dist < theta {
            *acc += point_mass_acceleration(r, node.mass, g);
        } else {
            for child_idx in node.children.iter().flatten().copied() {
                self.traverse_node(child_idx, body_idx, pos_i, bodies, g, theta, acc);
            }
        }
    }
}

// helpers ===========================================================================

/// Acceleration towards a point mass `mass` sitting at offset `r` (display units)
fn point_mass_acceleration(r: NVec3, mass: f64, g: f64) -> NVec3 {
    let dist = r.norm();
    if dist < MIN_SEPARATION {
        return NVec3::zeros();
    }
    let r_m = dist * UNIT_SCALE;
    (g * mass / (r_m * r_m)) * (r / dist)
}

/// Cubic bounding box around every active body, `None` if there are none
fn compute_global_bbox(bodies: &[Body]) -> Option<(NVec3, NVec3)> {
    let mut active = bodies.iter().filter(|b| b.is_active()).peekable();
    active.peek()?;

    let mut min = NVec3::repeat(f64::INFINITY);
    let mut max = NVec3::repeat(f64::NEG_INFINITY);
    for b in active {
        min = min.inf(&b.position);
        max = max.sup(&b.position);
    }

    // expand to a cube so node size is well-defined
    let center = (min + max) * 0.5;
    let half = ((max - min) * 0.5).max();
    let half = NVec3::repeat(half.max(MIN_SEPARATION));

    Some((center - half, center + half))
}

/// Octant of `p` inside a box, bit 0 = +x half, bit 1 = +y half, bit 2 = +z half
fn child_index_for_point(p: &NVec3, bbox_min: &NVec3, bbox_max: &NVec3) -> usize {
    let center = (bbox_min + bbox_max) * 0.5;
    let mut idx = 0;

    if p.x >= center.x { idx |= 1; }
    if p.y >= center.y { idx |= 2; }
    if p.z >= center.z { idx |= 4; }

    idx
}

/// Bounding box of octant `child_idx`, same bit layout as `child_index_for_point`
fn child_bbox(parent_min: &NVec3, parent_max: &NVec3, child_idx: usize) -> (NVec3, NVec3) {
    let center = (parent_min + parent_max) * 0.5;

    let mut min = *parent_min;
    let mut max = *parent_max;

    for axis in 0..3 {
        if child_idx & (1 << axis) == 0 {
            max[axis] = center[axis];
        } else {
            min[axis] = center[axis];
        }
    }

    (min, max)
}
