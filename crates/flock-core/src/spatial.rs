//! Sparse point octree used for neighbor lookups.
//!
//! The tree is disposable: the world builds a fresh one every tick from the
//! current agent positions, so there is no removal or rebalancing.

use crate::constants::MAX_OCTREE_DEPTH;
use glam::Vec3;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    #[error("point {point} lies outside the index bounds")]
    OutOfBounds { point: Vec3 },
    #[error("invalid index configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Axis-aligned box, inclusive on every face.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bounds {
    min: Vec3,
    max: Vec3,
}

impl Bounds {
    fn around(origin: Vec3, half_extent: f32) -> Self {
        Self {
            min: origin - Vec3::splat(half_extent),
            max: origin + Vec3::splat(half_extent),
        }
    }

    fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Squared distance from `p` to the closest point of the box (0 inside).
    fn distance_sq_to(&self, p: Vec3) -> f32 {
        let closest = p.clamp(self.min, self.max);
        p.distance_squared(closest)
    }

    /// Octant index of `p` relative to the box center: x is bit 0, y bit 1, z bit 2.
    fn octant_of(&self, p: Vec3) -> usize {
        let c = self.center();
        (p.x >= c.x) as usize | ((p.y >= c.y) as usize) << 1 | ((p.z >= c.z) as usize) << 2
    }

    fn octant(&self, index: usize) -> Bounds {
        let c = self.center();
        let pick = |bit: usize, lo: f32, mid: f32, hi: f32| {
            if index & bit == 0 {
                (lo, mid)
            } else {
                (mid, hi)
            }
        };
        let (x0, x1) = pick(1, self.min.x, c.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, c.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, c.z, self.max.z);
        Bounds {
            min: Vec3::new(x0, y0, z0),
            max: Vec3::new(x1, y1, z1),
        }
    }
}

/// Point octree mapping positions to caller-supplied payloads.
#[derive(Debug)]
pub struct Octree<T> {
    root: Node<T>,
    max_points_per_node: usize,
    len: usize,
}

#[derive(Debug)]
struct Node<T> {
    bounds: Bounds,
    /// Only populated while the node is a leaf.
    points: Vec<(Vec3, T)>,
    children: Option<Box<[Node<T>; 8]>>,
}

impl<T> Octree<T> {
    /// Allocate an empty index over `[origin - half_extent, origin + half_extent]`.
    pub fn build(
        origin: Vec3,
        half_extent: f32,
        max_points_per_node: usize,
    ) -> Result<Self, SpatialError> {
        if !origin.is_finite() {
            return Err(SpatialError::InvalidConfig("origin must be finite"));
        }
        if !half_extent.is_finite() || half_extent <= 0.0 {
            return Err(SpatialError::InvalidConfig(
                "half_extent must be positive and finite",
            ));
        }
        if max_points_per_node == 0 {
            return Err(SpatialError::InvalidConfig(
                "max_points_per_node must be at least 1",
            ));
        }
        Ok(Self {
            root: Node::leaf(Bounds::around(origin, half_extent)),
            max_points_per_node,
            len: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a point. Points outside the root box are rejected and the tree
    /// is left unchanged.
    pub fn insert(&mut self, position: Vec3, payload: T) -> Result<(), SpatialError> {
        if !self.root.bounds.contains(position) {
            return Err(SpatialError::OutOfBounds { point: position });
        }
        self.root
            .insert(position, payload, self.max_points_per_node, 0);
        self.len += 1;
        Ok(())
    }

    /// Visit every point whose distance to `center` is `<= radius`.
    ///
    /// Visit order is depth-first with octants in index order and insertion
    /// order inside a leaf. A center outside the root box is fine; it simply
    /// finds whatever lies within reach.
    pub fn for_each_within<'a>(
        &'a self,
        center: Vec3,
        radius: f32,
        mut visitor: impl FnMut(Vec3, &'a T),
    ) {
        if radius.is_nan() || radius < 0.0 {
            return;
        }
        self.root
            .visit_within(center, radius * radius, &mut visitor);
    }

    /// Collect every point within `radius` of `center` with its payload.
    pub fn query(&self, center: Vec3, radius: f32) -> Vec<(Vec3, &T)> {
        let mut out = Vec::new();
        self.for_each_within(center, radius, |position, payload| out.push((position, payload)));
        out
    }
}

impl<T> Node<T> {
    fn leaf(bounds: Bounds) -> Self {
        Self {
            bounds,
            points: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, position: Vec3, payload: T, capacity: usize, depth: usize) {
        match self.children.as_mut() {
            Some(children) => {
                let octant = self.bounds.octant_of(position);
                children[octant].insert(position, payload, capacity, depth + 1);
            }
            None => {
                self.points.push((position, payload));
                if self.points.len() > capacity && depth < MAX_OCTREE_DEPTH {
                    self.subdivide(capacity, depth);
                }
            }
        }
    }

    fn subdivide(&mut self, capacity: usize, depth: usize) {
        let bounds = self.bounds;
        let mut children: Box<[Node<T>; 8]> =
            Box::new(std::array::from_fn(|i| Node::leaf(bounds.octant(i))));
        for (position, payload) in self.points.drain(..) {
            let octant = bounds.octant_of(position);
            children[octant].insert(position, payload, capacity, depth + 1);
        }
        self.children = Some(children);
    }

    fn visit_within<'a, F>(&'a self, center: Vec3, radius_sq: f32, visitor: &mut F)
    where
        F: FnMut(Vec3, &'a T),
    {
        if self.bounds.distance_sq_to(center) > radius_sq {
            return;
        }
        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.visit_within(center, radius_sq, visitor);
                }
            }
            None => {
                for (position, payload) in &self.points {
                    if position.distance_squared(center) <= radius_sq {
                        visitor(*position, payload);
                    }
                }
            }
        }
    }
}
