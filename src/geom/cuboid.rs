//! Axis-aligned box primitive

use glam::Vec3A;

use super::{Extent, Primitive};
use crate::{bounds::BoundingBox, ray::Ray};

/// A solid axis-aligned box.
#[derive(Debug, Clone, Copy)]
pub struct Cuboid {
    pub bounds: BoundingBox,
}

impl Cuboid {
    pub fn new(p0: Vec3A, p1: Vec3A) -> Self {
        Self {
            bounds: BoundingBox::new(p0, p1),
        }
    }
}

impl Primitive for Cuboid {
    fn name(&self) -> &'static str {
        "box"
    }

    fn bounds(&self) -> Option<Extent> {
        Some(Extent::Bounded(self.bounds))
    }

    fn intersect(&self, ray: &Ray, mind: f32, maxd: f32) -> Option<f32> {
        let inv = ray.direction.recip();
        let t0 = (self.bounds.min - ray.origin) * inv;
        let t1 = (self.bounds.max - ray.origin) * inv;

        let t_near = t0.min(t1).max_element();
        let t_far = t0.max(t1).min_element();
        if t_near > t_far {
            return None;
        }

        [t_near, t_far]
            .into_iter()
            .find(|&t| t > mind && t < maxd)
    }

    /// The outward normal of the face nearest to `pos`.
    fn normal(&self, pos: Vec3A) -> Option<(Vec3A, Vec3A)> {
        let to_min = (pos - self.bounds.min).abs();
        let to_max = (self.bounds.max - pos).abs();

        let mut best = (f32::MAX, Vec3A::ZERO);
        for axis in 0..3 {
            let mut unit = Vec3A::ZERO;
            unit[axis] = 1.0;
            if to_min[axis] < best.0 {
                best = (to_min[axis], -unit);
            }
            if to_max[axis] < best.0 {
                best = (to_max[axis], unit);
            }
        }
        Some((best.1, best.1))
    }
}
