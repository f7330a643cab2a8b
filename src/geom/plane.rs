//! Infinite plane primitive

use glam::Vec3A;

use super::{Extent, Primitive};
use crate::{ray::Ray, utils::EPSILON};

/// The plane through `pos` facing `norm`.
///
/// Planes cannot be bounded and have no parameterization of their own.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub pos: Vec3A,
    pub norm: Vec3A,
}

impl Plane {
    pub fn new(pos: Vec3A, norm: Vec3A) -> Self {
        Self {
            pos,
            norm: norm.normalize(),
        }
    }
}

impl Primitive for Plane {
    fn name(&self) -> &'static str {
        "plane"
    }

    fn bounds(&self) -> Option<Extent> {
        Some(Extent::Unbounded)
    }

    fn intersect(&self, ray: &Ray, mind: f32, maxd: f32) -> Option<f32> {
        let denom = self.norm.dot(ray.direction);
        if denom.abs() < EPSILON {
            return None;
        }
        let dist = self.norm.dot(self.pos - ray.origin) / denom;
        (dist > mind && dist < maxd).then_some(dist)
    }

    fn normal(&self, _pos: Vec3A) -> Option<(Vec3A, Vec3A)> {
        Some((self.norm, self.norm))
    }
}
