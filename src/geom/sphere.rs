//! Sphere primitive

use std::f32::consts::{PI, TAU};

use glam::Vec3A;

use super::{Extent, Primitive, SurfaceUv};
use crate::{bounds::BoundingBox, ray::Ray};

/// A sphere given by its center and radius.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub center: Vec3A,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3A, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Latitude/longitude parameterization of a unit direction.
///
/// `u` runs counterclockwise around Z starting at +X, `v` from the +Z pole
/// (0) to the -Z pole (1).
pub fn direction_uv(dir: Vec3A) -> SurfaceUv {
    let mut u = dir.y.atan2(dir.x) / TAU;
    if u < 0.0 {
        u += 1.0;
    }
    let v = dir.z.clamp(-1.0, 1.0).acos() / PI;

    let around = Vec3A::new(-dir.y, dir.x, 0.0);
    let dpdu = if around.length_squared() > 0.0 {
        around.normalize()
    } else {
        // at a pole
        Vec3A::X
    };
    let dpdv = dpdu.cross(dir).normalize_or_zero();

    SurfaceUv { u, v, dpdu, dpdv }
}

impl Primitive for Sphere {
    fn name(&self) -> &'static str {
        "sphere"
    }

    fn bounds(&self) -> Option<Extent> {
        let r = Vec3A::splat(self.radius);
        Some(Extent::Bounded(BoundingBox::new(
            self.center - r,
            self.center + r,
        )))
    }

    fn intersect(&self, ray: &Ray, mind: f32, maxd: f32) -> Option<f32> {
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        // nearest root in range
        [(-half_b - sqrtd) / a, (-half_b + sqrtd) / a]
            .into_iter()
            .find(|&root| root > mind && root < maxd)
    }

    fn normal(&self, pos: Vec3A) -> Option<(Vec3A, Vec3A)> {
        let n = (pos - self.center) / self.radius;
        Some((n, n))
    }

    fn uv(&self, pos: Vec3A, _norm: Vec3A) -> SurfaceUv {
        direction_uv(((pos - self.center) / self.radius).normalize_or_zero())
    }
}
