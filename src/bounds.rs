//! Implementation of bounding volumes

use glam::{Affine3A, Vec3A};

use crate::ray::Ray;

/// An axis aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3A,
    pub max: Vec3A,
}

impl BoundingBox {
    /// Creates a new Axis aligned bounding box
    pub fn new(p0: Vec3A, p1: Vec3A) -> Self {
        Self {
            min: p0.min(p1),
            max: p0.max(p1),
        }
    }

    /// Returns whether or not the ray hits this bounding box, using the ray's precomputed inverse direction.
    ///
    /// Checks for slab intersection in each of the 3 dimensions, using
    /// [f32::min] and [f32::max] to avoid branching.
    /// Based on the branchless bounding box intersection codes from
    /// https://tavianator.com/2022/ray_box_boundary.html
    pub fn hit_with_inv(&self, ray: &Ray, ray_dir_inv: Vec3A, t_min: f32, t_max: f32) -> bool {
        let diff0 = self.min - ray.origin;
        let diff1 = self.max - ray.origin;

        let mut t_near = t_min;
        let mut t_far = t_max;

        // Check for slab intersection in each dimension
        for axis_idx in 0..3 {
            let inverse_dir = ray_dir_inv[axis_idx];
            let t0 = diff0[axis_idx] * inverse_dir;
            let t1 = diff1[axis_idx] * inverse_dir;

            // these set of comparison allow for corner and parallel intersection checks
            t_near = t_near.max(t0).min(t_near.max(t1));
            t_far = t_far.min(t0).max(t_far.min(t1));
        }

        t_near <= t_far
    }

    /// Returns a bounding box enclosing this and the other box.
    ///
    /// In other words, combines the two boxes by taking:
    /// * the minimums of the two boxes' min members
    /// * the maximums of the two boxes' max members
    pub fn union(&self, other: BoundingBox) -> BoundingBox {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grows this box in place so that it also encloses `other`.
    pub fn enlarge(&mut self, other: BoundingBox) {
        *self = self.union(other);
    }

    pub fn add_point(&self, point: Vec3A) -> BoundingBox {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Returns this box grown by `amount` along every axis, in both directions.
    pub fn pad(&self, amount: f32) -> BoundingBox {
        Self {
            min: self.min - Vec3A::splat(amount),
            max: self.max + Vec3A::splat(amount),
        }
    }

    /// Returns the box enclosing all 8 corners of this box after `transform`.
    ///
    /// The result never shrinks the transformed volume, but for rotations it is
    /// looser than the tightest enclosing box.
    pub fn transform(&self, transform: &Affine3A) -> BoundingBox {
        (0..8)
            .map(|corner| {
                Vec3A::new(
                    if corner & 1 == 0 { self.min.x } else { self.max.x },
                    if corner & 2 == 0 { self.min.y } else { self.max.y },
                    if corner & 4 == 0 { self.min.z } else { self.max.z },
                )
            })
            .map(|corner| transform.transform_point3a(corner))
            .fold(BoundingBox::default(), |bbox, corner| bbox.add_point(corner))
    }

    /// An empty box encloses nothing; any union with it returns the other box.
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn diagonal(&self) -> Vec3A {
        self.max - self.min
    }

    pub fn centroid(&self) -> Vec3A {
        0.5 * (self.min + self.max)
    }

    pub fn inside(&self, point: Vec3A) -> bool {
        self.max.cmpge(point).all() && self.min.cmple(point).all()
    }

    /// Whether `other` lies entirely within this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.inside(other.min) && self.inside(other.max)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3A::splat(f32::MAX),
            max: Vec3A::splat(f32::MIN),
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(Vec3A::ZERO, Vec3A::ONE)
    }

    #[test]
    fn default_is_empty() {
        let empty = BoundingBox::default();
        assert!(empty.is_empty());
        assert!(!unit_box().is_empty());
        assert_eq!(empty.union(unit_box()), unit_box());
    }

    #[test]
    fn translate_moves_box() {
        let moved = unit_box().transform(&Affine3A::from_translation(Vec3::new(5.0, 0.0, -1.0)));
        assert!(moved.min.abs_diff_eq(Vec3A::new(5.0, 0.0, -1.0), 1e-6));
        assert!(moved.max.abs_diff_eq(Vec3A::new(6.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn rotation_encloses_all_corners() {
        let rot = Affine3A::from_rotation_z(std::f32::consts::FRAC_PI_4);
        let rotated = unit_box().transform(&rot);
        let half_diag = std::f32::consts::SQRT_2 / 2.0;
        assert!((rotated.min.x + half_diag).abs() < 1e-5);
        assert!((rotated.max.x - half_diag).abs() < 1e-5);
        assert!((rotated.max.y - 2.0 * half_diag).abs() < 1e-5);
        for corner in [Vec3A::ZERO, Vec3A::X, Vec3A::Y, Vec3A::ONE] {
            assert!(rotated.pad(1e-5).inside(rot.transform_point3a(corner)));
        }
    }

    #[test]
    fn pad_grows_every_axis() {
        let padded = unit_box().pad(0.5);
        assert_eq!(padded.min, Vec3A::splat(-0.5));
        assert_eq!(padded.max, Vec3A::splat(1.5));
        assert!(padded.contains(&unit_box()));
        assert!(!unit_box().contains(&padded));
    }

    #[test]
    fn ray_hits_box() {
        let bbox = BoundingBox::new(Vec3A::splat(-1.0), Vec3A::ONE);
        let toward = Ray::new(Vec3A::new(0.0, 0.0, -5.0), Vec3A::Z, 0.0);
        let away = Ray::new(Vec3A::new(0.0, 0.0, -5.0), -Vec3A::Z, 0.0);
        assert!(bbox.hit_with_inv(&toward, toward.direction.recip(), 0.0, 100.0));
        assert!(!bbox.hit_with_inv(&away, away.direction.recip(), 0.0, 100.0));
    }
}
