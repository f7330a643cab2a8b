//! Implementation of a 3-dimensional Ray.

use glam::{Affine3A, Vec3A};

/// A 3-dimensional Ray
///
/// The crucial parts of the Ray are its origin and direction;
/// these two members are the primary way to determine an intersection with a
/// [`GeomNode`](crate::geom::GeomNode). The time selects where animated
/// objects are when the ray meets them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ray {
    pub origin: Vec3A,
    pub direction: Vec3A,
    pub time: f32,
}

impl std::fmt::Display for Ray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "({} -> {})@{}",
            self.origin, self.direction, self.time
        ))
    }
}

impl Ray {
    /// Creates a new Ray.
    pub fn new(origin: Vec3A, direction: Vec3A, time: f32) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    /// Returns a position in 3D space along the ray.
    ///
    /// Performs the following calculation: `position = origin + t * direction`
    pub fn at(&self, t: f32) -> Vec3A {
        self.origin + t * self.direction
    }

    /// Returns the ray carried through `transform`.
    ///
    /// The direction is not renormalized, so distances along the result match
    /// distances along `self`.
    pub fn transform(&self, transform: &Affine3A) -> Self {
        Self {
            origin: transform.transform_point3a(self.origin),
            direction: transform.transform_vector3a(self.direction),
            time: self.time,
        }
    }
}
