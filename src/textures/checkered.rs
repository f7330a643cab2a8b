//! A texture alternating between two colours in a 3D checkerboard fashion.

use glam::Vec3A;

use super::{TextureInput, TextureMethod};
use crate::{color::Color, surface::Surface, utils::EPSILON};

/// Unit cubes of texture space alternate between `even` and `odd` diffuse
/// colours.
#[derive(Debug, Clone, Copy)]
pub struct Checkered {
    pub even: Color,
    pub odd: Color,
}

impl Checkered {
    /// Creates a new checkered texture
    pub fn new(even: Color, odd: Color) -> Self {
        Self { even, odd }
    }

    /// Whether `point` lies in an odd cell.
    pub fn is_odd(point: Vec3A) -> bool {
        // nudged so that faces lying on cell boundaries pick a consistent side
        let cell = (point + Vec3A::splat(EPSILON)).floor();
        (cell.x + cell.y + cell.z).rem_euclid(2.0) >= 1.0
    }
}

impl TextureMethod for Checkered {
    fn apply(&self, input: &TextureInput<'_>, _norm: &mut Vec3A, surf: &mut Surface) {
        surf.diffuse = if Self::is_odd(input.pos) {
            self.odd
        } else {
            self.even
        };
    }
}
