//! Noise-driven bump mapping

use glam::Vec3A;
use noise::{NoiseFn, Perlin};

use super::{TextureInput, TextureMethod};
use crate::surface::Surface;

/// Step used for the finite-difference gradient.
const DELTA: f32 = 1e-3;

/// Perturbs the shading normal along the gradient of a noise field.
#[derive(Debug, Clone)]
pub struct Bump {
    perlin: Perlin,
    /// Strength of the perturbation.
    pub size: f32,
}

impl Bump {
    pub fn new(seed: u32, size: f32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            size,
        }
    }

    fn noise(&self, point: Vec3A) -> f32 {
        self.perlin.get(point.as_dvec3().to_array()) as f32
    }

    /// Central-difference gradient of the noise field.
    pub fn gradient(&self, point: Vec3A) -> Vec3A {
        let axis = |unit: Vec3A| {
            (self.noise(point + unit * DELTA) - self.noise(point - unit * DELTA)) / (2.0 * DELTA)
        };
        Vec3A::new(axis(Vec3A::X), axis(Vec3A::Y), axis(Vec3A::Z))
    }
}

impl TextureMethod for Bump {
    fn apply(&self, input: &TextureInput<'_>, norm: &mut Vec3A, _surf: &mut Surface) {
        let bumped = *norm + self.size * self.gradient(input.pos);
        if let Some(bumped) = bumped.try_normalize() {
            *norm = bumped;
        }
    }
}
