//! Perlin-noise marble veining

use glam::Vec3A;
use noise::{NoiseFn, Perlin};

use super::{TextureInput, TextureMethod};
use crate::{color::Color, surface::Surface};

const OCTAVES: u32 = 6;

/// Summed absolute noise over octaves of doubling frequency.
pub fn turbulence(perlin: &Perlin, point: Vec3A) -> f32 {
    let mut accum = 0.0;
    let mut p = point;
    let mut weight = 1.0;
    for _ in 0..OCTAVES {
        accum += weight * perlin.get(p.as_dvec3().to_array()).abs() as f32;
        weight *= 0.5;
        p *= 2.0;
    }
    accum
}

/// Blends the diffuse colour towards `vein` in bands along X, warped by
/// turbulence.
#[derive(Debug, Clone)]
pub struct Marble {
    perlin: Perlin,
    /// Frequency of the bands.
    pub scale: f32,
    pub vein: Color,
}

impl Marble {
    pub fn new(seed: u32, scale: f32, vein: Color) -> Self {
        Self {
            perlin: Perlin::new(seed),
            scale,
            vein,
        }
    }

    /// Vein strength at `point`, in `[0, 1]`.
    pub fn vein_weight(&self, point: Vec3A) -> f32 {
        let phase = self.scale * point.x + 10.0 * turbulence(&self.perlin, point);
        0.5 * (1.0 + phase.sin())
    }
}

impl TextureMethod for Marble {
    fn apply(&self, input: &TextureInput<'_>, _norm: &mut Vec3A, surf: &mut Surface) {
        let weight = self.vein_weight(input.pos);
        surf.diffuse = surf.diffuse.lerp(self.vein, weight);
    }
}
