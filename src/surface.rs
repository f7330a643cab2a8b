//! Surface appearance parameters modified by textures

use crate::color::{colors, Color};

/// The shading-relevant properties of a surface at a point.
///
/// Textures receive a mutable copy per intersection and adjust it in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    /// Phong exponent of the specular highlight.
    pub spec_power: f32,
    pub reflect: f32,
    pub transp: f32,
    /// Index of refraction.
    pub index: f32,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            ambient: Color::splat(0.1),
            diffuse: Color::splat(0.8),
            specular: colors::BLACK,
            spec_power: 15.0,
            reflect: 0.0,
            transp: 0.0,
            index: 1.0,
        }
    }
}

impl Surface {
    /// A matte surface of the given colour.
    pub fn matte(diffuse: Color) -> Self {
        Self {
            ambient: diffuse * 0.1,
            diffuse,
            ..Self::default()
        }
    }
}
