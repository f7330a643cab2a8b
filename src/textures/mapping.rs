//! Inverse mappings from surface points to texture coordinates

use glam::{Mat3A, Vec3A};

use super::TextureSpaces;
use crate::geom::{sphere::direction_uv, Primitive, SurfaceUv};

/// Which space the hit point is brought into before being mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingSpace {
    Primitive,
    Model,
}

/// The shape the texture is projected from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MappingKind {
    /// The primitive's own parameterization.
    Uv,
    /// Orthographic projection onto the plane spanned by `uaxis` and `vaxis`.
    Planar {
        center: Vec3A,
        uaxis: Vec3A,
        vaxis: Vec3A,
    },
    /// Latitude and longitude around `pole`, with `u = 0` along `meridian`.
    Spherical {
        center: Vec3A,
        pole: Vec3A,
        meridian: Vec3A,
    },
    /// Angle around `axis` and height along it.
    Cylindrical {
        center: Vec3A,
        axis: Vec3A,
        meridian: Vec3A,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapping {
    pub space: MappingSpace,
    pub kind: MappingKind,
}

/// Result of [map_to_uv]. Tangents are only present when requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedUv {
    pub u: f32,
    pub v: f32,
    pub dpdu: Option<Vec3A>,
    pub dpdv: Option<Vec3A>,
}

/// Orthonormal frame with `z` along `pole` and `x` as close to `meridian` as
/// possible.
fn frame(pole: Vec3A, meridian: Vec3A) -> Mat3A {
    let z = pole.normalize_or_zero();
    let x = (meridian - z * meridian.dot(z)).normalize_or_zero();
    Mat3A::from_cols(x, z.cross(x), z)
}

impl Mapping {
    /// The primitive's own parameterization, always taken in primitive space.
    pub fn uv() -> Self {
        Self {
            space: MappingSpace::Primitive,
            kind: MappingKind::Uv,
        }
    }

    pub fn planar(space: MappingSpace, center: Vec3A, uaxis: Vec3A, vaxis: Vec3A) -> Self {
        Self {
            space,
            kind: MappingKind::Planar {
                center,
                uaxis,
                vaxis,
            },
        }
    }

    pub fn spherical(space: MappingSpace, center: Vec3A, pole: Vec3A, meridian: Vec3A) -> Self {
        Self {
            space,
            kind: MappingKind::Spherical {
                center,
                pole,
                meridian,
            },
        }
    }

    pub fn cylindrical(space: MappingSpace, center: Vec3A, axis: Vec3A, meridian: Vec3A) -> Self {
        Self {
            space,
            kind: MappingKind::Cylindrical {
                center,
                axis,
                meridian,
            },
        }
    }

    /// Raw coordinates and tangents of `pos`, which is already in this
    /// mapping's space.
    pub fn inverse_map(&self, prim: &dyn Primitive, pos: Vec3A, norm: Vec3A) -> SurfaceUv {
        match self.kind {
            MappingKind::Uv => prim.uv(pos, norm),
            MappingKind::Planar {
                center,
                uaxis,
                vaxis,
            } => {
                let rel = pos - center;
                SurfaceUv {
                    u: rel.dot(uaxis),
                    v: rel.dot(vaxis),
                    dpdu: uaxis,
                    dpdv: vaxis,
                }
            }
            MappingKind::Spherical {
                center,
                pole,
                meridian,
            } => {
                let basis = frame(pole, meridian);
                let local = basis.transpose() * (pos - center).normalize_or_zero();
                let uv = direction_uv(local);
                SurfaceUv {
                    dpdu: basis * uv.dpdu,
                    dpdv: basis * uv.dpdv,
                    ..uv
                }
            }
            MappingKind::Cylindrical {
                center,
                axis,
                meridian,
            } => {
                let basis = frame(axis, meridian);
                let local = basis.transpose() * (pos - center);
                let around = direction_uv(Vec3A::new(local.x, local.y, 0.0).normalize_or_zero());
                SurfaceUv {
                    u: around.u,
                    v: local.z,
                    dpdu: basis * around.dpdu,
                    dpdv: basis.z_axis,
                }
            }
        }
    }
}

/// Texture coordinates of the texture-space point `pos`.
///
/// `(u, v, 0)` is carried through the model-to-texture transform as if it
/// were a point, so coordinates are in model units whichever space the
/// mapping works in. With `tangents`, the parameterization's tangents and
/// `norm` are carried through the primitive-to-model transform, recombined
/// through the texture transform's inverse, then normalized.
pub fn map_to_uv(
    mapping: &Mapping,
    prim: &dyn Primitive,
    pos: Vec3A,
    norm: Vec3A,
    spaces: &TextureSpaces,
    tangents: bool,
) -> MappedUv {
    let local = match mapping.space {
        MappingSpace::Primitive => spaces.text_point_to_prim(pos),
        MappingSpace::Model => spaces.text_point_to_model(pos),
    };
    let raw = mapping.inverse_map(prim, local, norm);
    let uv = spaces.model_to_text.point(Vec3A::new(raw.u, raw.v, 0.0));

    if !tangents {
        return MappedUv {
            u: uv.x,
            v: uv.y,
            dpdu: None,
            dpdv: None,
        };
    }

    let basis = Mat3A::from_cols(
        spaces.prim_to_model.vector(raw.dpdu),
        spaces.prim_to_model.vector(raw.dpdv),
        spaces.prim_to_model.vector(norm),
    );
    let mixing = spaces.model_to_text.itrans.matrix3;
    MappedUv {
        u: uv.x,
        v: uv.y,
        dpdu: Some((basis * mixing.x_axis).normalize_or_zero()),
        dpdv: Some((basis * mixing.y_axis).normalize_or_zero()),
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::{
        geom::{Plane, Sphere},
        transform::{Trans, Transform},
    };

    fn plain() -> TextureSpaces {
        TextureSpaces::identity(&Trans::IDENTITY, &Trans::IDENTITY)
    }

    #[test]
    fn uv_mapping_uses_primitive() {
        let sphere = Sphere::new(Vec3A::ZERO, 1.0);
        let mapped = map_to_uv(&Mapping::uv(), &sphere, Vec3A::Y, Vec3A::Y, &plain(), false);
        assert!((mapped.u - 0.25).abs() < 1e-6);
        assert!((mapped.v - 0.5).abs() < 1e-6);
        assert_eq!(mapped.dpdu, None);
    }

    #[test]
    fn fallback_tangents_are_axes() {
        let plane = Plane::new(Vec3A::ZERO, Vec3A::Z);
        let mapped = map_to_uv(&Mapping::uv(), &plane, Vec3A::ONE, Vec3A::Z, &plain(), true);
        assert_eq!((mapped.u, mapped.v), (0.0, 0.0));
        assert_eq!(mapped.dpdu, Some(Vec3A::X));
        assert_eq!(mapped.dpdv, Some(Vec3A::Y));
    }

    #[test]
    fn uv_pseudo_point_follows_texture_transform() {
        let plane = Plane::new(Vec3A::ZERO, Vec3A::Z);
        let texture_to_model = Transform::from_translation(Vec3::new(0.5, 0.0, 0.0));
        let spaces = TextureSpaces::new(&Trans::IDENTITY, &Trans::IDENTITY, texture_to_model.trans());
        let mapping = Mapping::planar(MappingSpace::Model, Vec3A::ZERO, Vec3A::X, Vec3A::Y);

        // texture-space origin is model (0.5, 0, 0); the raw u of 0.5 then
        // moves back by the model-to-texture shift
        let mapped = map_to_uv(&mapping, &plane, Vec3A::ZERO, Vec3A::Z, &spaces, true);
        assert!(mapped.u.abs() < 1e-6);
        assert_eq!(mapped.dpdu, Some(Vec3A::X));
    }

    #[test]
    fn tangent_mixing_follows_texture_rotation() {
        let plane = Plane::new(Vec3A::ZERO, Vec3A::Z);
        let prim_to_model = Transform::from_axis_angle_degrees(Vec3::Y, 90.0).unwrap();
        let text_to_model = Transform::from_axis_angle_degrees(Vec3::X, 90.0).unwrap();
        let spaces = TextureSpaces::new(prim_to_model.trans(), &Trans::IDENTITY, text_to_model.trans());
        let mapping = Mapping::planar(MappingSpace::Model, Vec3A::ZERO, Vec3A::X, Vec3A::Y);

        let mapped = map_to_uv(&mapping, &plane, Vec3A::ZERO, Vec3A::Z, &spaces, true);
        // the rotation about X swaps the v tangent for the normal column,
        // which the primitive's rotation about Y takes from +Z to +X
        let dpdv = mapped.dpdv.unwrap();
        assert!(dpdv.abs_diff_eq(Vec3A::X, 1e-5), "{dpdv}");
        let dpdu = mapped.dpdu.unwrap();
        assert!(dpdu.abs_diff_eq(-Vec3A::Z, 1e-5), "{dpdu}");
    }

    #[test]
    fn scaled_texture_keeps_unit_tangents() {
        let plane = Plane::new(Vec3A::ZERO, Vec3A::Z);
        let texture_to_model = Transform::from_scale_factor(Vec3::new(4.0, 0.5, 1.0)).unwrap();
        let spaces = TextureSpaces::new(&Trans::IDENTITY, &Trans::IDENTITY, texture_to_model.trans());
        let mapping = Mapping::planar(MappingSpace::Model, Vec3A::ZERO, Vec3A::X, Vec3A::Y);
        let mapped = map_to_uv(&mapping, &plane, Vec3A::new(0.5, 0.25, 0.0), Vec3A::Z, &spaces, true);
        // model point (2, 0.125) maps back to (0.5, 0.25)
        assert!((mapped.u - 0.5).abs() < 1e-6);
        assert!((mapped.v - 0.25).abs() < 1e-6);
        assert!(mapped.dpdu.unwrap().is_normalized());
        assert!(mapped.dpdv.unwrap().is_normalized());
    }

    #[test]
    fn spherical_mapping_around_pole() {
        let sphere = Sphere::new(Vec3A::ZERO, 1.0);
        let mapping = Mapping::spherical(MappingSpace::Model, Vec3A::ZERO, Vec3A::Y, Vec3A::X);
        let top = map_to_uv(&mapping, &sphere, Vec3A::new(0.0, 2.0, 0.0), Vec3A::Y, &plain(), false);
        assert!(top.v.abs() < 1e-6);
        let side = map_to_uv(&mapping, &sphere, Vec3A::X, Vec3A::X, &plain(), false);
        assert!(side.u.abs() < 1e-6);
        assert!((side.v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cylindrical_height_is_v() {
        let sphere = Sphere::new(Vec3A::ZERO, 1.0);
        let mapping = Mapping::cylindrical(MappingSpace::Model, Vec3A::ZERO, Vec3A::Z, Vec3A::X);
        let mapped = map_to_uv(&mapping, &sphere, Vec3A::new(0.0, 1.0, 3.0), Vec3A::Y, &plain(), true);
        assert!((mapped.u - 0.25).abs() < 1e-6);
        assert!((mapped.v - 3.0).abs() < 1e-6);
        assert!(mapped.dpdv.unwrap().abs_diff_eq(Vec3A::Z, 1e-6));
    }
}
