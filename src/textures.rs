//! Textures: shading callbacks applied at a hit, each in its own space
//!
//! A [Texture] pairs a [TextureMethod] with a transform chain placing the
//! texture in the model space of the object it is attached to.

pub mod bump;
pub mod checkered;
pub mod image;
pub mod mapping;
pub mod marble;

use std::{fmt::Debug, sync::Arc};

use glam::Vec3A;

pub use self::{
    bump::Bump,
    checkered::Checkered,
    image::ImageMap,
    mapping::{map_to_uv, MappedUv, Mapping, MappingKind, MappingSpace},
    marble::Marble,
};

use crate::{
    context::EvaluationContext,
    error::SceneResult,
    geom::Primitive,
    ray::Ray,
    surface::Surface,
    transform::{compose, Transform, TransformChain, Trans},
};

/// Transforms between the spaces involved in applying one texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSpaces {
    pub prim_to_model: Trans,
    pub model_to_text: Trans,
    pub prim_to_text: Trans,
    pub world_to_text: Trans,
}

impl TextureSpaces {
    /// Spaces for a texture placed in model space by `text_to_model`.
    pub fn new(prim_to_model: &Trans, world_to_model: &Trans, text_to_model: &Trans) -> Self {
        let model_to_text = text_to_model.invert();
        Self {
            prim_to_model: *prim_to_model,
            model_to_text,
            prim_to_text: compose(&model_to_text, prim_to_model),
            world_to_text: compose(&model_to_text, world_to_model),
        }
    }

    /// Spaces for an untransformed texture, where texture space is model space.
    pub fn identity(prim_to_model: &Trans, world_to_model: &Trans) -> Self {
        Self {
            prim_to_model: *prim_to_model,
            model_to_text: Trans::IDENTITY,
            prim_to_text: *prim_to_model,
            world_to_text: *world_to_model,
        }
    }

    pub fn text_point_to_prim(&self, pos: Vec3A) -> Vec3A {
        self.prim_to_text.inverse_point(pos)
    }

    pub fn text_point_to_model(&self, pos: Vec3A) -> Vec3A {
        self.model_to_text.inverse_point(pos)
    }

    pub fn model_point_to_text(&self, pos: Vec3A) -> Vec3A {
        self.model_to_text.point(pos)
    }
}

/// What a [TextureMethod] gets to look at.
///
/// `pos` is in texture space. The ray and `gnorm` stay in model space, as
/// does the shading normal handed to [TextureMethod::apply].
#[derive(Debug, Clone, Copy)]
pub struct TextureInput<'a> {
    pub prim: &'a dyn Primitive,
    pub ray: &'a Ray,
    pub pos: Vec3A,
    pub gnorm: Vec3A,
    pub spaces: &'a TextureSpaces,
}

/// A shading callback.
pub trait TextureMethod: Send + Sync + Debug {
    /// Adjusts the surface properties and shading normal at `input.pos`.
    fn apply(&self, input: &TextureInput<'_>, norm: &mut Vec3A, surf: &mut Surface);
}

#[derive(Debug)]
pub struct Texture {
    method: Arc<dyn TextureMethod>,
    trans: TransformChain,
}

impl Texture {
    pub fn new(method: impl TextureMethod + 'static) -> Self {
        Self {
            method: Arc::new(method),
            trans: TransformChain::new(),
        }
    }

    /// Appends a transform moving the texture within model space.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.trans.append(transform);
        self
    }

    pub fn transforms(&self) -> &TransformChain {
        &self.trans
    }

    /// Spaces for this texture at `eval.time`.
    pub fn spaces(
        &self,
        prim_to_model: &Trans,
        world_to_model: &Trans,
        eval: &EvaluationContext,
    ) -> SceneResult<TextureSpaces> {
        if self.trans.is_empty() {
            return Ok(TextureSpaces::identity(prim_to_model, world_to_model));
        }
        let text_to_model = if self.trans.is_animated() {
            self.trans.composed_at(eval)?
        } else {
            self.trans.compose()
        };
        Ok(TextureSpaces::new(prim_to_model, world_to_model, &text_to_model))
    }
}

/// Applies every texture of `textures`, in order, to the hit at `pos`.
///
/// `pos`, `norm`, `gnorm` and `ray` are in model space. Only the hit point is
/// moved into each texture's own space; the shading normal is edited in place
/// and seen by the next texture as left. Animated textures are placed at the
/// ray's time.
#[allow(clippy::too_many_arguments)]
pub fn apply_textures(
    textures: &[Arc<Texture>],
    prim: &dyn Primitive,
    ray: &Ray,
    pos: Vec3A,
    norm: &mut Vec3A,
    gnorm: Vec3A,
    surf: &mut Surface,
    prim_to_model: &Trans,
    world_to_model: &Trans,
    eval: &EvaluationContext,
) -> SceneResult<()> {
    let eval = eval.at_time(ray.time);
    for texture in textures {
        let spaces = texture.spaces(prim_to_model, world_to_model, &eval)?;
        let input = TextureInput {
            prim,
            ray,
            pos: spaces.model_point_to_text(pos),
            gnorm,
            spaces: &spaces,
        };
        texture.method.apply(&input, norm, surf);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::{
        color::Color,
        expr::{builtins, Expr},
        geom::Sphere,
        transform::TransformKind,
    };

    /// Records the texture-space position it was applied at as the diffuse
    /// colour.
    #[derive(Debug)]
    struct Probe;

    impl TextureMethod for Probe {
        fn apply(&self, input: &TextureInput<'_>, _norm: &mut Vec3A, surf: &mut Surface) {
            surf.diffuse = input.pos;
        }
    }

    /// Records the shading normal, ray direction and geometric normal it was
    /// handed, then tilts the normal towards +X.
    #[derive(Debug)]
    struct Tilt;

    impl TextureMethod for Tilt {
        fn apply(&self, input: &TextureInput<'_>, norm: &mut Vec3A, surf: &mut Surface) {
            surf.diffuse = *norm;
            surf.ambient = input.ray.direction;
            surf.specular = input.gnorm;
            *norm = (*norm + Vec3A::X).normalize();
        }
    }

    fn apply(textures: &[Arc<Texture>], pos: Vec3A, time: f32) -> (Vec3A, Surface) {
        let ray = Ray::new(Vec3A::new(0.0, 0.0, 5.0), -Vec3A::Z, time);
        apply_along(textures, &ray, pos, Vec3A::Z)
    }

    fn apply_along(textures: &[Arc<Texture>], ray: &Ray, pos: Vec3A, gnorm: Vec3A) -> (Vec3A, Surface) {
        let sphere = Sphere::new(Vec3A::ZERO, 1.0);
        let mut norm = gnorm;
        let mut surf = Surface::default();
        apply_textures(
            textures,
            &sphere,
            ray,
            pos,
            &mut norm,
            gnorm,
            &mut surf,
            &Trans::IDENTITY,
            &Trans::IDENTITY,
            &EvaluationContext::new(0.0, 0),
        )
        .unwrap();
        (norm, surf)
    }

    #[test]
    fn texture_transform_moves_lookup() {
        let moved = Arc::new(
            Texture::new(Probe).with_transform(Transform::from_translation(Vec3::new(2.0, 0.0, 0.0))),
        );
        let (_, surf) = apply(&[moved], Vec3A::new(3.0, 1.0, 0.0), 0.0);
        assert!(surf.diffuse.abs_diff_eq(Color::new(1.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn animated_texture_follows_ray_time() {
        let x = Expr::resolve(
            [
                Expr::time().into(),
                Expr::constant(0.0).into(),
                Expr::constant(0.0).into(),
                Expr::constant(1.0).into(),
                Expr::constant(4.0).into(),
            ],
            builtins::linear(),
            false,
        )
        .unwrap();
        let slide = Transform::from_operands(
            TransformKind::Translate,
            vec![x.into(), Expr::constant(0.0).into(), Expr::constant(0.0).into()],
        )
        .unwrap();
        let textures = [Arc::new(Texture::new(Probe).with_transform(slide))];

        let (_, early) = apply(&textures, Vec3A::ZERO, 0.0);
        let (_, late) = apply(&textures, Vec3A::ZERO, 0.5);
        assert!(early.diffuse.abs_diff_eq(Vec3A::ZERO, 1e-6));
        assert!(late.diffuse.abs_diff_eq(Vec3A::new(-2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn rotated_texture_sees_model_space_ray_and_normals() {
        let rotated = Arc::new(
            Texture::new(Tilt)
                .with_transform(Transform::from_axis_angle_degrees(Vec3::Z, 90.0).unwrap()),
        );
        let ray = Ray::new(Vec3A::new(5.0, 0.0, 0.0), -Vec3A::X, 0.0);
        let (norm, seen) = apply_along(&[rotated], &ray, Vec3A::X, Vec3A::X);
        assert!(seen.diffuse.abs_diff_eq(Vec3A::X, 1e-6), "{}", seen.diffuse);
        assert!(seen.ambient.abs_diff_eq(-Vec3A::X, 1e-6), "{}", seen.ambient);
        assert!(seen.specular.abs_diff_eq(Vec3A::X, 1e-6), "{}", seen.specular);
        // the edit lands on the model-space normal as is
        assert!(norm.abs_diff_eq(Vec3A::X, 1e-6), "{norm}");
    }

    #[test]
    fn normal_edits_chain_between_textures() {
        let textures = [Arc::new(Texture::new(Tilt)), Arc::new(Texture::new(Tilt))];
        let (norm, seen) = apply(&textures, Vec3A::ZERO, 0.0);
        let once = Vec3A::new(1.0, 0.0, 1.0).normalize();
        assert!(seen.diffuse.abs_diff_eq(once, 1e-6), "{}", seen.diffuse);
        assert!(norm.abs_diff_eq((once + Vec3A::X).normalize(), 1e-6), "{norm}");
    }

    #[test]
    fn world_to_text_applies_world_to_model_first() {
        let world_to_model = *Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)).trans();
        let text_to_model = *Transform::from_scale_factor(Vec3::splat(2.0)).unwrap().trans();
        let spaces = TextureSpaces::new(&Trans::IDENTITY, &world_to_model, &text_to_model);
        // world (3, 0, 0) is model (4, 0, 0), then texture (2, 0, 0)
        let text = spaces.world_to_text.point(Vec3A::new(3.0, 0.0, 0.0));
        assert!(text.abs_diff_eq(Vec3A::new(2.0, 0.0, 0.0), 1e-6), "{text}");
        let identity = TextureSpaces::identity(&Trans::IDENTITY, &world_to_model);
        assert_eq!(identity.world_to_text, world_to_model);
    }

    #[test]
    fn textures_apply_in_order() {
        let textures = [
            Arc::new(Texture::new(Probe)),
            Arc::new(Texture::new(Checkered::new(Color::ONE, Color::ZERO))),
        ];
        let (_, surf) = apply(&textures, Vec3A::new(0.5, 0.5, 0.5), 0.0);
        assert_eq!(surf.diffuse, Color::ONE);
    }
}
