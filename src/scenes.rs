//! Scene generation functionality

use std::{path::Path, sync::Arc};

use glam::{Vec3, Vec3A};
use rand::Rng;

use crate::{
    color::Color,
    error::SceneResult,
    expr::{builtins, Expr, Operand, SymbolTable},
    geom::{Cuboid, GeomNode, List, Plane, Sphere},
    surface::Surface,
    textures::{Bump, Checkered, ImageMap, Mapping, MappingSpace, Marble, Texture},
    transform::{Transform, TransformKind},
    utils::random::rand_vec3_on_unit_sphere,
};

/// Possible hard-coded scenes to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SceneType {
    /// A field of static, textured spheres and boxes
    Spheres,
    /// A sphere sliding along X while the shutter is open
    Slide,
    /// Two spheres circling a bumpy one
    Orbit,
    /// Spheres standing on an infinite checkered plane
    Infinite,
}

/// Returns the world of the chosen scene, an unconverted list of objects.
///
/// `texture` is an image mapped onto the scene's main object, where the scene
/// has one.
pub fn get_scene(
    scene_type: SceneType,
    texture: Option<&Path>,
    rng: &mut impl Rng,
) -> SceneResult<Vec<GeomNode>> {
    let mut symbols = SymbolTable::new();
    match scene_type {
        SceneType::Spheres => gen_spheres(texture, rng),
        SceneType::Slide => gen_slide(&symbols, texture),
        SceneType::Orbit => gen_orbit(&mut symbols),
        SceneType::Infinite => Ok(gen_infinite(rng)),
    }
}

/// Wraps `objects` in a single [List] node.
pub fn get_world(objects: Vec<GeomNode>) -> SceneResult<GeomNode> {
    let mut world = GeomNode::new(Arc::new(List::new())).with_name("world");
    world.convert(objects)?;
    Ok(world)
}

fn image_texture(path: &Path) -> Arc<Texture> {
    Arc::new(Texture::new(ImageMap::open_or_missing(path, Mapping::uv())))
}

fn checker() -> Arc<Texture> {
    Arc::new(Texture::new(Checkered::new(
        Color::new(0.2, 0.3, 0.1),
        Color::new(0.9, 0.9, 0.9),
    )))
}

/// Returns a grid of spheres and boxes of random size and material.
fn gen_spheres(texture: Option<&Path>, rng: &mut impl Rng) -> SceneResult<Vec<GeomNode>> {
    let unit_sphere: Arc<Sphere> = Arc::new(Sphere::new(Vec3A::ZERO, 1.0));
    let unit_box = Arc::new(Cuboid::new(Vec3A::splat(-0.5), Vec3A::splat(0.5)));
    let marble = Arc::new(Texture::new(Marble::new(rng.gen(), 4.0, Color::new(0.1, 0.1, 0.2))));

    let mut objects = Vec::new();
    for a in -3..3 {
        for b in -3..3 {
            let radius = rng.gen_range(0.2..0.45);
            let center = Vec3::new(a as f32 + 0.5, radius, b as f32 + 0.5);
            let surface = Arc::new(Surface::matte(Color::new(rng.gen(), rng.gen(), rng.gen())));

            let node = if rng.gen_bool(0.25) {
                let tilt = Vec3::from(rand_vec3_on_unit_sphere(rng));
                GeomNode::new(unit_box.clone())
                    .with_transform(Transform::from_axis_angle_degrees(tilt, rng.gen_range(0.0..30.0))?)
                    .with_transform(Transform::from_translation(center))
            } else {
                GeomNode::new(unit_sphere.clone())
                    .with_transform(Transform::from_scale_factor(Vec3::splat(radius))?)
                    .with_transform(Transform::from_translation(center))
            };

            let node = node.with_surface(surface);
            objects.push(if (a + b) % 2 == 0 {
                node.with_texture(marble.clone())
            } else {
                node
            });
        }
    }

    let mut centerpiece = GeomNode::new(unit_sphere)
        .with_name("centerpiece")
        .with_surface(Arc::new(Surface::default()))
        .with_transform(Transform::from_translation(Vec3::new(0.0, 1.5, 0.0)));
    if let Some(path) = texture {
        centerpiece = centerpiece.with_texture(image_texture(path));
    }
    objects.push(centerpiece);
    Ok(objects)
}

/// Returns a sphere moving from x = -3 to x = 3 between times 0 and 1.
fn gen_slide(symbols: &SymbolTable, texture: Option<&Path>) -> SceneResult<Vec<GeomNode>> {
    let time = symbols
        .lookup("time")
        .unwrap_or_else(|| Operand::from(Expr::time()));
    let x = Expr::resolve(
        [
            time,
            Expr::constant(0.0).into(),
            Expr::constant(-3.0).into(),
            Expr::constant(1.0).into(),
            Expr::constant(3.0).into(),
        ],
        builtins::linear(),
        false,
    )?;
    let slide = Transform::from_operands(
        TransformKind::Translate,
        vec![x.into(), Expr::constant(1.0).into(), Expr::constant(0.0).into()],
    )?;

    let mut ball = GeomNode::new(Arc::new(Sphere::new(Vec3A::ZERO, 1.0)))
        .with_name("slider")
        .with_surface(Arc::new(Surface::matte(Color::new(0.8, 0.3, 0.3))))
        .with_transform(slide);
    ball = match texture {
        Some(path) => ball.with_texture(image_texture(path)),
        None => ball.with_texture(checker()),
    };

    let marker = GeomNode::new(Arc::new(Cuboid::new(
        Vec3A::new(-0.25, 0.0, -0.25),
        Vec3A::new(0.25, 0.5, 0.25),
    )))
    .with_name("marker");

    Ok(vec![ball, marker])
}

/// Returns two spheres sharing one spin, around a bump-mapped core.
fn gen_orbit(symbols: &mut SymbolTable) -> SceneResult<Vec<GeomNode>> {
    // one full turn per unit of time
    let spin = Expr::resolve(
        [Expr::time().into(), Expr::constant(360.0).into()],
        builtins::mul(),
        false,
    )?;
    let spin = symbols.define("spin", spin);

    let moon: Arc<Sphere> = Arc::new(Sphere::new(Vec3A::ZERO, 0.4));
    let orbiting = |offset: f32, name: &str| -> SceneResult<GeomNode> {
        let rotation = Transform::from_operands(
            TransformKind::Rotate,
            vec![
                Expr::constant(0.0).into(),
                Expr::constant(1.0).into(),
                Expr::constant(0.0).into(),
                Operand::Shared(Arc::clone(&spin)),
            ],
        )?;
        Ok(GeomNode::new(moon.clone())
            .with_name(name)
            .with_transform(Transform::from_translation(Vec3::new(offset, 0.0, 0.0)))
            .with_transform(rotation))
    };
    let inner = orbiting(2.0, "inner")?;
    let outer = orbiting(-3.5, "outer")?;

    let core = GeomNode::new(Arc::new(Sphere::new(Vec3A::ZERO, 1.0)))
        .with_name("core")
        .with_texture(Arc::new(Texture::new(Bump::new(7, 0.3))))
        .with_texture(Arc::new(
            Texture::new(Checkered::new(Color::new(0.9, 0.6, 0.1), Color::new(0.4, 0.2, 0.0)))
                .with_transform(Transform::from_scale_factor(Vec3::splat(0.25))?),
        ));

    Ok(vec![core, inner, outer])
}

/// Returns a few spheres on an infinite plane, so the world itself is unbounded.
fn gen_infinite(rng: &mut impl Rng) -> Vec<GeomNode> {
    let ground = GeomNode::new(Arc::new(Plane::new(Vec3A::ZERO, Vec3A::Y)))
        .with_name("ground")
        .with_texture(Arc::new(
            Texture::new(Checkered::new(Color::ONE, Color::ZERO))
                .with_transform(Transform::from_translation(Vec3::new(0.0, 0.5, 0.0))),
        ));

    let globe = Arc::new(Texture::new(Marble::new(rng.gen(), 2.0, Color::new(0.3, 0.0, 0.0))));
    let planar = Arc::new(Texture::new(ImageMap::new(
        image::RgbImage::from_fn(4, 4, |x, y| image::Rgb([(x * 60) as u8, (y * 60) as u8, 128])),
        Mapping::planar(MappingSpace::Model, Vec3A::ZERO, Vec3A::X, Vec3A::Z),
    )));

    let mut objects = vec![ground];
    for i in 0..4 {
        let x = i as f32 * 2.5 - 3.75;
        let node = GeomNode::new(Arc::new(Sphere::new(Vec3A::new(x, 1.0, 0.0), 1.0)));
        objects.push(if i % 2 == 0 {
            node.with_texture(globe.clone())
        } else {
            node.with_texture(planar.clone())
        });
    }
    objects
}
