//! Exercise a prepared scene: bound it for a frame, then trace a grid of rays
//! through it in parallel.

use std::ops::Add;

use glam::Vec3A;
use rand::{rngs::SmallRng, Rng, SeedableRng};

#[cfg(feature = "parallel")]
use {indicatif::ParallelProgressIterator, rayon::prelude::*};

#[cfg(not(feature = "parallel"))]
use indicatif::ProgressIterator;

use crate::{
    bounds::BoundingBox,
    color::Color,
    context::{EvaluationContext, Sampling, SceneContext},
    error::SceneResult,
    geom::{Extent, GeomNode},
    ray::Ray,
    textures::apply_textures,
    utils::{progress::get_progressbar, random::rand_vec3_in_unit_disk, EPSILON},
};

/// Half-width of the window probed when the world is unbounded.
const UNBOUNDED_HALF_WIDTH: f32 = 5.0;

/// What a probe saw.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Coverage {
    pub rays: u64,
    pub hits: u64,
    /// Sum of the textured diffuse colours at the hits.
    pub diffuse: Color,
}

impl Add for Coverage {
    type Output = Coverage;

    fn add(self, other: Coverage) -> Coverage {
        Coverage {
            rays: self.rays + other.rays,
            hits: self.hits + other.hits,
            diffuse: self.diffuse + other.diffuse,
        }
    }
}

impl std::iter::Sum for Coverage {
    fn sum<I: Iterator<Item = Coverage>>(iter: I) -> Self {
        iter.fold(Coverage::default(), Add::add)
    }
}

impl Coverage {
    /// Share of rays that hit something.
    pub fn fraction(&self) -> f32 {
        if self.rays == 0 {
            0.0
        } else {
            self.hits as f32 / self.rays as f32
        }
    }

    pub fn mean_diffuse(&self) -> Color {
        if self.hits == 0 {
            Color::ZERO
        } else {
            self.diffuse / self.hits as f32
        }
    }
}

/// Scene prober storing the grid resolution and the seed of the ray times
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    grid: u32,
    seed: u64,
}

impl Probe {
    /// Creates a new [Probe] shooting `grid * grid` rays per frame.
    pub fn new(grid: u32, seed: u64) -> Self {
        Self { grid, seed }
    }

    /// Brings `world` up to date for `frame`.
    ///
    /// This is the only part of a frame that mutates the scene.
    pub fn prepare(
        &self,
        world: &mut GeomNode,
        ctx: &mut SceneContext,
        frame: u32,
    ) -> SceneResult<Extent> {
        ctx.begin_frame(frame);
        world.resolve_associations(&ctx.eval())?;
        world.compute_bounds(ctx)
    }

    /// The rectangle rays are shot across, and the height they start from.
    fn window(extent: Extent) -> (BoundingBox, f32) {
        match extent {
            Extent::Bounded(bbox) if !bbox.is_empty() => (bbox, bbox.max.z + 1.0),
            _ => {
                let half = Vec3A::splat(UNBOUNDED_HALF_WIDTH);
                (BoundingBox::new(-half, half), 2.0 * UNBOUNDED_HALF_WIDTH)
            }
        }
    }

    /// Traces one row of the grid, downwards along -Z.
    fn trace_row(
        &self,
        world: &GeomNode,
        window: &(BoundingBox, f32),
        sampling: &Sampling,
        eval: &EvaluationContext,
        row: u32,
    ) -> SceneResult<Coverage> {
        let (bbox, height) = window;
        let diagonal = bbox.diagonal();
        let shutter_start = sampling.shutter_start(eval.frame);
        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(row as u64));

        let mut coverage = Coverage::default();
        for col in 0..self.grid {
            let u = (col as f32 + 0.5) / self.grid as f32;
            let v = (row as f32 + 0.5) / self.grid as f32;
            // jittered within a disc around the cell center
            let jitter = rand_vec3_in_unit_disk(&mut rng) * (0.5 / self.grid as f32);
            let origin = Vec3A::new(
                bbox.min.x + (u + jitter.x) * diagonal.x,
                bbox.min.y + (v + jitter.y) * diagonal.y,
                *height,
            );
            let time = shutter_start + sampling.shutter * rng.gen::<f32>();
            let ray = Ray::new(origin, -Vec3A::Z, time);

            coverage.rays += 1;
            if let Some(diffuse) = shade(world, &ray, eval)? {
                coverage.hits += 1;
                coverage.diffuse += diffuse;
            }
        }
        Ok(coverage)
    }

    /// Traces the grid through `world` without modifying it.
    ///
    /// This functions outputs its progress to the commandline.
    pub fn trace(
        &self,
        world: &GeomNode,
        extent: Extent,
        sampling: &Sampling,
        eval: EvaluationContext,
    ) -> SceneResult<Coverage> {
        let window = Self::window(extent);
        let progress_bar =
            get_progressbar(self.grid as u64).with_prefix(format!("Frame {}", eval.frame));

        #[cfg(feature = "parallel")]
        let rows = (0..self.grid)
            .into_par_iter()
            .progress_with(progress_bar)
            .map(|row| self.trace_row(world, &window, sampling, &eval, row))
            .collect::<SceneResult<Vec<_>>>()?;
        #[cfg(not(feature = "parallel"))]
        let rows = (0..self.grid)
            .progress_with(progress_bar)
            .map(|row| self.trace_row(world, &window, sampling, &eval, row))
            .collect::<SceneResult<Vec<_>>>()?;

        Ok(rows.into_iter().sum())
    }
}

/// Textured diffuse colour where `ray` meets the world, if it does.
fn shade(world: &GeomNode, ray: &Ray, eval: &EvaluationContext) -> SceneResult<Option<Color>> {
    let hit = match world.intersect(ray, EPSILON, f32::MAX, eval) {
        Some(hit) => hit,
        None => return Ok(None),
    };

    let mut surf = hit.surface.as_deref().copied().unwrap_or_default();
    let world_to_model = hit.world_to_model();
    let model_pos = world_to_model.point(ray.at(hit.dist));
    let prim_pos = hit.prim_to_model.inverse_point(model_pos);

    // primitives without normals can't be textured
    if let Some((norm, gnorm)) = hit.object.normal(prim_pos) {
        let mut norm = hit.prim_to_model.normal(norm).normalize_or_zero();
        let gnorm = hit.prim_to_model.normal(gnorm).normalize_or_zero();
        let model_ray = ray.transform(&world_to_model.trans);
        apply_textures(
            &hit.textures,
            hit.object.as_ref(),
            &model_ray,
            model_pos,
            &mut norm,
            gnorm,
            &mut surf,
            &hit.prim_to_model,
            &world_to_model,
            eval,
        )?;
    }
    Ok(Some(surf.diffuse))
}
