//! Scene graph nodes and the capability interface of primitives
//!
//! A [GeomNode] wraps a shared [Primitive] with everything that is specific to
//! one placement of it in the scene: its transform chain, textures, surface,
//! and a bounding box cached per frame.

pub mod cuboid;
pub mod list;
pub mod plane;
pub mod sphere;

use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use glam::Vec3A;

pub use self::{cuboid::Cuboid, list::List, plane::Plane, sphere::Sphere};

use crate::{
    bounds::BoundingBox,
    context::{EvaluationContext, SceneContext},
    error::{SceneError, SceneResult},
    ray::Ray,
    surface::Surface,
    textures::Texture,
    transform::{compose, Transform, TransformChain, Trans},
    utils::EPSILON,
};

/// Time samples taken inside each stratum when bounding animated objects.
pub const TIME_SUB_SAMPLES: u32 = 5;

/// The spatial extent of a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Bounded(BoundingBox),
    /// Infinite in at least one direction, e.g. a plane.
    Unbounded,
}

impl Default for Extent {
    fn default() -> Self {
        Extent::Bounded(BoundingBox::default())
    }
}

impl Extent {
    pub fn union(self, other: Extent) -> Extent {
        match (self, other) {
            (Extent::Bounded(a), Extent::Bounded(b)) => Extent::Bounded(a.union(b)),
            _ => Extent::Unbounded,
        }
    }

    pub fn pad(self, amount: f32) -> Extent {
        match self {
            Extent::Bounded(bbox) if !bbox.is_empty() => Extent::Bounded(bbox.pad(amount)),
            other => other,
        }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Extent::Bounded(bbox) => Some(*bbox),
            Extent::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Extent::Unbounded)
    }
}

/// Surface parameterization at a point: texture coordinates and the partial
/// derivatives of position along them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceUv {
    pub u: f32,
    pub v: f32,
    pub dpdu: Vec3A,
    pub dpdv: Vec3A,
}

impl Default for SurfaceUv {
    /// What a primitive without a parameterization reports.
    fn default() -> Self {
        Self {
            u: 0.0,
            v: 0.0,
            dpdu: Vec3A::X,
            dpdv: Vec3A::Y,
        }
    }
}

/// The capability set of a primitive kind.
///
/// Only intersection is mandatory. Everything else has a documented fallback,
/// or yields `None` when the kind cannot provide it at all.
pub trait Primitive: Send + Sync + Debug {
    /// Kind name used in messages and statistics.
    fn name(&self) -> &'static str {
        "unknown"
    }

    /// Object-space extent. `None` if this kind cannot be bounded at all.
    fn bounds(&self) -> Option<Extent> {
        None
    }

    /// Distance along `ray` to the nearest intersection within `(mind, maxd)`.
    ///
    /// Aggregates intersect through [Aggregate::intersect] instead.
    fn intersect(&self, ray: &Ray, mind: f32, maxd: f32) -> Option<f32>;

    /// Shading and geometric normals at `pos`, in object space.
    fn normal(&self, _pos: Vec3A) -> Option<(Vec3A, Vec3A)> {
        None
    }

    /// Whether `ray` enters the primitive at distance `hitd`.
    ///
    /// By default, compares the ray direction against the geometric normal at
    /// the hit point.
    fn enter(&self, ray: &Ray, _mind: f32, hitd: f32) -> Option<bool> {
        let (_, gnorm) = self.normal(ray.at(hitd))?;
        Some(ray.direction.dot(gnorm) < 0.0)
    }

    /// Parameterization at `pos`. Defaults to `(0, 0)` with the X and Y axes
    /// as tangents.
    fn uv(&self, _pos: Vec3A, _norm: Vec3A) -> SurfaceUv {
        SurfaceUv::default()
    }

    fn aggregate(&self) -> Option<&dyn Aggregate> {
        None
    }
}

/// A primitive made of other nodes.
pub trait Aggregate: Send + Sync {
    /// Takes ownership of `objs`, returning the number of primitives within.
    fn convert(&self, objs: Vec<GeomNode>) -> SceneResult<u64>;

    /// Brings the children's bounds up to date for the current frame.
    fn refresh(&self, ctx: &mut SceneContext) -> SceneResult<()>;

    /// Nearest intersection among the children, in this aggregate's space.
    fn intersect(
        &self,
        ray: &Ray,
        mind: f32,
        maxd: f32,
        eval: &EvaluationContext,
    ) -> Option<HitRecord>;

    fn for_each_child(&self, f: &mut dyn FnMut(&GeomNode));
}

/// An intersection with a leaf primitive.
#[derive(Debug, Clone)]
pub struct HitRecord {
    /// Distance along the ray that was traced.
    pub dist: f32,
    pub object: Arc<dyn Primitive>,
    pub textures: Vec<Arc<Texture>>,
    pub surface: Option<Arc<Surface>>,
    /// The leaf node's own transform.
    pub prim_to_model: Trans,
    /// Every enclosing node's transform.
    pub model_to_world: Trans,
}

impl HitRecord {
    pub fn prim_to_world(&self) -> Trans {
        compose(&self.model_to_world, &self.prim_to_model)
    }

    pub fn world_to_model(&self) -> Trans {
        self.model_to_world.invert()
    }
}

/// A placed primitive or aggregate.
#[derive(Debug)]
pub struct GeomNode {
    name: Option<Arc<str>>,
    object: Arc<dyn Primitive>,
    trans: TransformChain,
    /// `trans` collapsed as of the last resolve.
    composite: Trans,
    textures: Vec<Arc<Texture>>,
    surface: Option<Arc<Surface>>,
    prims: u64,
    extent: Extent,
    /// Frame for which `extent` is valid.
    frame: Option<u32>,
    counter: AtomicU64,
    tests: AtomicU64,
    hits: AtomicU64,
}

impl GeomNode {
    pub fn new(object: Arc<dyn Primitive>) -> Self {
        Self {
            name: None,
            object,
            trans: TransformChain::new(),
            composite: Trans::IDENTITY,
            textures: Vec::new(),
            surface: None,
            prims: 1,
            extent: Extent::default(),
            frame: None,
            counter: AtomicU64::new(0),
            tests: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Returns another placement of the same primitive.
    ///
    /// Name, textures and surface are shared with `self`; the transform chain
    /// is duplicated and the copy computes its own bounds.
    pub fn copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            object: Arc::clone(&self.object),
            trans: self.trans.clone(),
            composite: self.composite,
            textures: self.textures.clone(),
            surface: self.surface.clone(),
            prims: self.prims,
            extent: self.extent,
            frame: None,
            counter: AtomicU64::new(0),
            tests: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    pub fn with_surface(mut self, surface: Arc<Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.textures.push(texture);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.append_transform(transform);
        self
    }

    /// Appends `transform` after the node's existing transforms.
    pub fn append_transform(&mut self, transform: Transform) {
        self.trans.append(transform);
        self.composite = self.trans.compose();
        self.frame = None;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The primitive kind's name.
    pub fn kind_name(&self) -> &'static str {
        self.object.name()
    }

    pub fn object(&self) -> &Arc<dyn Primitive> {
        &self.object
    }

    pub fn transforms(&self) -> &TransformChain {
        &self.trans
    }

    pub fn textures(&self) -> &[Arc<Texture>] {
        &self.textures
    }

    pub fn surface(&self) -> Option<&Arc<Surface>> {
        self.surface.as_ref()
    }

    pub fn prims(&self) -> u64 {
        self.prims
    }

    pub fn is_animated(&self) -> bool {
        self.trans.is_animated()
    }

    pub fn is_aggregate(&self) -> bool {
        self.object.aggregate().is_some()
    }

    /// Cached extent and the frame it belongs to.
    pub fn cached_bounds(&self) -> (Extent, Option<u32>) {
        (self.extent, self.frame)
    }

    pub fn is_unbounded(&self) -> bool {
        self.extent.is_unbounded()
    }

    /// Hands `objs` to this node's aggregate.
    pub fn convert(&mut self, objs: Vec<GeomNode>) -> SceneResult<()> {
        let aggregate = self
            .object
            .aggregate()
            .ok_or_else(|| SceneError::NotAggregate(self.kind_name().to_string()))?;
        self.prims = aggregate.convert(objs)?;
        self.frame = None;
        log::debug!("{}", self.info());
        Ok(())
    }

    /// One-paragraph description for logging.
    pub fn info(&self) -> String {
        let mut out = match self.name() {
            Some(name) if !name.is_empty() => format!("{} \"{}\":", self.kind_name(), name),
            _ => format!("{}:", self.kind_name()),
        };
        if let Extent::Bounded(bbox) = self.extent {
            out.push_str(&format!("\n\tbounds {bbox}"));
        }
        let plural = if self.prims == 1 { "" } else { "s" };
        out.push_str(&format!("\n\t{} primitive{}", self.prims, plural));
        out
    }

    /// Returns the node's extent for the context's frame, recomputing it if the
    /// cache belongs to another frame.
    ///
    /// Static nodes are bounded exactly (up to padding). Animated nodes are
    /// sampled over the frame's shutter interval; the result is conservative
    /// for the sampled instants but is not a guaranteed bound on the motion.
    pub fn compute_bounds(&mut self, ctx: &mut SceneContext) -> SceneResult<Extent> {
        if self.frame == Some(ctx.frame()) {
            return Ok(self.extent);
        }

        if let Some(aggregate) = self.object.aggregate() {
            aggregate.refresh(ctx)?;
        }

        let extent = if self.trans.is_animated() {
            self.animated_bounds(ctx)?
        } else {
            self.transformed_bounds()?
        };

        self.extent = extent.pad(EPSILON);
        self.composite = self.trans.compose();
        self.frame = Some(ctx.frame());
        self.counter.store(0, Ordering::Relaxed);
        Ok(self.extent)
    }

    /// Object bounds, padded, carried through the transform chain as it
    /// currently stands.
    fn transformed_bounds(&self) -> SceneResult<Extent> {
        match self.object.bounds() {
            None => Err(SceneError::NoBounds(self.kind_name().to_string())),
            Some(Extent::Unbounded) => Ok(Extent::Unbounded),
            Some(Extent::Bounded(bbox)) => Ok(Extent::Bounded(
                self.trans.transform_bounds(bbox.pad(EPSILON)),
            )),
        }
    }

    fn bounds_at(&mut self, ctx: &mut SceneContext, time: f32) -> SceneResult<Extent> {
        ctx.set_time(time);
        self.trans.resolve_associations(&ctx.eval())?;
        self.transformed_bounds()
    }

    /// Stratified, jittered sampling of the bounds over the shutter interval,
    /// plus both of its endpoints.
    fn animated_bounds(&mut self, ctx: &mut SceneContext) -> SceneResult<Extent> {
        let sampling = *ctx.sampling();
        let start = ctx.shutter_start();
        let resume = ctx.time();

        let window = sampling.shutter / sampling.total_samples.max(1) as f32;
        let subwindow = window / TIME_SUB_SAMPLES as f32;

        let mut extent = Extent::default();
        for stratum in 0..sampling.total_samples {
            let window_start = start + stratum as f32 * window;
            for sub in 0..TIME_SUB_SAMPLES {
                let time = window_start + sub as f32 * subwindow + subwindow * ctx.rand();
                extent = extent.union(self.bounds_at(ctx, time)?);
            }
        }

        // motion often peaks at the interval's ends
        extent = extent.union(self.bounds_at(ctx, start)?);
        extent = extent.union(self.bounds_at(ctx, start + sampling.shutter)?);

        ctx.set_time(resume);
        self.trans.resolve_associations(&ctx.eval())?;
        Ok(extent)
    }

    /// Resolves the node's animated transforms for the context's time.
    pub fn resolve_associations(&mut self, ctx: &EvaluationContext) -> SceneResult<()> {
        self.trans.resolve_associations(ctx)?;
        self.composite = self.trans.compose();
        Ok(())
    }

    /// The node's transform at `time`, without touching cached state.
    fn trans_at(&self, eval: &EvaluationContext, time: f32) -> Option<Trans> {
        if !self.trans.is_animated() {
            return Some(self.composite);
        }
        match self.trans.composed_at(&eval.at_time(time)) {
            Ok(trans) => Some(trans),
            Err(err) => {
                log::debug!("skipping {} at time {time}: {err}", self.kind_name());
                None
            }
        }
    }

    /// Nearest intersection of `ray` (in the parent's space) with this node.
    pub fn intersect(
        &self,
        ray: &Ray,
        mind: f32,
        maxd: f32,
        eval: &EvaluationContext,
    ) -> Option<HitRecord> {
        self.tests.fetch_add(1, Ordering::Relaxed);
        let trans = self.trans_at(eval, ray.time)?;
        let local = if self.trans.is_empty() {
            *ray
        } else {
            ray.transform(&trans.itrans)
        };

        let mut hit = match self.object.aggregate() {
            Some(aggregate) => {
                let mut hit = aggregate.intersect(&local, mind, maxd, eval)?;
                hit.model_to_world = compose(&trans, &hit.model_to_world);
                hit
            }
            None => HitRecord {
                dist: self.object.intersect(&local, mind, maxd)?,
                object: Arc::clone(&self.object),
                textures: Vec::new(),
                surface: None,
                prim_to_model: trans,
                model_to_world: Trans::IDENTITY,
            },
        };

        // inner textures apply first, the innermost surface wins
        hit.textures.extend(self.textures.iter().cloned());
        if hit.surface.is_none() {
            hit.surface = self.surface.clone();
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        self.counter.fetch_add(1, Ordering::Relaxed);
        Some(hit)
    }

    pub fn normal(&self, pos: Vec3A) -> SceneResult<(Vec3A, Vec3A)> {
        self.object
            .normal(pos)
            .ok_or_else(|| SceneError::NoNormal(self.kind_name().to_string()))
    }

    pub fn enter(&self, ray: &Ray, mind: f32, hitd: f32) -> SceneResult<bool> {
        self.object
            .enter(ray, mind, hitd)
            .ok_or_else(|| SceneError::NoNormal(self.kind_name().to_string()))
    }

    pub fn uv(&self, pos: Vec3A, norm: Vec3A) -> SurfaceUv {
        self.object.uv(pos, norm)
    }

    /// Intersection tests and hits since the scene was built.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.tests.load(Ordering::Relaxed),
            self.hits.load(Ordering::Relaxed),
        )
    }

    /// Hits since the bounds were last computed.
    pub fn frame_hits(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Calls `f` on the aggregate's children, if any.
    pub fn for_each_child(&self, f: &mut dyn FnMut(&GeomNode)) {
        if let Some(aggregate) = self.object.aggregate() {
            aggregate.for_each_child(f);
        }
    }
}

/// Computes the bounds of every node in `bounded`, moving the unbounded ones
/// out.
///
/// Returns the box enclosing the nodes left in `bounded`, and the unbounded
/// nodes, most recently found first.
pub fn partition_by_boundedness(
    bounded: &mut Vec<GeomNode>,
    ctx: &mut SceneContext,
) -> SceneResult<(BoundingBox, Vec<GeomNode>)> {
    let extents = bounded
        .iter_mut()
        .map(|node| node.compute_bounds(ctx))
        .collect::<SceneResult<Vec<_>>>()?;

    let mut bounds = BoundingBox::default();
    let mut kept = Vec::with_capacity(bounded.len());
    let mut unbounded = Vec::new();
    for (node, extent) in bounded.drain(..).zip(extents) {
        match extent {
            Extent::Bounded(bbox) => {
                bounds.enlarge(bbox);
                kept.push(node);
            }
            Extent::Unbounded => unbounded.push(node),
        }
    }

    *bounded = kept;
    unbounded.reverse();
    Ok((bounds, unbounded))
}
