//! The simplest aggregate: a flat list of nodes, tested one after another

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{partition_by_boundedness, Aggregate, Extent, GeomNode, HitRecord, Primitive};
use crate::{
    bounds::BoundingBox,
    context::{EvaluationContext, SceneContext},
    error::SceneResult,
    ray::Ray,
    utils::match_opts::match_opts,
};

#[derive(Debug, Default)]
struct Children {
    bounded: Vec<GeomNode>,
    /// Always tested, without a bounding box check.
    unbounded: Vec<GeomNode>,
    /// Encloses every bounded child.
    bounds: BoundingBox,
}

/// A list of nodes with no acceleration beyond per-child box culling.
///
/// A list holding any unbounded child is itself unbounded.
#[derive(Debug, Default)]
pub struct List {
    children: RwLock<Children>,
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Children> {
        self.children.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Children> {
        self.children.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        let children = self.read();
        children.bounded.len() + children.unbounded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Primitive for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn bounds(&self) -> Option<Extent> {
        let children = self.read();
        if children.unbounded.is_empty() {
            Some(Extent::Bounded(children.bounds))
        } else {
            Some(Extent::Unbounded)
        }
    }

    fn intersect(&self, _ray: &Ray, _mind: f32, _maxd: f32) -> Option<f32> {
        // reached through Aggregate::intersect
        None
    }

    fn aggregate(&self) -> Option<&dyn Aggregate> {
        Some(self)
    }
}

impl Aggregate for List {
    fn convert(&self, objs: Vec<GeomNode>) -> SceneResult<u64> {
        let prims = objs.iter().map(GeomNode::prims).sum();
        *self.write() = Children {
            bounded: objs,
            ..Children::default()
        };
        Ok(prims)
    }

    fn refresh(&self, ctx: &mut SceneContext) -> SceneResult<()> {
        let mut children = self.write();
        let (bounds, mut found) = partition_by_boundedness(&mut children.bounded, ctx)?;
        for node in children.unbounded.iter_mut() {
            node.compute_bounds(ctx)?;
        }
        found.append(&mut children.unbounded);
        children.unbounded = found;
        children.bounds = bounds;
        Ok(())
    }

    fn intersect(
        &self,
        ray: &Ray,
        mind: f32,
        maxd: f32,
        eval: &EvaluationContext,
    ) -> Option<HitRecord> {
        let children = self.read();
        let dir_inv = ray.direction.recip();

        let mut closest: Option<HitRecord> = None;
        for node in children.bounded.iter().chain(children.unbounded.iter()) {
            let limit = closest.as_ref().map_or(maxd, |hit| hit.dist);
            if let Extent::Bounded(bbox) = node.cached_bounds().0 {
                if !bbox.hit_with_inv(ray, dir_inv, mind, limit) {
                    continue;
                }
            }
            let hit = node.intersect(ray, mind, limit, eval);
            closest = match_opts(closest, hit, |a, b| if b.dist < a.dist { b } else { a });
        }
        closest
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&GeomNode)) {
        let children = self.read();
        children
            .bounded
            .iter()
            .chain(children.unbounded.iter())
            .for_each(f);
    }
}
