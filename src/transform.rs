//! Affine transforms, their inverses, and ordered transform chains
//!
//! Convention: [compose]`(a, b)` applies `b` first, then `a`. A
//! [TransformChain] stores transforms in the order they are applied, so its
//! first transform is the one nearest to object space.

use glam::{Affine3A, Vec3, Vec3A};

use crate::{
    bounds::BoundingBox,
    context::EvaluationContext,
    error::{SceneError, SceneResult},
    expr::{ExprAssoc, Operand},
    utils::equal,
};

/// A transform matrix paired with its inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trans {
    pub trans: Affine3A,
    pub itrans: Affine3A,
}

impl Default for Trans {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Trans {
    pub const IDENTITY: Trans = Trans {
        trans: Affine3A::IDENTITY,
        itrans: Affine3A::IDENTITY,
    };

    /// Pairs `trans` with its numerically computed inverse.
    pub fn new(trans: Affine3A) -> Self {
        Self {
            trans,
            itrans: trans.inverse(),
        }
    }

    /// The transform applying `self`, then `next`.
    pub fn then(&self, next: &Trans) -> Trans {
        compose(next, self)
    }

    pub fn invert(&self) -> Trans {
        invert(self)
    }

    pub fn point(&self, point: Vec3A) -> Vec3A {
        self.trans.transform_point3a(point)
    }

    pub fn inverse_point(&self, point: Vec3A) -> Vec3A {
        self.itrans.transform_point3a(point)
    }

    /// Transforms a direction; translation does not apply.
    pub fn vector(&self, vector: Vec3A) -> Vec3A {
        self.trans.transform_vector3a(vector)
    }

    /// Transforms a surface normal, using the transposed inverse.
    pub fn normal(&self, normal: Vec3A) -> Vec3A {
        self.itrans.matrix3.transpose() * normal
    }

    pub fn is_identity(&self) -> bool {
        self.trans == Affine3A::IDENTITY
    }

    pub fn abs_diff_eq(&self, other: &Trans, max_abs_diff: f32) -> bool {
        self.trans.abs_diff_eq(other.trans, max_abs_diff)
            && self.itrans.abs_diff_eq(other.itrans, max_abs_diff)
    }
}

/// Returns the transform that applies `b`, then `a`.
///
/// The inverse is composed in reverse order, `b⁻¹ ∘ a⁻¹`.
pub fn compose(a: &Trans, b: &Trans) -> Trans {
    Trans {
        trans: a.trans * b.trans,
        itrans: b.itrans * a.itrans,
    }
}

/// Swaps a transform and its inverse.
pub fn invert(t: &Trans) -> Trans {
    Trans {
        trans: t.itrans,
        itrans: t.trans,
    }
}

/// The elementary transforms a scene can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// `x, y, z` offsets.
    Translate,
    /// `x, y, z` factors.
    Scale,
    /// `x, y, z` axis, then an angle in degrees.
    Rotate,
    /// Three basis columns followed by the translation column.
    Matrix,
}

impl TransformKind {
    pub fn name(self) -> &'static str {
        match self {
            TransformKind::Translate => "translate",
            TransformKind::Scale => "scale",
            TransformKind::Rotate => "rotate",
            TransformKind::Matrix => "transform",
        }
    }

    pub fn param_count(self) -> usize {
        match self {
            TransformKind::Translate | TransformKind::Scale => 3,
            TransformKind::Rotate => 4,
            TransformKind::Matrix => 12,
        }
    }

    /// Builds the matrix and its exact inverse from a parameter block.
    fn propagate(self, p: &[f32]) -> SceneResult<Trans> {
        match self {
            TransformKind::Translate => {
                let offset = Vec3::new(p[0], p[1], p[2]);
                Ok(Trans {
                    trans: Affine3A::from_translation(offset),
                    itrans: Affine3A::from_translation(-offset),
                })
            }
            TransformKind::Scale => {
                if equal(p[0], 0.0) || equal(p[1], 0.0) || equal(p[2], 0.0) {
                    return Err(SceneError::DegenerateScale(p[0], p[1], p[2]));
                }
                let factor = Vec3::new(p[0], p[1], p[2]);
                Ok(Trans {
                    trans: Affine3A::from_scale(factor),
                    itrans: Affine3A::from_scale(factor.recip()),
                })
            }
            TransformKind::Rotate => {
                let axis = Vec3::new(p[0], p[1], p[2]);
                if equal(axis.length(), 0.0) {
                    return Err(SceneError::DegenerateAxis);
                }
                let axis = axis.normalize();
                let radians = p[3].to_radians();
                Ok(Trans {
                    trans: Affine3A::from_axis_angle(axis, radians),
                    itrans: Affine3A::from_axis_angle(axis, -radians),
                })
            }
            TransformKind::Matrix => {
                let mut cols = [0.0; 12];
                cols.copy_from_slice(&p[..12]);
                let trans = Affine3A::from_cols_array(&cols);
                let det = trans.matrix3.determinant();
                if det == 0.0 || !det.is_finite() {
                    return Err(SceneError::SingularMatrix);
                }
                Ok(Trans::new(trans))
            }
        }
    }
}

/// One link of a transform chain.
///
/// Parameters bound to time-varying expressions are tracked as associations;
/// a transform with any association is animated and must be resolved for the
/// current time before its matrix is meaningful.
#[derive(Debug, Clone)]
pub struct Transform {
    kind: TransformKind,
    params: Vec<f32>,
    assocs: Vec<ExprAssoc>,
    trans: Trans,
}

impl Transform {
    fn from_params(kind: TransformKind, params: Vec<f32>) -> SceneResult<Self> {
        let trans = kind.propagate(&params)?;
        Ok(Self {
            kind,
            params,
            assocs: Vec::new(),
            trans,
        })
    }

    /// Creates an affine transform from the given 3D `translation`.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            kind: TransformKind::Translate,
            params: translation.to_array().to_vec(),
            assocs: Vec::new(),
            trans: Trans {
                trans: Affine3A::from_translation(translation),
                itrans: Affine3A::from_translation(-translation),
            },
        }
    }

    /// Creates an affine transform that changes the size of the object.
    pub fn from_scale_factor(scale: Vec3) -> SceneResult<Self> {
        Self::from_params(TransformKind::Scale, scale.to_array().to_vec())
    }

    /// Creates a rotation around an `axis`, of `degrees`.
    pub fn from_axis_angle_degrees(axis: Vec3, degrees: f32) -> SceneResult<Self> {
        Self::from_params(TransformKind::Rotate, vec![axis.x, axis.y, axis.z, degrees])
    }

    /// Wraps an arbitrary invertible affine matrix.
    pub fn from_matrix(matrix: Affine3A) -> SceneResult<Self> {
        Self::from_params(TransformKind::Matrix, matrix.to_cols_array().to_vec())
    }

    /// Builds a transform from expression operands, one per parameter.
    ///
    /// Constant operands are folded into the parameter block; time-varying
    /// ones become associations and make the transform animated.
    pub fn from_operands(kind: TransformKind, operands: Vec<Operand>) -> SceneResult<Self> {
        if operands.len() != kind.param_count() {
            return Err(SceneError::ParamCount {
                kind: kind.name(),
                expected: kind.param_count(),
                found: operands.len(),
            });
        }

        let mut params = Vec::with_capacity(operands.len());
        let mut assocs = Vec::new();
        for (slot, operand) in operands.into_iter().enumerate() {
            params.push(operand.value());
            if operand.is_timevary() {
                assocs.push(ExprAssoc::new(slot, operand));
            }
        }

        if assocs.is_empty() {
            Self::from_params(kind, params)
        } else {
            // the matrix is meaningless until the first resolve
            Ok(Self {
                kind,
                params,
                assocs,
                trans: Trans::IDENTITY,
            })
        }
    }

    /// Binds parameter `slot` to `expr`, making the transform animated.
    pub fn bind(&mut self, slot: usize, expr: Operand) -> SceneResult<()> {
        if slot >= self.kind.param_count() {
            return Err(SceneError::BadSlot {
                kind: self.kind.name(),
                slot,
            });
        }
        self.assocs.push(ExprAssoc::new(slot, expr));
        Ok(())
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    pub fn is_animated(&self) -> bool {
        !self.assocs.is_empty()
    }

    /// The matrix as of the last resolve (or construction, if static).
    pub fn trans(&self) -> &Trans {
        &self.trans
    }

    /// Re-derives the matrix from the associated expressions at `ctx.time`.
    ///
    /// Static transforms are left untouched.
    pub fn resolve_associations(&mut self, ctx: &EvaluationContext) -> SceneResult<()> {
        if self.assocs.is_empty() {
            return Ok(());
        }
        for assoc in &mut self.assocs {
            assoc.resolve(ctx, &mut self.params);
        }
        self.trans = self.kind.propagate(&self.params)?;
        Ok(())
    }

    /// The matrix at `ctx.time`, computed without updating any cached state.
    pub fn trans_at(&self, ctx: &EvaluationContext) -> SceneResult<Trans> {
        if self.assocs.is_empty() {
            return Ok(self.trans);
        }
        let mut params = self.params.clone();
        for assoc in &self.assocs {
            assoc.resolve_at(ctx, &mut params);
        }
        self.kind.propagate(&params)
    }
}

/// An ordered list of transforms, in application order.
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    nodes: Vec<Transform>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `transform`, to be applied after every transform already present.
    pub fn append(&mut self, transform: Transform) {
        self.nodes.push(transform);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transform> {
        self.nodes.iter()
    }

    pub fn is_animated(&self) -> bool {
        self.nodes.iter().any(Transform::is_animated)
    }

    pub fn resolve_associations(&mut self, ctx: &EvaluationContext) -> SceneResult<()> {
        self.nodes
            .iter_mut()
            .try_for_each(|node| node.resolve_associations(ctx))
    }

    /// Collapses the chain into a single transform, as last resolved.
    pub fn compose(&self) -> Trans {
        self.nodes
            .iter()
            .fold(Trans::IDENTITY, |acc, node| compose(node.trans(), &acc))
    }

    /// Collapses the chain as it stands at `ctx.time`, without resolving it.
    pub fn composed_at(&self, ctx: &EvaluationContext) -> SceneResult<Trans> {
        self.nodes.iter().try_fold(Trans::IDENTITY, |acc, node| {
            Ok(compose(&node.trans_at(ctx)?, &acc))
        })
    }

    /// Carries a box through every transform of the chain, in order.
    ///
    /// Each step encloses the transformed corners of the previous box.
    pub fn transform_bounds(&self, bbox: BoundingBox) -> BoundingBox {
        self.nodes
            .iter()
            .fold(bbox, |bbox, node| bbox.transform(&node.trans().trans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{builtins, Expr};

    const TOL: f32 = 1e-5;

    fn rot_scale() -> Trans {
        let rot = Transform::from_axis_angle_degrees(Vec3::new(1.0, 1.0, 0.0), 37.0).unwrap();
        let scale = Transform::from_scale_factor(Vec3::new(2.0, 0.5, 3.0)).unwrap();
        let shift = Transform::from_translation(Vec3::new(-1.0, 4.0, 0.25));
        let mut chain = TransformChain::new();
        chain.append(scale);
        chain.append(rot);
        chain.append(shift);
        chain.compose()
    }

    #[test]
    fn double_inversion_is_identity() {
        let m = rot_scale();
        assert!(invert(&invert(&m)).abs_diff_eq(&m, TOL));
    }

    #[test]
    fn inverse_composed_with_forward_is_identity() {
        let m = rot_scale();
        let id = compose(&invert(&m), &m);
        assert!(id.trans.abs_diff_eq(Affine3A::IDENTITY, 1e-4));
        assert!(id.itrans.abs_diff_eq(Affine3A::IDENTITY, 1e-4));
        // the analytic inverse agrees with the numeric one
        assert!(m.itrans.abs_diff_eq(m.trans.inverse(), 1e-4));
    }

    #[test]
    fn chained_translations() {
        let mut chain = TransformChain::new();
        chain.append(Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        chain.append(Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        let p = chain.compose().point(Vec3A::ZERO);
        assert!(p.abs_diff_eq(Vec3A::new(1.0, 2.0, 0.0), TOL));
    }

    #[test]
    fn chain_order_matters() {
        let scale = Transform::from_scale_factor(Vec3::splat(2.0)).unwrap();
        let shift = Transform::from_translation(Vec3::X);

        let mut scale_first = TransformChain::new();
        scale_first.append(scale.clone());
        scale_first.append(shift.clone());
        let mut shift_first = TransformChain::new();
        shift_first.append(shift);
        shift_first.append(scale);

        let p = Vec3A::ONE;
        assert!(scale_first
            .compose()
            .point(p)
            .abs_diff_eq(Vec3A::new(3.0, 2.0, 2.0), TOL));
        assert!(shift_first
            .compose()
            .point(p)
            .abs_diff_eq(Vec3A::new(4.0, 2.0, 2.0), TOL));
    }

    #[test]
    fn inverse_of_composition_reverses_order() {
        let a = Transform::from_axis_angle_degrees(Vec3::Z, 90.0).unwrap();
        let b = Transform::from_scale_factor(Vec3::new(1.0, 3.0, 1.0)).unwrap();
        let ab = compose(a.trans(), b.trans());
        let expected = b.trans().itrans * a.trans().itrans;
        assert!(ab.itrans.abs_diff_eq(expected, TOL));

        let p = Vec3A::new(0.3, -2.0, 1.5);
        assert!(ab.inverse_point(ab.point(p)).abs_diff_eq(p, 1e-4));
    }

    #[test]
    fn normals_stay_perpendicular() {
        let t = Transform::from_scale_factor(Vec3::new(4.0, 1.0, 1.0))
            .unwrap()
            .trans()
            .to_owned();
        let tangent = Vec3A::new(1.0, -1.0, 0.0);
        let normal = Vec3A::new(1.0, 1.0, 0.0);
        assert!(t.vector(tangent).dot(t.normal(normal)).abs() < TOL);
    }

    #[test]
    fn degenerate_parameters_abort() {
        assert!(matches!(
            Transform::from_scale_factor(Vec3::new(1.0, 0.0, 1.0)),
            Err(SceneError::DegenerateScale(..))
        ));
        assert!(matches!(
            Transform::from_axis_angle_degrees(Vec3::ZERO, 10.0),
            Err(SceneError::DegenerateAxis)
        ));
        assert!(matches!(
            Transform::from_matrix(Affine3A::from_scale(Vec3::new(1.0, 1.0, 0.0))),
            Err(SceneError::SingularMatrix)
        ));
    }

    fn sliding_x() -> Transform {
        // x = linear(time, 0 -> -2, 1 -> 2)
        let x = Expr::resolve(
            [
                Expr::time().into(),
                Expr::constant(0.0).into(),
                Expr::constant(-2.0).into(),
                Expr::constant(1.0).into(),
                Expr::constant(2.0).into(),
            ],
            builtins::linear(),
            false,
        )
        .unwrap();
        Transform::from_operands(
            TransformKind::Translate,
            vec![
                x.into(),
                Expr::constant(0.0).into(),
                Expr::constant(1.0).into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn animated_transforms_follow_time() {
        let mut t = sliding_x();
        assert!(t.is_animated());

        t.resolve_associations(&EvaluationContext::new(0.25, 0)).unwrap();
        assert!(t.trans().point(Vec3A::ZERO).abs_diff_eq(Vec3A::new(-1.0, 0.0, 1.0), TOL));
        assert_eq!(t.params(), &[-1.0, 0.0, 1.0]);

        t.resolve_associations(&EvaluationContext::new(1.0, 0)).unwrap();
        assert!(t.trans().point(Vec3A::ZERO).abs_diff_eq(Vec3A::new(2.0, 0.0, 1.0), TOL));
    }

    #[test]
    fn composed_at_leaves_chain_untouched() {
        let mut chain = TransformChain::new();
        chain.append(sliding_x());
        chain.resolve_associations(&EvaluationContext::new(0.0, 0)).unwrap();
        let before = chain.compose();

        let later = chain.composed_at(&EvaluationContext::new(0.5, 0)).unwrap();
        assert!(later.point(Vec3A::ZERO).abs_diff_eq(Vec3A::new(0.0, 0.0, 1.0), TOL));
        assert_eq!(chain.compose(), before);
    }

    #[test]
    fn static_operands_fold() {
        let t = Transform::from_operands(
            TransformKind::Scale,
            vec![
                Expr::constant(2.0).into(),
                Expr::constant(2.0).into(),
                Expr::constant(2.0).into(),
            ],
        )
        .unwrap();
        assert!(!t.is_animated());
        assert!(t.trans().point(Vec3A::ONE).abs_diff_eq(Vec3A::splat(2.0), TOL));

        let wrong = Transform::from_operands(TransformKind::Rotate, vec![Expr::constant(1.0).into()]);
        assert!(matches!(wrong, Err(SceneError::ParamCount { expected: 4, .. })));
    }

    #[test]
    fn bind_checks_slot() {
        let mut t = Transform::from_translation(Vec3::ZERO);
        assert!(t.bind(3, Expr::time().into()).is_err());
        t.bind(1, Expr::time().into()).unwrap();
        t.resolve_associations(&EvaluationContext::new(0.5, 0)).unwrap();
        assert!(t.trans().point(Vec3A::ZERO).abs_diff_eq(Vec3A::new(0.0, 0.5, 0.0), TOL));
    }

    #[test]
    fn bounds_follow_chain() {
        let mut chain = TransformChain::new();
        chain.append(Transform::from_scale_factor(Vec3::new(2.0, 1.0, 1.0)).unwrap());
        chain.append(Transform::from_translation(Vec3::new(0.0, 0.0, 5.0)));
        let bbox = chain.transform_bounds(BoundingBox::new(Vec3A::splat(-1.0), Vec3A::ONE));
        assert!(bbox.min.abs_diff_eq(Vec3A::new(-2.0, -1.0, 4.0), TOL));
        assert!(bbox.max.abs_diff_eq(Vec3A::new(2.0, 1.0, 6.0), TOL));
    }
}
