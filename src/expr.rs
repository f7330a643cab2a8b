//! Time-varying scalar expressions
//!
//! An [Expr] is either a leaf (a constant or one of the animation cursors) or a
//! function of up to [MAX_PARAMS] child operands. Function nodes flagged as
//! time-varying memoize their value against the time they were last evaluated
//! at, so a subtree that is already current costs a single comparison.

pub mod builtins;

use std::{
    collections::HashMap,
    fmt::{self, Debug},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    context::EvaluationContext,
    error::{SceneError, SceneResult},
    utils::equal,
};

/// Hard ceiling on the number of operands of a function expression.
pub const MAX_PARAMS: usize = 5;

/// A named, pure numeric function over its operands' values.
#[derive(Clone)]
pub struct ExprFn {
    name: &'static str,
    arity: usize,
    func: Arc<dyn Fn(&[f32]) -> f32 + Send + Sync>,
}

impl ExprFn {
    pub fn new<F>(name: &'static str, arity: usize, func: F) -> Self
    where
        F: Fn(&[f32]) -> f32 + Send + Sync + 'static,
    {
        Self {
            name,
            arity,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Applies the function to `args`, positionally.
    #[inline]
    pub fn call(&self, args: &[f32]) -> f32 {
        (self.func)(args)
    }
}

impl Debug for ExprFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// An expression living in a symbol table, shared by every user.
pub type SharedExpr = Arc<Mutex<Expr>>;

fn lock(shared: &SharedExpr) -> MutexGuard<'_, Expr> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A child of a function expression.
#[derive(Debug, Clone)]
pub enum Operand {
    /// Exclusively owned by its parent.
    Owned(Box<Expr>),
    /// Owned by a symbol table; dropping the operand only drops the handle.
    Shared(SharedExpr),
}

impl Operand {
    pub fn eval(&mut self, ctx: &EvaluationContext) -> f32 {
        match self {
            Operand::Owned(expr) => expr.eval(ctx),
            Operand::Shared(expr) => lock(expr).eval(ctx),
        }
    }

    pub fn value_at(&self, ctx: &EvaluationContext) -> f32 {
        match self {
            Operand::Owned(expr) => expr.value_at(ctx),
            Operand::Shared(expr) => lock(expr).value_at(ctx),
        }
    }

    /// The last computed (or constant) value, without evaluating anything.
    pub fn value(&self) -> f32 {
        match self {
            Operand::Owned(expr) => expr.value,
            Operand::Shared(expr) => lock(expr).value,
        }
    }

    pub fn is_timevary(&self) -> bool {
        match self {
            Operand::Owned(expr) => expr.timevary,
            Operand::Shared(expr) => lock(expr).timevary,
        }
    }

    /// Gives the operand up. Shared expressions outlive their users.
    pub fn release(self) {
        drop(self)
    }
}

impl From<Expr> for Operand {
    fn from(expr: Expr) -> Self {
        Operand::Owned(Box::new(expr))
    }
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Operand::from(Expr::constant(value))
    }
}

fn check_arity(func: &ExprFn, count: usize) -> SceneResult<()> {
    if count > MAX_PARAMS {
        Err(SceneError::TooManyParams(count))
    } else if count == 0 {
        Err(SceneError::NoParams)
    } else if count != func.arity() {
        Err(SceneError::ParamCount {
            kind: func.name(),
            expected: func.arity(),
            found: count,
        })
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum ExprKind {
    Float,
    Time,
    Frame,
    Function { func: ExprFn, params: Vec<Operand> },
}

/// A node of an expression graph.
#[derive(Debug, Clone)]
pub struct Expr {
    kind: ExprKind,
    value: f32,
    timevary: bool,
    timenow: f32,
}

impl Expr {
    fn with_kind(kind: ExprKind, timevary: bool) -> Self {
        Self {
            kind,
            value: 0.0,
            timevary,
            timenow: f32::NEG_INFINITY,
        }
    }

    /// A leaf whose value never changes.
    pub fn constant(value: f32) -> Self {
        Self {
            value,
            ..Self::with_kind(ExprKind::Float, false)
        }
    }

    /// A leaf tracking the current time cursor.
    pub fn time() -> Self {
        Self::with_kind(ExprKind::Time, true)
    }

    /// A leaf tracking the current frame number.
    pub fn frame() -> Self {
        Self::with_kind(ExprKind::Frame, true)
    }

    /// Builds a function node over `params`.
    ///
    /// A node that is not time-varying is computed once, here, from its
    /// operands' current values.
    pub fn function(func: ExprFn, params: Vec<Operand>, timevary: bool) -> SceneResult<Self> {
        check_arity(&func, params.len())?;

        let mut expr = Self::with_kind(ExprKind::Function { func, params }, timevary);
        if !timevary {
            if let ExprKind::Function { func, params } = &expr.kind {
                let args: Vec<f32> = params.iter().map(Operand::value).collect();
                expr.value = func.call(&args);
            }
        }
        Ok(expr)
    }

    /// Folds `func` over `params`.
    ///
    /// When nothing is time-varying and `force_timevary` is unset, the result is
    /// computed immediately and returned as a constant leaf; the operands are
    /// consumed and released. Otherwise the operands are kept under a new
    /// time-varying function node.
    pub fn resolve<const N: usize>(
        params: [Operand; N],
        func: ExprFn,
        force_timevary: bool,
    ) -> SceneResult<Self> {
        Self::resolve_vec(Vec::from(params), func, force_timevary)
    }

    /// [Expr::resolve] for operand lists whose length is only known at runtime.
    pub fn resolve_vec(
        params: Vec<Operand>,
        func: ExprFn,
        force_timevary: bool,
    ) -> SceneResult<Self> {
        check_arity(&func, params.len())?;

        if !force_timevary && !params.iter().any(Operand::is_timevary) {
            let args: Vec<f32> = params.iter().map(Operand::value).collect();
            let folded = Self::constant(func.call(&args));
            params.into_iter().for_each(Operand::release);
            Ok(folded)
        } else {
            Self::function(func, params, true)
        }
    }

    /// Returns the value of the expression at `ctx.time`.
    ///
    /// Stale time-varying function nodes re-evaluate all of their operands
    /// (each of which follows the same rule) and remember the time they were
    /// computed at. Current nodes and constants return their stored value.
    pub fn eval(&mut self, ctx: &EvaluationContext) -> f32 {
        match &mut self.kind {
            ExprKind::Float => {}
            ExprKind::Time => {
                self.value = ctx.time;
                self.timenow = ctx.time;
            }
            ExprKind::Frame => {
                self.value = ctx.frame as f32;
                self.timenow = ctx.time;
            }
            ExprKind::Function { func, params } => {
                if self.timevary && !params.is_empty() && !equal(ctx.time, self.timenow) {
                    let mut args = [0.0; MAX_PARAMS];
                    for (arg, param) in args.iter_mut().zip(params.iter_mut()) {
                        *arg = param.eval(ctx);
                    }
                    self.value = func.call(&args[..params.len()]);
                    self.timenow = ctx.time;
                }
            }
        }
        self.value
    }

    /// Like [Expr::eval], but never touches the memoized state.
    ///
    /// Used once tracing has started and the graph is shared read-only.
    pub fn value_at(&self, ctx: &EvaluationContext) -> f32 {
        match &self.kind {
            ExprKind::Float => self.value,
            ExprKind::Time => ctx.time,
            ExprKind::Frame => ctx.frame as f32,
            ExprKind::Function { func, params } => {
                if !self.timevary || params.is_empty() || equal(ctx.time, self.timenow) {
                    self.value
                } else {
                    let mut args = [0.0; MAX_PARAMS];
                    for (arg, param) in args.iter_mut().zip(params.iter()) {
                        *arg = param.value_at(ctx);
                    }
                    func.call(&args[..params.len()])
                }
            }
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_timevary(&self) -> bool {
        self.timevary
    }

    /// Time of the last evaluation, negative infinity if never evaluated.
    pub fn timenow(&self) -> f32 {
        self.timenow
    }

    /// Number of operands, zero for leaves.
    pub fn param_count(&self) -> usize {
        match &self.kind {
            ExprKind::Function { params, .. } => params.len(),
            _ => 0,
        }
    }
}

/// Binds scalar slot `slot` of some parameter block to an expression.
#[derive(Debug, Clone)]
pub struct ExprAssoc {
    pub slot: usize,
    pub expr: Operand,
}

impl ExprAssoc {
    pub fn new(slot: usize, expr: Operand) -> Self {
        Self { slot, expr }
    }

    /// Writes the expression's current value into its slot of `params`.
    pub fn resolve(&mut self, ctx: &EvaluationContext, params: &mut [f32]) {
        params[self.slot] = self.expr.eval(ctx);
    }

    /// Read-only flavour of [ExprAssoc::resolve].
    pub fn resolve_at(&self, ctx: &EvaluationContext, params: &mut [f32]) {
        params[self.slot] = self.expr.value_at(ctx);
    }
}

/// Named expressions and functions available to scene descriptions.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    exprs: HashMap<String, SharedExpr>,
    funcs: HashMap<&'static str, ExprFn>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table holding `time`, `frame`, `pi` and the builtin functions.
    pub fn new() -> Self {
        let mut table = Self {
            exprs: HashMap::new(),
            funcs: HashMap::new(),
        };
        table.define("time", Expr::time());
        table.define("frame", Expr::frame());
        table.define("pi", Expr::constant(std::f32::consts::PI));
        for func in builtins::all() {
            table.funcs.insert(func.name(), func);
        }
        table
    }

    /// Stores `expr` under `name`, replacing any previous definition.
    pub fn define(&mut self, name: &str, expr: Expr) -> SharedExpr {
        let shared = Arc::new(Mutex::new(expr));
        self.exprs.insert(name.to_string(), Arc::clone(&shared));
        shared
    }

    /// A new operand referring to the expression named `name`.
    pub fn lookup(&self, name: &str) -> Option<Operand> {
        self.exprs
            .get(name)
            .map(|shared| Operand::Shared(Arc::clone(shared)))
    }

    pub fn function(&self, name: &str) -> Option<&ExprFn> {
        self.funcs.get(name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::Severity;

    fn spy(name: &'static str, calls: &Arc<AtomicUsize>) -> ExprFn {
        let calls = Arc::clone(calls);
        ExprFn::new(name, 1, move |args| {
            calls.fetch_add(1, Ordering::SeqCst);
            args[0] * 2.0
        })
    }

    #[test]
    fn constants_ignore_time() {
        let mut e = Expr::constant(4.5);
        let a = e.eval(&EvaluationContext::new(0.0, 0));
        let b = e.eval(&EvaluationContext::new(17.0, 3));
        assert_eq!(a, b);
        assert_eq!(a, 4.5);
        assert!(!e.is_timevary());
    }

    #[test]
    fn time_leaf_tracks_cursor() {
        let mut e = Expr::time();
        assert_eq!(e.eval(&EvaluationContext::new(0.25, 0)), 0.25);
        assert_eq!(e.eval(&EvaluationContext::new(0.75, 0)), 0.75);
        let mut f = Expr::frame();
        assert_eq!(f.eval(&EvaluationContext::new(0.75, 9)), 9.0);
    }

    #[test]
    fn evaluation_is_memoized_per_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut e = Expr::function(spy("double", &calls), vec![Expr::time().into()], true).unwrap();

        let t1 = EvaluationContext::new(1.0, 0);
        assert_eq!(e.eval(&t1), 2.0);
        assert_eq!(e.eval(&t1), 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let t2 = EvaluationContext::new(3.0, 0);
        assert_eq!(e.eval(&t2), 6.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(e.timenow(), 3.0);
    }

    #[test]
    fn current_subtrees_short_circuit() {
        let inner_calls = Arc::new(AtomicUsize::new(0));
        let outer_calls = Arc::new(AtomicUsize::new(0));
        let inner =
            Expr::function(spy("inner", &inner_calls), vec![Expr::time().into()], true).unwrap();
        let mut outer =
            Expr::function(spy("outer", &outer_calls), vec![inner.into()], true).unwrap();

        let ctx = EvaluationContext::new(2.0, 0);
        assert_eq!(outer.eval(&ctx), 8.0);
        assert_eq!(outer.eval(&ctx), 8.0);
        assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outer_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn value_at_leaves_memo_untouched() {
        let calls = Arc::new(AtomicUsize::new(0));
        let e = Expr::function(spy("double", &calls), vec![Expr::time().into()], true).unwrap();
        assert_eq!(e.value_at(&EvaluationContext::new(5.0, 0)), 10.0);
        assert_eq!(e.timenow(), f32::NEG_INFINITY);
        assert_eq!(e.value(), 0.0);
    }

    #[test]
    fn resolve_folds_constants() {
        let sum = Expr::resolve(
            [Expr::constant(5.0).into(), Expr::constant(3.0).into()],
            builtins::add(),
            false,
        )
        .unwrap();
        assert!(!sum.is_timevary());
        assert_eq!(sum.param_count(), 0);
        assert_eq!(sum.value(), 8.0);
    }

    #[test]
    fn resolve_releases_folded_operands() {
        let shared: SharedExpr = Arc::new(Mutex::new(Expr::constant(2.0)));
        let product = Expr::resolve(
            [Operand::Shared(Arc::clone(&shared)), Expr::constant(4.0).into()],
            builtins::mul(),
            false,
        )
        .unwrap();
        assert_eq!(product.value(), 8.0);
        // only the local handle is left
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn resolve_keeps_time_varying_operands() {
        let mut e = Expr::resolve(
            [Expr::time().into(), Expr::constant(10.0).into()],
            builtins::mul(),
            false,
        )
        .unwrap();
        assert!(e.is_timevary());
        assert_eq!(e.param_count(), 2);
        assert_eq!(e.eval(&EvaluationContext::new(0.5, 0)), 5.0);
    }

    #[test]
    fn resolve_can_be_forced_time_varying() {
        let mut e = Expr::resolve([Expr::constant(1.0).into()], builtins::neg(), true).unwrap();
        assert!(e.is_timevary());
        assert_eq!(e.eval(&EvaluationContext::new(0.0, 0)), -1.0);
    }

    #[test]
    fn six_operands_is_a_panic() {
        let func = ExprFn::new("sum6", 6, |args| args.iter().sum());
        let params: Vec<Operand> = (0..6).map(|i| Operand::from(i as f32)).collect();
        let err = Expr::function(func.clone(), params, true).unwrap_err();
        assert!(matches!(err, SceneError::TooManyParams(6)));
        assert_eq!(err.severity(), Severity::Panic);

        let err = Expr::resolve(
            [0.0, 1.0, 2.0, 3.0, 4.0, 5.0].map(|v: f32| Operand::from(v)),
            func,
            false,
        )
        .unwrap_err();
        assert_eq!(err.severity(), Severity::Panic);
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let err = Expr::function(builtins::add(), vec![Expr::constant(1.0).into()], true).unwrap_err();
        assert!(matches!(err, SceneError::ParamCount { expected: 2, found: 1, .. }));
    }

    #[test]
    fn symbol_table_entries_are_shared() {
        let mut table = SymbolTable::new();
        let speed = table.define("speed", Expr::constant(3.0));
        let e = Expr::resolve(
            [table.lookup("speed").unwrap(), Expr::constant(2.0).into()],
            table.function("mul").unwrap().clone(),
            false,
        )
        .unwrap();
        assert_eq!(e.value(), 6.0);
        // the table still owns its entry
        assert_eq!(Arc::strong_count(&speed), 2);
        assert!(table.lookup("speed").is_some());
        assert!(table.lookup("time").unwrap().is_timevary());
    }

    #[test]
    fn shared_time_drives_dependents() {
        let table = SymbolTable::new();
        let mut e = Expr::resolve(
            [
                table.lookup("time").unwrap(),
                Expr::constant(0.0).into(),
                Expr::constant(0.0).into(),
                Expr::constant(1.0).into(),
                Expr::constant(10.0).into(),
            ],
            builtins::linear(),
            false,
        )
        .unwrap();
        assert_eq!(e.eval(&EvaluationContext::new(0.5, 0)), 5.0);
        assert_eq!(e.eval(&EvaluationContext::new(2.0, 0)), 10.0);
    }

    #[test]
    fn associations_write_their_slot() {
        let mut params = [0.0; 3];
        let mut assoc = ExprAssoc::new(1, Expr::time().into());
        assoc.resolve(&EvaluationContext::new(0.5, 0), &mut params);
        assert_eq!(params, [0.0, 0.5, 0.0]);
        assoc.resolve_at(&EvaluationContext::new(0.75, 0), &mut params);
        assert_eq!(params, [0.0, 0.75, 0.0]);
    }
}
