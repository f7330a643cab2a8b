//! Builtin functions available to scene expressions

use super::ExprFn;
use crate::utils::equal;

pub fn add() -> ExprFn {
    ExprFn::new("add", 2, |a| a[0] + a[1])
}

pub fn sub() -> ExprFn {
    ExprFn::new("sub", 2, |a| a[0] - a[1])
}

pub fn mul() -> ExprFn {
    ExprFn::new("mul", 2, |a| a[0] * a[1])
}

pub fn div() -> ExprFn {
    ExprFn::new("div", 2, |a| a[0] / a[1])
}

/// Remainder of the truncated operands; NaN when the divisor truncates to zero.
pub fn modulo() -> ExprFn {
    ExprFn::new("mod", 2, |a| {
        let (n, d) = (a[0] as i64, a[1] as i64);
        if d == 0 {
            f32::NAN
        } else {
            (n % d) as f32
        }
    })
}

pub fn neg() -> ExprFn {
    ExprFn::new("neg", 1, |a| -a[0])
}

/// Linear interpolation over time.
///
/// Operands are `time, start_time, start_value, end_time, end_value`. Holds the
/// start value before the interval and the end value after it.
pub fn linear() -> ExprFn {
    ExprFn::new("linear", 5, |a| {
        let [time, t0, v0, t1, v1] = [a[0], a[1], a[2], a[3], a[4]];
        if time < t0 {
            v0
        } else if time > t1 {
            v1
        } else if equal(t1, t0) {
            v0
        } else {
            v0 + (v1 - v0) * (time - t0) / (t1 - t0)
        }
    })
}

pub fn sin() -> ExprFn {
    ExprFn::new("sin", 1, |a| a[0].sin())
}

pub fn cos() -> ExprFn {
    ExprFn::new("cos", 1, |a| a[0].cos())
}

pub fn sqrt() -> ExprFn {
    ExprFn::new("sqrt", 1, |a| a[0].sqrt())
}

pub fn min() -> ExprFn {
    ExprFn::new("min", 2, |a| a[0].min(a[1]))
}

pub fn max() -> ExprFn {
    ExprFn::new("max", 2, |a| a[0].max(a[1]))
}

/// Every builtin, for seeding a symbol table.
pub fn all() -> Vec<ExprFn> {
    vec![
        add(),
        sub(),
        mul(),
        div(),
        modulo(),
        neg(),
        linear(),
        sin(),
        cos(),
        sqrt(),
        min(),
        max(),
    ]
}
