//! Cubic-bezier timing curves.
//!
//! - [`CubicBezier::sample`] evaluates y for a time fraction x, solving x(u) = t
//!   with Newton-Raphson.
//! - [`reparameterize`] builds the curve that continues an existing curve from
//!   a time fraction to its end on a fresh `[0, 1]` clock, used when a paused
//!   step resumes with its remaining duration.
//! - [`CurveCache`] memoizes continuations across repeated pause/resume cycles.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::TransitError;

/// Newton-Raphson iteration cap when inverting x(u).
pub const NEWTON_ITERATIONS: usize = 14;
/// Absolute residual on x(u) - t that stops the iteration.
pub const NEWTON_EPSILON: f64 = 1e-3;

/// Fixed sample fractions of the continuation fit.
const FIT_U: f64 = 0.33;
const FIT_V: f64 = 0.67;

/// CSS `cubic-bezier(x1, y1, x2, y2)` with implicit end points (0,0) and (1,1).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Polynomial coefficients of one axis: value(u) = u * (c + u * (b + u * a)).
#[derive(Clone, Copy, Debug)]
struct Axis {
    a: f64,
    b: f64,
    c: f64,
}

impl Axis {
    #[inline]
    fn new(p1: f64, p2: f64) -> Self {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        let a = 1.0 - c - b;
        Self { a, b, c }
    }

    #[inline]
    fn value(&self, u: f64) -> f64 {
        u * (self.c + u * (self.b + u * self.a))
    }

    #[inline]
    fn derivative(&self, u: f64) -> f64 {
        self.c + u * (2.0 * self.b + 3.0 * self.a * u)
    }
}

impl CubicBezier {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn from_points(p: [f64; 4]) -> Self {
        Self::new(p[0], p[1], p[2], p[3])
    }

    #[inline]
    pub fn points(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Curve parameter u with x(u) ≈ t.
    fn solve_x(&self, t: f64) -> f64 {
        let x = Axis::new(self.x1, self.x2);
        let mut u = t;
        for _ in 0..NEWTON_ITERATIONS {
            let residual = x.value(u) - t;
            if residual.abs() < NEWTON_EPSILON {
                break;
            }
            let slope = x.derivative(u);
            if slope == 0.0 || !slope.is_finite() {
                break;
            }
            u -= residual / slope;
        }
        u
    }

    /// Eased progress y for the time fraction `t`.
    pub fn sample(&self, t: f64) -> f64 {
        let u = self.solve_x(t);
        Axis::new(self.y1, self.y2).value(u)
    }
}

/// Curve that continues `curve` from time fraction `ratio` to 1, rescaled onto a
/// fresh `[0, 1]` clock.
///
/// A ratio of exactly 0 or 1 returns the curve unchanged. The tail is sampled at
/// two interior fractions and the two free control points are solved from the
/// Bernstein basis weights at those fractions.
pub fn reparameterize(curve: &CubicBezier, ratio: f64) -> Result<CubicBezier, TransitError> {
    if ratio == 0.0 || ratio == 1.0 {
        return Ok(*curve);
    }
    let degenerate = |reason: &str| TransitError::DegenerateBezier {
        points: curve.points(),
        ratio,
        reason: reason.to_string(),
    };
    if !ratio.is_finite() {
        return Err(degenerate("non-finite time ratio"));
    }

    let x_interval = 1.0 - ratio;
    let start_y = curve.sample(ratio);
    let sign = if start_y > 1.0 { -1.0 } else { 1.0 };
    let y_interval = (1.0 - start_y) * sign;
    if y_interval == 0.0 || !y_interval.is_finite() {
        return Err(degenerate("no remaining progress"));
    }

    let (u, v) = (FIT_U, FIT_V);
    let uu = u * x_interval + ratio;
    let vv = v * x_interval + ratio;

    // Points on the tail in the new coordinate frame; end points are (0,0) and (1,1).
    let (p0x, p0y) = (0.0, 0.0);
    let (p1x, p1y) = (u, (curve.sample(uu) - start_y) * sign / y_interval);
    let (p2x, p2y) = (v, (curve.sample(vv) - start_y) * sign / y_interval);
    let (p3x, p3y) = (1.0, 1.0);

    let comp_u = 1.0 - u;
    let comp_v = 1.0 - v;
    let a = 3.0 * comp_u * comp_u * u;
    let b = 3.0 * comp_u * u * u;
    let c = 3.0 * comp_v * comp_v * v;
    let d = 3.0 * comp_v * v * v;

    let det = a * d - b * c;
    if det == 0.0 {
        return Err(degenerate("singular system (det == 0)"));
    }

    let comp_u3 = comp_u * comp_u * comp_u;
    let comp_v3 = comp_v * comp_v * comp_v;
    let u3 = u * u * u;
    let v3 = v * v * v;

    let q1x = p1x - (comp_u3 * p0x + u3 * p3x);
    let q1y = p1y - (comp_u3 * p0y + u3 * p3y);
    let q2x = p2x - (comp_v3 * p0x + v3 * p3x);
    let q2y = p2y - (comp_v3 * p0y + v3 * p3y);

    let out = CubicBezier::new(
        (d * q1x - b * q2x) / det,
        (d * q1y - b * q2y) / det,
        (-c * q1x + a * q2x) / det,
        (-c * q1y + a * q2y) / det,
    );
    if out.points().iter().any(|p| !p.is_finite()) {
        return Err(degenerate("non-finite control point"));
    }
    Ok(out)
}

/// Memo of continuation curves keyed by control points and a 3-decimal ratio.
#[derive(Debug, Default)]
pub struct CurveCache {
    entries: HashMap<String, CubicBezier>,
}

impl CurveCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(curve: &CubicBezier, ratio: f64) -> String {
        let p = curve.points();
        format!("{}_{}_{}_{}_{:.3}", p[0], p[1], p[2], p[3], ratio)
    }

    /// Continuation of `curve` from `ratio`. A degenerate system falls back to the
    /// original curve; the error is returned alongside so callers can report it.
    pub fn continuation(
        &mut self,
        curve: &CubicBezier,
        ratio: f64,
    ) -> (CubicBezier, Option<TransitError>) {
        if ratio == 0.0 || ratio == 1.0 {
            return (*curve, None);
        }
        let key = Self::key(curve, ratio);
        if let Some(hit) = self.entries.get(&key) {
            return (*hit, None);
        }
        match reparameterize(curve, ratio) {
            Ok(next) => {
                self.entries.insert(key, next);
                (next, None)
            }
            Err(err) => {
                log::warn!("{err}; keeping the original curve");
                (*curve, Some(err))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
