//! Gauss-Legendre rules on `[0, 1]`.
//!
//! Rules are computed on first use by Newton iteration on the Legendre
//! polynomial and shared process-wide.

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::f64::consts::PI;
use std::sync::Arc;

/// Points and weights of an `n`-point rule on `[0, 1]`; weights sum to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussRule {
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
}

impl GaussRule {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(point, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied().zip(self.weights.iter().copied())
    }
}

static RULES: Lazy<RwLock<HashMap<usize, Arc<GaussRule>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Rule exact for polynomials of degree `2n - 1`.
pub fn gauss_legendre(n: usize) -> Arc<GaussRule> {
    let n = n.max(1);
    if let Some(rule) = RULES.read().get(&n) {
        return Arc::clone(rule);
    }
    let rule = Arc::new(compute_rule(n));
    Arc::clone(RULES.write().entry(n).or_insert(rule))
}

/// Smallest rule integrating a polynomial of the given degree exactly.
pub fn rule_for_degree(degree: usize) -> Arc<GaussRule> {
    gauss_legendre(degree / 2 + 1)
}

fn compute_rule(n: usize) -> GaussRule {
    let mut points = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let nf = n as f64;

    // Roots are symmetric; solve for the upper half on [-1, 1].
    for i in 0..n.div_ceil(2) {
        let mut x = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..100 {
            let (p, d) = legendre(n, x);
            dp = d;
            let dx = p / d;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, d) = legendre(n, x);
        if d != 0.0 {
            dp = d;
        }
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        points[i] = 0.5 * (1.0 - x);
        points[n - 1 - i] = 0.5 * (1.0 + x);
        weights[i] = 0.5 * w;
        weights[n - 1 - i] = 0.5 * w;
    }
    GaussRule { points, weights }
}

/// `P_n(x)` and `P_n'(x)` by the three-term recurrence.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let (mut p0, mut p1) = (1.0, x);
    for k in 2..=n {
        let kf = k as f64;
        let p2 = ((2.0 * kf - 1.0) * x * p1 - (kf - 1.0) * p0) / kf;
        p0 = p1;
        p1 = p2;
    }
    let nf = n as f64;
    let d = nf * (x * p1 - p0) / (x * x - 1.0);
    (p1, d)
}
