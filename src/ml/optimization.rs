//! Limited-memory BFGS minimizer.
//!
//! A small, deterministic L-BFGS implementation with a backtracking Armijo
//! line search. It runs sequentially: given the same objective and starting
//! point it always performs the same floating-point operations, so fitted
//! models are reproducible bit for bit.

use std::collections::VecDeque;

use log::trace;
use serde::{Deserialize, Serialize};

/// Armijo sufficient-decrease constant.
const ARMIJO_C1: f64 = 1e-4;

/// Curvature pairs with `s·y` below this are skipped.
const CURVATURE_EPSILON: f64 = 1e-10;

/// A differentiable function to minimize.
pub trait Objective {
    /// Number of parameters.
    fn dimension(&self) -> usize;

    /// Value at `x`; the gradient is written into `gradient`.
    fn evaluate(&self, x: &[f64], gradient: &mut [f64]) -> f64;
}

/// Solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LbfgsParams {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Stop once the largest absolute gradient component is at most this.
    pub gradient_tolerance: f64,
    /// Stop once the relative decrease of the objective is at most this.
    pub function_tolerance: f64,
    /// Number of correction pairs kept.
    pub history: usize,
    /// Maximum step halvings per line search.
    pub max_line_search: usize,
}

impl Default for LbfgsParams {
    fn default() -> Self {
        Self {
            max_iter: 100,
            gradient_tolerance: 1e-4,
            function_tolerance: 10.0 * f64::EPSILON,
            history: 10,
            max_line_search: 40,
        }
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    GradientTolerance,
    FunctionTolerance,
    MaxIterations,
    LineSearchFailed,
}

impl Termination {
    pub fn converged(self) -> bool {
        matches!(
            self,
            Termination::GradientTolerance | Termination::FunctionTolerance
        )
    }
}

/// Result of a minimization.
#[derive(Debug, Clone)]
pub struct LbfgsResult {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub termination: Termination,
    /// Objective value after each iteration, starting with the initial point.
    pub values: Vec<f64>,
}

impl LbfgsResult {
    pub fn converged(&self) -> bool {
        self.termination.converged()
    }
}

struct Correction {
    s: Vec<f64>,
    y: Vec<f64>,
    rho: f64,
}

/// Minimize `objective` starting from `x0`.
pub fn minimize<O: Objective + ?Sized>(
    objective: &O,
    x0: Vec<f64>,
    params: &LbfgsParams,
) -> LbfgsResult {
    let n = objective.dimension();
    debug_assert_eq!(x0.len(), n);

    let mut x = x0;
    let mut gradient = vec![0.0; n];
    let mut value = objective.evaluate(&x, &mut gradient);
    let mut values = vec![value];
    let mut history: VecDeque<Correction> = VecDeque::with_capacity(params.history);

    if inf_norm(&gradient) <= params.gradient_tolerance {
        return LbfgsResult {
            x,
            value,
            iterations: 0,
            termination: Termination::GradientTolerance,
            values,
        };
    }

    let mut x_new = vec![0.0; n];
    let mut gradient_new = vec![0.0; n];
    let mut termination = Termination::MaxIterations;
    let mut iterations = 0;

    while iterations < params.max_iter {
        iterations += 1;

        let mut direction = search_direction(&gradient, &history);
        let mut slope = dot(&direction, &gradient);
        if slope >= 0.0 {
            // Not a descent direction; restart from steepest descent.
            history.clear();
            direction = gradient.iter().map(|g| -g).collect();
            slope = -dot(&gradient, &gradient);
        }

        let mut step = if history.is_empty() {
            (1.0 / l2_norm(&gradient)).min(1.0)
        } else {
            1.0
        };

        let mut value_new = f64::INFINITY;
        let mut accepted = false;
        for _ in 0..params.max_line_search {
            for i in 0..n {
                x_new[i] = x[i] + step * direction[i];
            }
            value_new = objective.evaluate(&x_new, &mut gradient_new);
            if value_new.is_finite() && value_new <= value + ARMIJO_C1 * step * slope {
                accepted = true;
                break;
            }
            step *= 0.5;
        }

        if !accepted {
            termination = Termination::LineSearchFailed;
            break;
        }

        let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = gradient_new
            .iter()
            .zip(&gradient)
            .map(|(a, b)| a - b)
            .collect();
        let sy = dot(&s, &y);
        if sy > CURVATURE_EPSILON {
            if history.len() == params.history {
                history.pop_front();
            }
            if params.history > 0 {
                history.push_back(Correction { s, y, rho: 1.0 / sy });
            }
        }

        let relative_decrease = (value - value_new) / value.abs().max(value_new.abs()).max(1.0);

        std::mem::swap(&mut x, &mut x_new);
        std::mem::swap(&mut gradient, &mut gradient_new);
        value = value_new;
        values.push(value);

        let gradient_norm = inf_norm(&gradient);
        trace!("lbfgs iteration {iterations}: value={value:.6e} |g|={gradient_norm:.3e} step={step:.3e}");

        if gradient_norm <= params.gradient_tolerance {
            termination = Termination::GradientTolerance;
            break;
        }
        if relative_decrease <= params.function_tolerance {
            termination = Termination::FunctionTolerance;
            break;
        }
    }

    LbfgsResult {
        x,
        value,
        iterations,
        termination,
        values,
    }
}

/// Two-loop recursion: approximate `-H⁻¹ g` from the stored corrections.
fn search_direction(gradient: &[f64], history: &VecDeque<Correction>) -> Vec<f64> {
    let mut q = gradient.to_vec();
    let mut alphas = Vec::with_capacity(history.len());

    for correction in history.iter().rev() {
        let alpha = correction.rho * dot(&correction.s, &q);
        axpy(-alpha, &correction.y, &mut q);
        alphas.push(alpha);
    }

    let gamma = match history.back() {
        Some(last) => {
            let yy = dot(&last.y, &last.y);
            if yy > 0.0 { 1.0 / (last.rho * yy) } else { 1.0 }
        }
        None => 1.0,
    };
    for value in &mut q {
        *value *= gamma;
    }

    for (correction, alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = correction.rho * dot(&correction.y, &q);
        axpy(alpha - beta, &correction.s, &mut q);
    }

    for value in &mut q {
        *value = -*value;
    }
    q
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

fn l2_norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}
