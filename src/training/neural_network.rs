//! Neural Network (Multi-Layer Perceptron) regressor
//!
//! A feedforward network with one linear output unit, trained on the squared
//! loss with an L2 penalty. Three solvers are available: full-batch L-BFGS,
//! mini-batch SGD with Nesterov momentum and a learning-rate schedule, and
//! Adam.

use ndarray::{Array1, Array2, Axis, Zip};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;
use tracing::debug;

use crate::error::{MlTuningError, Result};
use crate::training::models::{check_xy, Regressor};

/// Hidden-layer activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// f(x) = x
    Identity,
    /// Sigmoid
    Logistic,
    /// Hyperbolic tangent
    Tanh,
    /// Rectified Linear Unit
    Relu,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Relu
    }
}

/// Weight optimization algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Solver {
    Lbfgs,
    Sgd,
    Adam,
}

/// Learning rate schedule (used by the SGD solver only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningRateSchedule {
    Constant,
    /// lr = lr_init / (t + 1)^power_t, t = samples seen
    InvScaling,
    /// Divide by 5 whenever training loss stops improving
    Adaptive,
}

fn unknown_choice(name: &str, value: &str, choices: &str) -> MlTuningError {
    MlTuningError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: format!("expected one of {}", choices),
    }
}

impl FromStr for Activation {
    type Err = MlTuningError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "identity" => Ok(Activation::Identity),
            "logistic" => Ok(Activation::Logistic),
            "tanh" => Ok(Activation::Tanh),
            "relu" => Ok(Activation::Relu),
            other => Err(unknown_choice("activation", other, "identity, logistic, tanh, relu")),
        }
    }
}

impl FromStr for Solver {
    type Err = MlTuningError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lbfgs" => Ok(Solver::Lbfgs),
            "sgd" => Ok(Solver::Sgd),
            "adam" => Ok(Solver::Adam),
            other => Err(unknown_choice("solver", other, "lbfgs, sgd, adam")),
        }
    }
}

impl FromStr for LearningRateSchedule {
    type Err = MlTuningError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "constant" => Ok(LearningRateSchedule::Constant),
            "invscaling" => Ok(LearningRateSchedule::InvScaling),
            "adaptive" => Ok(LearningRateSchedule::Adaptive),
            other => Err(unknown_choice(
                "learning_rate",
                other,
                "constant, invscaling, adaptive",
            )),
        }
    }
}

/// Neural Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MLPConfig {
    /// Hidden layer sizes
    pub hidden_layers: Vec<usize>,
    /// Activation function for hidden layers
    pub activation: Activation,
    pub solver: Solver,
    pub learning_rate: LearningRateSchedule,
    /// Initial step size (sgd, adam)
    pub learning_rate_init: f64,
    /// Exponent of the inverse scaling schedule
    pub power_t: f64,
    /// Epochs (stochastic solvers) or iterations (lbfgs)
    pub max_iter: usize,
    /// Mini-batch size; `None` means min(200, n_samples)
    pub batch_size: Option<usize>,
    /// L2 regularization
    pub alpha: f64,
    pub momentum: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    pub epsilon: f64,
    /// Improvement tolerance (stochastic) / gradient tolerance (lbfgs)
    pub tol: f64,
    /// Epochs without `tol` improvement before stopping
    pub n_iter_no_change: usize,
    /// Maximum loss evaluations for lbfgs
    pub max_fun: usize,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for MLPConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![100],
            activation: Activation::Relu,
            solver: Solver::Adam,
            learning_rate: LearningRateSchedule::Constant,
            learning_rate_init: 0.001,
            power_t: 0.5,
            max_iter: 200,
            batch_size: None,
            alpha: 0.0001,
            momentum: 0.9,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-8,
            tol: 1e-4,
            n_iter_no_change: 10,
            max_fun: 15000,
            random_state: Some(0),
        }
    }
}

/// Per-layer gradients, same shapes as weights and biases
type Gradients = (Vec<Array2<f64>>, Vec<Array1<f64>>);

/// Multi-Layer Perceptron Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MLPRegressor {
    config: MLPConfig,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    n_features: usize,
    n_iter: usize,
    is_fitted: bool,
}

impl MLPRegressor {
    pub fn new(config: MLPConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            biases: Vec::new(),
            n_features: 0,
            n_iter: 0,
            is_fitted: false,
        }
    }

    fn make_rng(&self) -> Xoshiro256PlusPlus {
        match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        }
    }

    fn initialize_weights(&mut self, rng: &mut Xoshiro256PlusPlus) {
        self.weights.clear();
        self.biases.clear();

        let mut layer_sizes = vec![self.n_features];
        layer_sizes.extend(&self.config.hidden_layers);
        layer_sizes.push(1);

        let factor = match self.config.activation {
            Activation::Logistic => 2.0,
            _ => 6.0,
        };

        for pair in layer_sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);
            // Glorot uniform
            let bound = (factor / (n_in + n_out) as f64).sqrt();
            self.weights
                .push(Array2::from_shape_fn((n_in, n_out), |_| rng.gen_range(-bound..bound)));
            self.biases
                .push(Array1::from_shape_fn(n_out, |_| rng.gen_range(-bound..bound)));
        }
    }

    fn forward(&self, x: &Array2<f64>) -> Vec<Array2<f64>> {
        let mut activations = vec![x.clone()];
        let last = self.weights.len() - 1;

        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = activations[i].dot(w) + b;
            let a = if i < last {
                activate(z, self.config.activation)
            } else {
                z // Linear output for regression
            };
            activations.push(a);
        }

        activations
    }

    /// Penalized squared loss and its gradients on one batch
    fn loss_and_gradients(&self, x: &Array2<f64>, y: &Array1<f64>) -> (f64, Gradients) {
        let n = y.len() as f64;
        let activations = self.forward(x);
        let output = &activations[activations.len() - 1];

        let y_2d = y.view().insert_axis(Axis(1));
        let residual = output - &y_2d;
        let sq_norm: f64 = self.weights.iter().map(|w| w.iter().map(|v| v * v).sum::<f64>()).sum();
        let loss = 0.5 * residual.iter().map(|r| r * r).sum::<f64>() / n
            + 0.5 * self.config.alpha * sq_norm / n;

        let mut grad_w = Vec::with_capacity(self.weights.len());
        let mut grad_b = Vec::with_capacity(self.weights.len());
        let mut delta = residual / n;

        for i in (0..self.weights.len()).rev() {
            let gw = activations[i].t().dot(&delta) + &self.weights[i] * (self.config.alpha / n);
            let gb = delta.sum_axis(Axis(0));
            grad_w.push(gw);
            grad_b.push(gb);

            if i > 0 {
                delta = delta.dot(&self.weights[i].t())
                    * derivative(&activations[i], self.config.activation);
            }
        }

        grad_w.reverse();
        grad_b.reverse();
        (loss, (grad_w, grad_b))
    }

    fn fit_stochastic(&mut self, x: &Array2<f64>, y: &Array1<f64>, rng: &mut Xoshiro256PlusPlus) {
        let n_samples = x.nrows();
        let batch_size = self
            .config
            .batch_size
            .unwrap_or(200)
            .clamp(1, n_samples);
        let solver = self.config.solver;
        let schedule = self.config.learning_rate;

        let mut lr = self.config.learning_rate_init;
        let mut velocities_w: Vec<Array2<f64>> =
            self.weights.iter().map(|w| Array2::zeros(w.raw_dim())).collect();
        let mut velocities_b: Vec<Array1<f64>> =
            self.biases.iter().map(|b| Array1::zeros(b.len())).collect();
        let mut second_w = velocities_w.clone();
        let mut second_b = velocities_b.clone();

        let mut adam_t = 0i32;
        let mut samples_seen = 0usize;
        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0usize;
        let mut indices: Vec<usize> = (0..n_samples).collect();

        self.n_iter = 0;
        for _epoch in 0..self.config.max_iter {
            indices.shuffle(rng);
            let mut accumulated = 0.0;

            for batch in indices.chunks(batch_size) {
                let x_batch = x.select(Axis(0), batch);
                let y_batch = y.select(Axis(0), batch);
                let (loss, (grad_w, grad_b)) = self.loss_and_gradients(&x_batch, &y_batch);
                accumulated += loss * batch.len() as f64;

                match solver {
                    Solver::Adam => {
                        adam_t += 1;
                        let (b1, b2) = (self.config.beta_1, self.config.beta_2);
                        let step = lr * (1.0 - b2.powi(adam_t)).sqrt() / (1.0 - b1.powi(adam_t));
                        let eps = self.config.epsilon;
                        for i in 0..self.weights.len() {
                            adam_update(&mut self.weights[i], &mut velocities_w[i], &mut second_w[i], &grad_w[i], b1, b2, step, eps);
                            adam_update(&mut self.biases[i], &mut velocities_b[i], &mut second_b[i], &grad_b[i], b1, b2, step, eps);
                        }
                    }
                    _ => {
                        let momentum = self.config.momentum;
                        for i in 0..self.weights.len() {
                            nesterov_update(&mut self.weights[i], &mut velocities_w[i], &grad_w[i], momentum, lr);
                            nesterov_update(&mut self.biases[i], &mut velocities_b[i], &grad_b[i], momentum, lr);
                        }
                    }
                }
            }

            self.n_iter += 1;
            samples_seen += n_samples;
            let epoch_loss = accumulated / n_samples as f64;
            if !epoch_loss.is_finite() {
                debug!(epoch = self.n_iter, "training loss diverged");
                break;
            }

            if epoch_loss > best_loss - self.config.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            best_loss = best_loss.min(epoch_loss);

            if solver == Solver::Sgd && schedule == LearningRateSchedule::InvScaling {
                lr = self.config.learning_rate_init
                    / ((samples_seen + 1) as f64).powf(self.config.power_t);
            }

            if no_improvement > self.config.n_iter_no_change {
                if solver == Solver::Sgd && schedule == LearningRateSchedule::Adaptive && lr > 1e-6 {
                    lr /= 5.0;
                    no_improvement = 0;
                } else {
                    break;
                }
            }
        }
    }

    fn pack(&self) -> Array1<f64> {
        self.weights
            .iter()
            .flat_map(|w| w.iter().copied())
            .chain(self.biases.iter().flat_map(|b| b.iter().copied()))
            .collect()
    }

    fn unpack(&mut self, theta: &Array1<f64>) {
        let mut offset = 0;
        for w in self.weights.iter_mut() {
            for v in w.iter_mut() {
                *v = theta[offset];
                offset += 1;
            }
        }
        for b in self.biases.iter_mut() {
            for v in b.iter_mut() {
                *v = theta[offset];
                offset += 1;
            }
        }
    }

    fn packed_objective(&mut self, theta: &Array1<f64>, x: &Array2<f64>, y: &Array1<f64>) -> (f64, Array1<f64>) {
        self.unpack(theta);
        let (loss, (grad_w, grad_b)) = self.loss_and_gradients(x, y);
        let grad: Array1<f64> = grad_w
            .iter()
            .flat_map(|g| g.iter().copied())
            .chain(grad_b.iter().flat_map(|g| g.iter().copied()))
            .collect();
        (loss, grad)
    }

    /// Full-batch limited-memory BFGS with a backtracking Armijo line search
    fn fit_lbfgs(&mut self, x: &Array2<f64>, y: &Array1<f64>) {
        const HISTORY: usize = 10;
        const ARMIJO: f64 = 1e-4;

        let mut theta = self.pack();
        let (mut loss, mut grad) = self.packed_objective(&theta, x, y);
        let mut evaluations = 1usize;
        let mut history: VecDeque<(Array1<f64>, Array1<f64>, f64)> = VecDeque::with_capacity(HISTORY);

        self.n_iter = 0;
        while self.n_iter < self.config.max_iter && evaluations < self.config.max_fun {
            let grad_max = grad.iter().fold(0.0f64, |m, g| m.max(g.abs()));
            if !loss.is_finite() || grad_max <= self.config.tol {
                break;
            }

            // Two-loop recursion
            let mut direction = grad.clone();
            let mut alphas = Vec::with_capacity(history.len());
            for (s, yv, rho) in history.iter().rev() {
                let a = rho * s.dot(&direction);
                direction.scaled_add(-a, yv);
                alphas.push(a);
            }
            if let Some((s, yv, _)) = history.back() {
                direction *= s.dot(yv) / yv.dot(yv);
            }
            for ((s, yv, rho), a) in history.iter().zip(alphas.iter().rev()) {
                let b = rho * yv.dot(&direction);
                direction.scaled_add(a - b, s);
            }
            direction.mapv_inplace(|v| -v);

            let mut slope = grad.dot(&direction);
            if slope >= 0.0 {
                history.clear();
                direction = grad.mapv(|g| -g);
                slope = -grad.dot(&grad);
            }

            let mut step = if history.is_empty() {
                (1.0 / grad.dot(&grad).sqrt()).min(1.0)
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..40 {
                let candidate = &theta + &(&direction * step);
                let (c_loss, c_grad) = self.packed_objective(&candidate, x, y);
                evaluations += 1;
                if c_loss.is_finite() && c_loss <= loss + ARMIJO * step * slope {
                    accepted = Some((candidate, c_loss, c_grad));
                    break;
                }
                step *= 0.5;
            }

            let Some((next_theta, next_loss, next_grad)) = accepted else {
                break;
            };

            let s = &next_theta - &theta;
            let yv = &next_grad - &grad;
            let sy = s.dot(&yv);
            if sy > 1e-10 {
                if history.len() == HISTORY {
                    history.pop_front();
                }
                history.push_back((s, yv, 1.0 / sy));
            }

            theta = next_theta;
            loss = next_loss;
            grad = next_grad;
            self.n_iter += 1;
        }

        self.unpack(&theta);
    }
}

impl Regressor for MLPRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;
        if !(self.config.alpha >= 0.0) {
            return Err(MlTuningError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.config.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }

        self.n_features = x.ncols();
        let mut rng = self.make_rng();
        self.initialize_weights(&mut rng);

        match self.config.solver {
            Solver::Lbfgs => self.fit_lbfgs(x, y),
            Solver::Sgd | Solver::Adam => self.fit_stochastic(x, y, &mut rng),
        }

        let finite = self.weights.iter().all(|w| w.iter().all(|v| v.is_finite()))
            && self.biases.iter().all(|b| b.iter().all(|v| v.is_finite()));
        if !finite {
            return Err(MlTuningError::TrainingError(format!(
                "solver {:?} produced non-finite parameter weights",
                self.config.solver
            )));
        }

        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(MlTuningError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(MlTuningError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        let activations = self.forward(x);
        Ok(activations[activations.len() - 1].column(0).to_owned())
    }
}

fn activate(z: Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::Identity => z,
        Activation::Logistic => z.mapv_into(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Tanh => z.mapv_into(f64::tanh),
        Activation::Relu => z.mapv_into(|v| v.max(0.0)),
    }
}

/// Derivative expressed through the activation output `a`
fn derivative(a: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::Identity => Array2::ones(a.raw_dim()),
        Activation::Logistic => a.mapv(|v| v * (1.0 - v)),
        Activation::Tanh => a.mapv(|v| 1.0 - v * v),
        Activation::Relu => a.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
    }
}

fn nesterov_update<D: ndarray::Dimension>(
    param: &mut ndarray::Array<f64, D>,
    velocity: &mut ndarray::Array<f64, D>,
    grad: &ndarray::Array<f64, D>,
    momentum: f64,
    lr: f64,
) {
    Zip::from(param)
        .and(velocity)
        .and(grad)
        .for_each(|p, v, &g| {
            *v = momentum * *v - lr * g;
            *p += momentum * *v - lr * g;
        });
}

#[allow(clippy::too_many_arguments)]
fn adam_update<D: ndarray::Dimension>(
    param: &mut ndarray::Array<f64, D>,
    first: &mut ndarray::Array<f64, D>,
    second: &mut ndarray::Array<f64, D>,
    grad: &ndarray::Array<f64, D>,
    beta_1: f64,
    beta_2: f64,
    step: f64,
    epsilon: f64,
) {
    Zip::from(param)
        .and(first)
        .and(second)
        .and(grad)
        .for_each(|p, m, v, &g| {
            *m = beta_1 * *m + (1.0 - beta_1) * g;
            *v = beta_2 * *v + (1.0 - beta_2) * g * g;
            *p -= step * *m / (v.sqrt() + epsilon);
        });
}
