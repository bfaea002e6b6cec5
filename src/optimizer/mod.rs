//! # Optimizer Module
//!
//! Gradient-descent rules applied by the dense value network. Optimizers
//! keep per-layer state, so every call names the layer it updates.

use ndarray::{Array1, Array2, Dimension, Zip};

pub trait Optimizer {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);

    /// Called once after every layer has been updated for a batch.
    fn finish_step(&mut self) {}
}

#[derive(Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
        }
    }

    fn finish_step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.finish_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.finish_step(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, _layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// First and second moment estimates for one parameter tensor
#[derive(Clone, Debug)]
struct Moments<D: Dimension> {
    m: ndarray::Array<f32, D>,
    v: ndarray::Array<f32, D>,
}

#[derive(Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    weight_moments: Vec<Option<Moments<ndarray::Ix2>>>,
    bias_moments: Vec<Option<Moments<ndarray::Ix1>>>,
    /// Time step, starting at 1
    pub t: usize,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            weight_moments: Vec::new(),
            bias_moments: Vec::new(),
            t: 1,
        }
    }

    fn schedule(&self) -> BiasCorrection {
        BiasCorrection {
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            t: self.t,
        }
    }
}

#[derive(Clone, Copy)]
struct BiasCorrection {
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: usize,
}

impl BiasCorrection {
    fn apply<D: Dimension>(
        self,
        moments: &mut Moments<D>,
        params: &mut ndarray::Array<f32, D>,
        gradients: &ndarray::Array<f32, D>,
        learning_rate: f32,
    ) {
        let BiasCorrection { beta1, beta2, epsilon, t } = self;
        let correction1 = 1.0 - beta1.powi(t as i32);
        let correction2 = 1.0 - beta2.powi(t as i32);
        Zip::from(params)
            .and(&mut moments.m)
            .and(&mut moments.v)
            .and(gradients)
            .for_each(|p, m, v, &g| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / correction1;
                let v_hat = *v / correction2;
                *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            });
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8)
    }
}

fn slot<D: Dimension>(slots: &mut Vec<Option<Moments<D>>>, layer: usize, dim: D) -> &mut Moments<D> {
    if slots.len() <= layer {
        slots.resize_with(layer + 1, || None);
    }
    slots[layer].get_or_insert_with(|| Moments {
        m: ndarray::Array::zeros(dim.clone()),
        v: ndarray::Array::zeros(dim),
    })
}

impl Optimizer for Adam {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let schedule = self.schedule();
        let moments = slot(&mut self.weight_moments, layer, weights.raw_dim());
        schedule.apply(moments, weights, gradients, learning_rate);
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let schedule = self.schedule();
        let moments = slot(&mut self.bias_moments, layer, biases.raw_dim());
        schedule.apply(moments, biases, gradients, learning_rate);
    }

    fn finish_step(&mut self) {
        self.t += 1;
    }
}
